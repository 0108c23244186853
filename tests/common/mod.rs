//! Common test utilities for callpath integration tests
//!
//! Hand-written fixtures plus a seeded random call-log generator.

#![allow(dead_code)]

pub mod fixtures;
pub mod generator;

pub use fixtures::{csv_document, menu_file, source_file, HEADER};
pub use generator::LogGenerator;
