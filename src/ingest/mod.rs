//! Ingestion: CSV documents to merged node and call structures
//!
//! Two stages, leaves first:
//!
//! - **RecordParser**: one document to a [`ParsedFile`] (nodes, local
//!   adjacency, per-call events). No state outside the returned value.
//! - **BatchMerger**: ordered [`FileParse`] outcomes to one [`MergedBatch`],
//!   with first-seen-wins node resolution and file-qualified call ids.

mod merger;
mod parser;
mod types;

pub use merger::{BatchMerger, FileDiagnostic, FileErrorPolicy, FileParse, MergeError, MergedBatch};
pub use parser::{iso_weekday, parse_date, parse_document, ParseError, RecordParser};
pub use types::{
    Adjacency, CallEvent, CallMeta, CallRecord, NodeData, NodeRegistry, ParentConflict,
    ParsedFile, RuleId, ROOT_PARENT,
};
