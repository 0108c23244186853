//! Hand-written CSV fixtures

use callpath::SourceFile;

pub const HEADER: &str = "call_id,call_date,rule_id,rule_parent_id,rule_text,popUpURL";

/// One CSV document from data rows (header added)
pub fn csv_document(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

pub fn source_file(name: &str, rows: &[&str]) -> SourceFile {
    SourceFile::new(name, csv_document(rows))
}

/// A small bilingual menu with three calls
///
/// ```text
/// 1 Main menu
/// ├── 2 חשבונות (billing)
/// │   └── 4 Pay online (url)
/// └── 3 Support
/// 9 Legacy (never visited)
/// ```
pub fn menu_file(name: &str) -> SourceFile {
    source_file(
        name,
        &[
            "100,2024-01-07,1,0,Main menu,",
            "100,2024-01-07,2,1,חשבונות,",
            "100,2024-01-07,4,2,Pay online,https://pay.example",
            "101,2024-01-08 09:30,1,0,Main menu,",
            "101,2024-01-08 09:30,3,1,Support,",
            "101,2024-01-08 09:30,3,1,Support,",
            "102,not a date,1,0,Main menu,",
            "102,not a date,2,1,חשבונות,",
            ",,9,0,Legacy,",
        ],
    )
}
