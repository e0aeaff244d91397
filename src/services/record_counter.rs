//! Record counting for feed files.
//!
//! The count taken here becomes the job's expected record count, the target
//! the remote completed count is polled towards.

use std::path::Path;

use crate::domain::models::IntegrationFormat;

/// XML elements that carry one record each.
const XML_RECORD_ELEMENTS: [&str; 3] = ["person", "group", "membership"];

/// Read a feed file and count its records according to `format`.
///
/// Feeds need not be UTF-8; invalid bytes are replaced before counting.
pub async fn count_records(format: IntegrationFormat, path: &Path) -> std::io::Result<u64> {
    let bytes = tokio::fs::read(path).await?;
    Ok(count_in(format, &String::from_utf8_lossy(&bytes)))
}

/// Count records in already-loaded feed contents.
pub fn count_in(format: IntegrationFormat, contents: &str) -> u64 {
    match format {
        IntegrationFormat::FlatFile => count_delimited(contents),
        IntegrationFormat::Xml => XML_RECORD_ELEMENTS
            .iter()
            .map(|element| count_xml_elements(contents, element))
            .sum(),
    }
}

/// Non-blank lines minus the header row.
fn count_delimited(contents: &str) -> u64 {
    let lines = contents.lines().filter(|line| !line.trim().is_empty()).count() as u64;
    lines.saturating_sub(1)
}

/// Opening tags `<element>` / `<element ...>`; `<elementid>` and closing tags
/// do not match.
fn count_xml_elements(contents: &str, element: &str) -> u64 {
    let open = format!("<{element}");
    let mut count = 0;
    let mut rest = contents;

    while let Some(idx) = rest.find(&open) {
        rest = &rest[idx + open.len()..];
        match rest.chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => count += 1,
            _ => {}
        }
    }

    count
}
