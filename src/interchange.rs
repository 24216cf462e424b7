//! Plaintext backup/restore codec.
//!
//! The format is a minimal CSV variant, deliberately not RFC 4180: each
//! field is wrapped in double quotes and joined with commas, with no
//! escaping of embedded quote characters.  A field containing `"` will
//! not survive a round trip.  The layout matches backup files written by
//! earlier releases, so it is kept byte-for-byte rather than upgraded.
//!
//! ```text
//! Title,Username,Password,URL,Notes
//! "Bank","alice","hunter2","https://bank.example","main account"
//! ```
//!
//! Import is best-effort and lossy-tolerant: the header line is skipped
//! without being parsed, blank lines are ignored, and any line that does
//! not split into at least three fields is dropped silently.

use crate::record::CredentialRecord;

/// The literal header line.  Written on export; skipped, never parsed,
/// on import.
pub const HEADER: &str = "Title,Username,Password,URL,Notes";

/// A line must yield at least Title, Username, and Password.
const MIN_FIELDS: usize = 3;

/// Fixed column count; anything past Notes is discarded.
const MAX_FIELDS: usize = 5;

/// Render records as interchange text, one line per record after the
/// header, in the fixed column order `Title, Username, Password, URL,
/// Notes`.
pub fn export(records: &[CredentialRecord]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for r in records {
        out.push_str(&format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
            r.title, r.username, r.password, r.url, r.notes
        ));
    }

    out
}

/// Parse interchange text into records.
///
/// Each kept line is split on the literal `","` delimiter; the first
/// field loses its leading quote and the last present field its
/// trailing quote.  URL and Notes are optional trailing columns.  Every
/// imported record gets a fresh id and fresh timestamps — import never
/// resurrects ids from the file.
pub fn import(text: &str) -> Vec<CredentialRecord> {
    let mut records = Vec::new();

    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let mut parts: Vec<&str> = line.split("\",\"").collect();
        if parts.len() < MIN_FIELDS {
            // Malformed line: skipped, not counted, not an error.
            continue;
        }
        parts.truncate(MAX_FIELDS);

        let last = parts.len() - 1;
        parts[0] = parts[0].strip_prefix('"').unwrap_or(parts[0]);
        parts[last] = parts[last].strip_suffix('"').unwrap_or(parts[last]);

        records.push(CredentialRecord::new(
            parts[0],
            parts[1],
            parts[2],
            parts.get(3).copied().unwrap_or(""),
            parts.get(4).copied().unwrap_or(""),
        ));
    }

    records
}
