//! Control-channel documents.
//!
//! Everything here crosses the boundary as JSON text through
//! [`crate::json`]; no `serde_json::Value` is handed out.

pub mod events;

use crate::error::Result;
use crate::json;

/// Look up `sources.<name>` in an engine configuration document.
///
/// Returns the entry pretty-printed, or `None` when the document has no
/// `sources` object or no entry under that name.
///
/// # Errors
/// A parse error when `config_text` is not valid JSON.
pub fn source_entry(config_text: &str, name: &str) -> Result<Option<String>> {
    let config = json::parse_json(config_text)?;
    match config.get("sources").and_then(|sources| sources.get(name)) {
        Some(entry) => Ok(Some(json::stringify_json(entry, true)?)),
        None => Ok(None),
    }
}
