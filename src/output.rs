/// JSON persistence of the final ordered record list.

use std::path::Path;

use tracing::info;

use crate::error::ClientError;
use crate::protocol::TradeRecord;

/// Write `records` as a pretty-printed JSON array, replacing any existing file.
pub fn write_json<P: AsRef<Path>>(path: P, records: &[TradeRecord]) -> Result<(), ClientError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Output(format!("create {}: {e}", parent.display())))?;
        }
    }

    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)
        .map_err(|e| ClientError::Output(format!("write {}: {e}", path.display())))?;

    info!(path = %path.display(), records = records.len(), "output saved");
    Ok(())
}
