use serde_json::Value;

use crate::error::ScoreError;
use crate::input::InputError;
use crate::input::record::{VerificationRecord, missing_fields};

/// Parses the CLI payload, or falls back to the illustrative record when
/// none was given.
pub fn prepare_record(payload: Option<&str>) -> Result<VerificationRecord, ScoreError> {
    let Some(raw) = payload else {
        tracing::info!("no record supplied; scoring the illustrative example record");
        return Ok(VerificationRecord::example());
    };

    let value: Value = serde_json::from_str(raw).map_err(InputError::from)?;
    let missing = missing_fields(&value);
    let record = VerificationRecord::from_json_value(&value)?;
    if !missing.is_empty() {
        tracing::warn!(fields = ?missing, "record is missing fields; defaults applied");
    }
    tracing::debug!(?record, "prepared verification record");
    Ok(record)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_prepare.rs"]
mod tests;
