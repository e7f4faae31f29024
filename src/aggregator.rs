use crate::error::{EngineError, Result};
use crate::types::{ComparisonRecord, ProductRecord};

/// Zips two index-aligned record sequences into comparison rows.
///
/// Alignment is the caller's job; a length mismatch is reported, never truncated
/// or padded.
pub fn merge(left: Vec<ProductRecord>, right: Vec<ProductRecord>) -> Result<Vec<ComparisonRecord>> {
    if left.len() != right.len() {
        return Err(EngineError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(left
        .into_iter()
        .zip(right)
        .enumerate()
        .map(|(index, (l, r))| ComparisonRecord::new(index, l, r))
        .collect())
}
