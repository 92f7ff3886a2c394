//! Structural checks run before any workflow touches the store or the engine

use crate::error::{RbacError, RbacResult};
use crate::models::Entry;

/// Fail with `EmptyId` when the entry has no identity
pub fn ensure_id<E: Entry>(entry: &E) -> RbacResult<()> {
    if entry.id() == 0 {
        return Err(RbacError::EmptyId);
    }
    Ok(())
}
