//! Computes the reconciled limits document. No I/O happens here.
use limits_types::LimitsDocument;

use crate::{Error, Result};

/// Set the default tenant's head series limit to `replica_count * active_series_max`.
///
/// Only `write.default.head_series_limit` changes. Named tenants keep their own limits,
/// including their own `head_series_limit`, and fields the model does not know about are
/// carried over untouched.
pub fn reconcile(
    replica_count: u64,
    active_series_max: u32,
    mut base: LimitsDocument,
) -> Result<LimitsDocument> {
    let limit = i64::try_from(replica_count)
        .ok()
        .and_then(|replicas| replicas.checked_mul(i64::from(active_series_max)))
        .ok_or(Error::LimitOverflow {
            replicas: replica_count,
            active_series_max,
        })?;

    base.write.default.head_series_limit = Some(limit);
    Ok(base)
}
