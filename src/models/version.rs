//! Version stamping of stored resources

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

/// A resource carrying a last-modified time and an entity tag
pub trait Versioned: Serialize {
    fn set_etag(&mut self, etag: String);

    fn set_last_modified(&mut self, last_modified: DateTime<Utc>);
}

/// Stamp the resource for a write at `now`.
///
/// The entity tag is the SHA-256 of the serialized resource once its
/// modification time is updated, so it still covers the previous tag.
pub fn update_cache_props<T: Versioned>(resource: &mut T, now: DateTime<Utc>) -> AppResult<()> {
    resource.set_last_modified(now);
    let etag = compute_etag(resource)
        .map_err(|e| AppError::Internal(format!("Failed to serialize resource for its eTag: {}", e)))?;
    resource.set_etag(etag);
    Ok(())
}

pub fn compute_etag<T: Serialize>(resource: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(resource)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
