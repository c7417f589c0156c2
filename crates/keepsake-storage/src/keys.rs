use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape the bucket root.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
