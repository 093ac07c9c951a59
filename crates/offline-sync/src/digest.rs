use sha2::{Digest, Sha256};

/// `sha256:<hex>` digest of a body, recorded next to stored entries.
pub(crate) fn sha256_prefixed(bytes: &[u8]) -> String {
    format!("sha256:{}", sha256_hex(bytes))
}

/// Bare lowercase hex SHA-256, used to derive file names from cache keys.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
