use sha2::{Digest, Sha256};

/// Number of hex digits kept from the digest.
pub const FINGERPRINT_LEN: usize = 8;

/// Short SHA-256 fingerprint of `source`, as lowercase hex.
pub fn content_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// `{base}.{hash}.js` when hashing, `{base}.js` otherwise.
pub fn asset_file_name(base: &str, source: &str, should_hash: bool) -> String {
    if should_hash {
        format!("{base}.{}.js", content_hash(source))
    } else {
        format!("{base}.js")
    }
}
