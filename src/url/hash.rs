use sha2::{Digest, Sha256};

/// Computes the stable identifier of a canonical URL
///
/// The hash is the hex-encoded SHA-256 digest of the URL bytes. It depends
/// only on the input string, so the same canonical URL yields the same hash
/// within a process and across processes.
///
/// # Examples
///
/// ```
/// use articlesa::url::url_hash;
///
/// let a = url_hash("https://a.example/x");
/// assert_eq!(a, url_hash("https://a.example/x"));
/// assert_eq!(a.len(), 64);
/// ```
pub fn url_hash(canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_url.as_bytes());
    hex::encode(hasher.finalize())
}
