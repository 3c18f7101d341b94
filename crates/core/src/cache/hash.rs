//! Cache key generation for request entries.

use sha2::{Digest, Sha256};

/// Compute the cache key of a request from its method and URL.
///
/// The method is uppercased so `get` and `GET` share an entry.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "http://localhost:3000/");
        let hash2 = compute_cache_key("GET", "http://localhost:3000/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(
            compute_cache_key("get", "http://localhost:3000/search"),
            compute_cache_key("GET", "http://localhost:3000/search")
        );
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "http://localhost:3000/");
        let head = compute_cache_key("HEAD", "http://localhost:3000/");
        assert_ne!(get, head);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "http://localhost:3000/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
