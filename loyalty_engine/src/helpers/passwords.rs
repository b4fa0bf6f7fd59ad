use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the keyed hash of a plaintext password, hex-encoded for storage.
///
/// The key is the server-wide signature key; two servers with different keys produce incompatible hashes.
pub fn hash_password(plaintext: &str, key: &str) -> String {
    // HMAC-SHA-256 accepts keys of any size per RFC 2104, so new_from_slice cannot fail here.
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key size");
    mac.update(plaintext.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Recomputes the hash for `plaintext` and compares it against the stored hex digest in constant time.
pub fn verify_password(plaintext: &str, key: &str, stored_hex: &str) -> bool {
    let computed = hash_password(plaintext, key);
    if computed.len() != stored_hex.len() {
        return false;
    }
    computed.bytes().zip(stored_hex.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn digest_is_32_bytes_hex_encoded() {
        let hash = hash_password("12345", "server-key");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn verification_accepts_the_right_password_only() {
        let hash = hash_password("12345", "server-key");
        assert!(verify_password("12345", "server-key", &hash));
        assert!(!verify_password("12346", "server-key", &hash));
        assert!(!verify_password("12345", "other-key", &hash));
        assert!(!verify_password("12345", "server-key", "deadbeef"));
    }

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(hash_password("pass", "k"), hash_password("pass", "k"));
        assert_ne!(hash_password("pass", "k"), hash_password("pass", "l"));
    }
}
