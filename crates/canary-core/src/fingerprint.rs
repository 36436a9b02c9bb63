use sha2::{Digest, Sha256};
use std::fmt;

const FINGERPRINT_VERSION: &[u8] = b"canary.fp.v1";

/// Cache key for a (prompt, expected behavior, actual output) triple.
///
/// Stored on every result row as `diff_hash`, so identical triples hit the
/// same verdict across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the fingerprint of a judge input.
///
/// Each field is digested on its own and the fixed-length digests are
/// concatenated, so moving bytes across a field boundary always changes the
/// key (`"ab" + "c"` vs `"a" + "bc"`).
pub fn compute(prompt: &str, expected_behavior: &str, actual_output: &str) -> Fingerprint {
    let mut outer = Sha256::new();
    outer.update(FINGERPRINT_VERSION);
    for field in [prompt, expected_behavior, actual_output] {
        outer.update(Sha256::digest(field.as_bytes()));
    }
    Fingerprint(hex::encode(outer.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = compute("p", "e", "a");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_field_order_matters() {
        assert_ne!(compute("x", "y", "z"), compute("y", "x", "z"));
        assert_ne!(compute("x", "y", "z"), compute("x", "z", "y"));
    }
}
