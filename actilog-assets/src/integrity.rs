use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha384};

/// Subresource-integrity value for a file's bytes, in the
/// `sha384-<base64 digest>` form browsers verify.
pub fn integrity_hash(bytes: &[u8]) -> String {
    format!("sha384-{}", STANDARD.encode(Sha384::digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_vector() {
        assert_eq!(
            integrity_hash(b""),
            "sha384-OLBgp1GsljhM2TJ+sbHjaiH9txEUvgdDTAzHv2P24donTt6/529l+9Ua0vFImLlb"
        );
    }

    #[test]
    fn hash_has_sri_shape() {
        let hash = integrity_hash(b"console.log(\"app\");\n");
        assert!(hash.starts_with("sha384-"));
        // 48-byte digest encodes to 64 base64 characters
        assert_eq!(hash.len(), "sha384-".len() + 64);
    }

    #[test]
    fn distinct_inputs_hash_differently() {
        assert_ne!(integrity_hash(b"a"), integrity_hash(b"b"));
    }
}
