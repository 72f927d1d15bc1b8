use alloy_primitives::hex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, DecodeError, Encode};
use ssz_types::{FixedVector, typenum};
use tree_hash::{Hash256, PackedEncoding, TreeHash, TreeHashType, merkle_root};

/// Fixed-length opaque byte containers.
///
/// The gateway never verifies signatures or KZG proofs, it only carries them
/// between upstreams and clients, so these are plain byte wrappers with the
/// SSZ/serde/tree-hash plumbing and nothing else.
macro_rules! fixed_bytes_container {
    ($name:ident, $len:expr) => {
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub struct $name(pub [u8; $len]);

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl Encode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn ssz_bytes_len(&self) -> usize {
                $len
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.0);
            }
        }

        impl Decode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
                if bytes.len() != $len {
                    return Err(DecodeError::InvalidByteLength {
                        len: bytes.len(),
                        expected: $len,
                    });
                }

                let mut inner = [0u8; $len];
                inner.copy_from_slice(bytes);
                Ok(Self(inner))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw: String = Deserialize::deserialize(deserializer)?;
                let decoded = hex::decode(raw.trim_start_matches("0x"))
                    .map_err(serde::de::Error::custom)?;

                if decoded.len() != $len {
                    return Err(serde::de::Error::custom(format!(
                        "invalid byte length: expected {}, got {}",
                        $len,
                        decoded.len()
                    )));
                }

                let mut inner = [0u8; $len];
                inner.copy_from_slice(&decoded);
                Ok(Self(inner))
            }
        }

        impl TreeHash for $name {
            fn tree_hash_type() -> TreeHashType {
                TreeHashType::Vector
            }

            fn tree_hash_packed_encoding(&self) -> PackedEncoding {
                PackedEncoding::from_vec(self.0.to_vec())
            }

            fn tree_hash_packing_factor() -> usize {
                1
            }

            fn tree_hash_root(&self) -> Hash256 {
                merkle_root(&self.0, 0)
            }
        }
    };
}

fixed_bytes_container!(BlsSignature, 96);
fixed_bytes_container!(PubKey, 48);
fixed_bytes_container!(KZGCommitment, 48);
fixed_bytes_container!(KZGProof, 48);

pub type Blob = FixedVector<u8, typenum::U131072>;

#[cfg(test)]
mod tests {
    use ssz::{Decode, Encode};
    use tree_hash::TreeHash;

    use super::*;

    #[test]
    fn test_signature_ssz_round_trip() {
        let signature = BlsSignature([7u8; 96]);

        let encoded = signature.as_ssz_bytes();
        assert_eq!(encoded.len(), 96);
        assert_eq!(BlsSignature::from_ssz_bytes(&encoded).unwrap(), signature);
    }

    #[test]
    fn test_signature_rejects_wrong_length() {
        assert!(BlsSignature::from_ssz_bytes(&[0u8; 95]).is_err());
    }

    #[test]
    fn test_json_round_trip_with_prefix() {
        let commitment = KZGCommitment([3u8; 48]);

        let json = serde_json::to_string(&commitment).unwrap();
        assert!(json.starts_with("\"0x"));
        assert_eq!(
            serde_json::from_str::<KZGCommitment>(&json).unwrap(),
            commitment
        );
    }

    #[test]
    fn test_tree_hash_is_stable() {
        let pubkey = PubKey([9u8; 48]);

        assert_eq!(pubkey.tree_hash_root(), pubkey.tree_hash_root());
    }
}
