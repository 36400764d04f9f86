//! MsgPack codec using `rmp-serde`.
//!
//! All frame payloads are MessagePack. Structs are encoded with
//! `to_vec_named` (struct-as-map) so payloads stay self-describing and
//! field-order independent across peers.
//!
//! # Example
//!
//! ```
//! use maxwire::codec::MsgPackCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message {
//!     number: i64,
//! }
//!
//! let msg = Message { number: 42 };
//! let encoded = MsgPackCodec::encode(&msg).unwrap();
//! let decoded: Message = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use crate::error::Result;

/// MessagePack codec for structured payloads.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes (struct-as-map format).
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        number: i64,
        label: String,
    }

    #[test]
    fn test_encode_decode_struct() {
        let original = Sample {
            number: -7,
            label: "probe".to_string(),
        };

        let encoded = MsgPackCodec::encode(&original).unwrap();
        let decoded: Sample = MsgPackCodec::decode(&encoded).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_struct_encodes_as_map() {
        let sample = Sample {
            number: 1,
            label: "x".to_string(),
        };
        let encoded = MsgPackCodec::encode(&sample).unwrap();

        // fixmap marker is 0x8X; positional arrays (0x9X) would break peers
        // that look fields up by name.
        assert_eq!(encoded[0] & 0xF0, 0x80, "expected map format");
    }

    #[test]
    fn test_encode_decode_primitives() {
        let n: i64 = 12345;
        let encoded = MsgPackCodec::encode(&n).unwrap();
        let decoded: i64 = MsgPackCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, n);

        let neg: i64 = -98765;
        let encoded = MsgPackCodec::encode(&neg).unwrap();
        let decoded: i64 = MsgPackCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, neg);
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let invalid = b"not valid msgpack";
        let result: Result<Sample> = MsgPackCodec::decode(invalid);
        assert!(result.is_err());
    }
}
