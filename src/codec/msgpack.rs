//! MsgPack codec using `rmp-serde`.
//!
//! Structs are always encoded as maps (`to_vec_named`). MessagePack request
//! bodies are decoded into a JSON value tree and looked up by field name, so
//! positional (array) encoding would lose the names the binder needs.
//!
//! # Example
//!
//! ```
//! use actionwire::codec::MsgPackCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Greeting {
//!     name: String,
//!     times: u32,
//! }
//!
//! let msg = Greeting { name: "Ada".to_string(), times: 3 };
//! let encoded = MsgPackCodec::encode(&msg).unwrap();
//! let decoded: Greeting = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use crate::error::Result;

/// MessagePack codec for structured data.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes, structs as maps.
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
