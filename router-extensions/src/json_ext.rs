//! Performance oriented JSON manipulation.

use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
pub use serde_json_bytes::Value;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// Extension trait for [`serde_json_bytes::Value`].
pub(crate) trait ValueExt {
    /// Returns `true` if the value is a JSON number equal to `expected`,
    /// regardless of whether it was encoded as an integer or a float.
    fn is_number_eq(&self, expected: u64) -> bool;
}

impl ValueExt for Value {
    fn is_number_eq(&self, expected: u64) -> bool {
        match self {
            Value::Number(number) => match number.as_u64() {
                Some(n) => n == expected,
                None => number.as_f64() == Some(expected as f64),
            },
            _ => false,
        }
    }
}
