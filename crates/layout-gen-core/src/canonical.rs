//! OLPC canonical JSON, as read by in-toto and securesystemslib.
//!
//! Keys sorted, no whitespace, strings escape only `\` and `"`. Control
//! characters (PEM newlines included) stay as raw bytes, which is where this
//! differs from RFC 8785.

use olpc_cjson::CanonicalFormatter;
use serde::Serialize;

/// Serialize `value` to canonical bytes.
pub fn to_canonical_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter::new());
    value.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sorted_and_compact() {
        let value = json!({"b": [1, 2], "a": {"z": true, "y": null}});
        assert_eq!(
            to_canonical_vec(&value).unwrap(),
            br#"{"a":{"y":null,"z":true},"b":[1,2]}"#
        );
    }

    #[test]
    fn test_newlines_stay_raw() {
        let value = json!({"public": "-----BEGIN PUBLIC KEY-----\nMFkw\n-----END PUBLIC KEY-----\n"});
        let bytes = to_canonical_vec(&value).unwrap();
        assert_eq!(
            bytes,
            b"{\"public\":\"-----BEGIN PUBLIC KEY-----\nMFkw\n-----END PUBLIC KEY-----\n\"}".to_vec()
        );
    }

    #[test]
    fn test_escapes_quote_and_backslash_only() {
        let value = json!(["say \"hi\"\t\\"]);
        assert_eq!(
            to_canonical_vec(&value).unwrap(),
            b"[\"say \\\"hi\\\"\t\\\\\"]".to_vec()
        );
    }
}
