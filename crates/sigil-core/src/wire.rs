//! Bounds-checked helpers for the endpoint wire codec.
//!
//! Encodings use fixed-width big-endian integers and length-prefixed UTF-8
//! strings. Every read is bounds-checked and surfaces
//! [`TransportError::MalformedWire`] instead of panicking, so arbitrary
//! bytes are safe to feed through the decode path.

use bytes::{Buf, BufMut, Bytes};

use crate::error::TransportError;

/// Append a big-endian `u16`.
pub fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.put_u16(value);
}

/// Read a big-endian `u16`.
pub fn get_u16(buf: &mut Bytes) -> Result<u16, TransportError> {
    if buf.remaining() < 2 {
        return Err(TransportError::malformed("truncated u16"));
    }
    Ok(buf.get_u16())
}

/// Append a big-endian `u64`.
pub fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.put_u64(value);
}

/// Read a big-endian `u64`.
pub fn get_u64(buf: &mut Bytes) -> Result<u64, TransportError> {
    if buf.remaining() < 8 {
        return Err(TransportError::malformed("truncated u64"));
    }
    Ok(buf.get_u64())
}

/// Append a boolean as a single byte, `0` or `1`.
pub fn put_bool(buf: &mut Vec<u8>, value: bool) {
    buf.put_u8(u8::from(value));
}

/// Read a boolean byte; any value other than `0` or `1` is malformed.
pub fn get_bool(buf: &mut Bytes) -> Result<bool, TransportError> {
    if buf.remaining() < 1 {
        return Err(TransportError::malformed("truncated bool"));
    }
    match buf.get_u8() {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(TransportError::malformed(format!("invalid bool byte {other}"))),
    }
}

/// Append a UTF-8 string with a big-endian `u32` length prefix.
pub fn put_str(buf: &mut Vec<u8>, value: &str) {
    buf.put_u32(value.len() as u32);
    buf.extend_from_slice(value.as_bytes());
}

/// Read a length-prefixed UTF-8 string.
pub fn get_str(buf: &mut Bytes) -> Result<String, TransportError> {
    if buf.remaining() < 4 {
        return Err(TransportError::malformed("truncated string length"));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(TransportError::malformed("truncated string body"));
    }
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec())
        .map_err(|_| TransportError::malformed("string body is not UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_round_trip() {
        let mut buf = Vec::new();
        put_u16(&mut buf, 0x0165);

        let mut bytes = Bytes::from(buf);
        assert_eq!(get_u16(&mut bytes).expect("decode"), 0x0165);
        assert_eq!(bytes.remaining(), 0);
    }

    #[test]
    fn u16_is_big_endian() {
        let mut buf = Vec::new();
        put_u16(&mut buf, 0x0102);
        assert_eq!(buf, [0x01, 0x02]);
    }

    #[test]
    fn truncated_u16_is_malformed() {
        let mut bytes = Bytes::from_static(&[0x01]);
        let err = get_u16(&mut bytes).expect_err("one byte is not a u16");
        assert!(matches!(err, TransportError::MalformedWire { .. }));
    }

    #[test]
    fn string_round_trip() {
        let mut buf = Vec::new();
        put_str(&mut buf, "lo0");

        let mut bytes = Bytes::from(buf);
        assert_eq!(get_str(&mut bytes).expect("decode"), "lo0");
    }

    #[test]
    fn string_length_beyond_buffer_is_malformed() {
        // Length claims 4 GiB; only two body bytes follow.
        let mut bytes = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF, 0x61, 0x62]);
        let err = get_str(&mut bytes).expect_err("length overruns buffer");
        assert!(matches!(err, TransportError::MalformedWire { .. }));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let mut bytes = Bytes::from_static(&[0x00, 0x00, 0x00, 0x02, 0xC3, 0x28]);
        let err = get_str(&mut bytes).expect_err("invalid UTF-8");
        assert!(matches!(err, TransportError::MalformedWire { .. }));
    }

    #[test]
    fn bool_rejects_out_of_range_bytes() {
        let mut bytes = Bytes::from_static(&[0x02]);
        let err = get_bool(&mut bytes).expect_err("2 is not a bool");
        assert!(matches!(err, TransportError::MalformedWire { .. }));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn prop_str_round_trip(value in any::<String>()) {
                let mut buf = Vec::new();
                put_str(&mut buf, &value);

                let mut bytes = Bytes::from(buf);
                prop_assert_eq!(get_str(&mut bytes).expect("decode"), value);
                prop_assert_eq!(bytes.remaining(), 0);
            }

            #[test]
            fn prop_u64_round_trip(value in any::<u64>()) {
                let mut buf = Vec::new();
                put_u64(&mut buf, value);

                let mut bytes = Bytes::from(buf);
                prop_assert_eq!(get_u64(&mut bytes).expect("decode"), value);
            }

            #[test]
            fn prop_truncated_input_never_panics(data in proptest::collection::vec(any::<u8>(), 0..16)) {
                let mut bytes = Bytes::from(data);
                let _ = get_str(&mut bytes);
                let _ = get_u64(&mut bytes);
                let _ = get_u16(&mut bytes);
                let _ = get_bool(&mut bytes);
            }
        }
    }
}
