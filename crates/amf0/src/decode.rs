use bytes_util::ByteCursor;
use tracing::warn;

use crate::define::upsert;
use crate::{Amf0Marker, Amf0Properties, Amf0ReadError, Amf0Value};

/// An AMF0 Decoder.
///
/// Drives a [`ByteCursor`] over the encoded bytes and produces owned
/// [`Amf0Value`] trees.
pub struct Amf0Decoder<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> Amf0Decoder<'a> {
    /// Create a new AMF0 decoder.
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
        }
    }

    /// Check if the decoder has reached the end of the AMF0 data.
    pub const fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    /// Read the next encoded value from the decoder.
    pub fn decode(&mut self) -> Result<Amf0Value, Amf0ReadError> {
        let marker_byte = self.cursor.get_u8()?;
        let marker = Amf0Marker::try_from(marker_byte).map_err(Amf0ReadError::UnknownMarker)?;

        match marker {
            Amf0Marker::Number => Ok(Amf0Value::Number(self.cursor.get_f64_be()?)),
            Amf0Marker::Boolean => Ok(Amf0Value::Boolean(self.cursor.get_u8()? > 0)),
            Amf0Marker::String => Ok(Amf0Value::String(self.read_string()?)),
            Amf0Marker::Object => Ok(Amf0Value::Object(self.read_properties()?)),
            Amf0Marker::Null => Ok(Amf0Value::Null),
            Amf0Marker::Undefined => Ok(Amf0Value::Undefined),
            Amf0Marker::EcmaArray => Ok(Amf0Value::EcmaArray(self.read_ecma_array()?)),
            Amf0Marker::StrictArray => Ok(Amf0Value::StrictArray(self.read_strict_array()?)),
            Amf0Marker::Date => self.read_date(),
            Amf0Marker::Unsupported => Ok(Amf0Value::Unsupported),
            _ => Err(Amf0ReadError::UnsupportedType(marker)),
        }
    }

    fn read_string(&mut self) -> Result<String, Amf0ReadError> {
        let len = self.cursor.get_u16_be()? as usize;
        let bytes = self.cursor.get_bytes(len)?;
        Ok(std::str::from_utf8(bytes)?.to_owned())
    }

    /// Read the key/value pairs shared by Object and EcmaArray, up to the
    /// `00 00 09` terminator.
    ///
    /// Running out of bytes at a key length is recoverable: the container
    /// is returned with whatever was read so far. Anywhere else the error
    /// propagates. Duplicate keys on the wire overwrite, keeping the
    /// earliest insertion slot.
    fn read_properties(&mut self) -> Result<Amf0Properties, Amf0ReadError> {
        let mut properties = Amf0Properties::new();

        loop {
            let len = match self.cursor.get_u16_be() {
                Ok(len) => len as usize,
                Err(e) => {
                    warn!("error deserializing a container element: {e}; container may be incomplete");
                    return Ok(properties);
                }
            };

            if len == 0 {
                // Terminator byte (0x09) follows the empty key.
                self.cursor.get_u8()?;
                break;
            }

            let key = std::str::from_utf8(self.cursor.get_bytes(len)?)?.to_owned();
            let value = self.decode()?;
            upsert(&mut properties, key, value);
        }

        Ok(properties)
    }

    fn read_ecma_array(&mut self) -> Result<Amf0Properties, Amf0ReadError> {
        // The associative count is a hint, not authoritative; the pair
        // list runs to the terminator regardless.
        let _count_hint = self.cursor.get_u32_be()?;
        self.read_properties()
    }

    fn read_strict_array(&mut self) -> Result<Vec<Amf0Value>, Amf0ReadError> {
        let len = self.cursor.get_u32_be()?;

        let mut values = Vec::with_capacity(len.min(1024) as usize);
        for _ in 0..len {
            values.push(self.decode()?);
        }

        Ok(values)
    }

    fn read_date(&mut self) -> Result<Amf0Value, Amf0ReadError> {
        let milliseconds = self.cursor.get_f64_be()?;
        let minutes_west = self.cursor.get_u16_be()? as i16;

        let s = milliseconds / 1000.0;
        let seconds = s.floor();
        let micros = ((s - seconds) * 1_000_000.0) as u32;

        Ok(Amf0Value::Date {
            seconds: seconds as i64,
            micros,
            minutes_west,
        })
    }
}

impl Iterator for Amf0Decoder<'_> {
    type Item = Result<Amf0Value, Amf0ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }

        Some(self.decode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_bool() {
        let amf0_bool = vec![0x01, 0x01]; // true
        let mut amf_reader = Amf0Decoder::new(&amf0_bool);
        assert_eq!(amf_reader.decode().unwrap(), Amf0Value::Boolean(true));
    }

    #[test]
    fn test_reader_number() {
        let mut amf0_number = vec![0x00];
        amf0_number.extend_from_slice(&772.161_f64.to_be_bytes());

        let mut amf_reader = Amf0Decoder::new(&amf0_number);
        assert_eq!(amf_reader.decode().unwrap(), Amf0Value::Number(772.161));
    }

    #[test]
    fn test_reader_string() {
        let mut amf0_string = vec![0x02, 0x00, 0x0b]; // 11 bytes
        amf0_string.extend_from_slice(b"Hello World");

        let mut amf_reader = Amf0Decoder::new(&amf0_string);
        assert_eq!(
            amf_reader.decode().unwrap(),
            Amf0Value::String("Hello World".to_string())
        );
    }

    #[test]
    fn test_reader_object() {
        let mut amf0_object = vec![0x03, 0x00, 0x04]; // 1 property with 4 bytes
        amf0_object.extend_from_slice(b"test");
        amf0_object.extend_from_slice(&[0x05]); // null
        amf0_object.extend_from_slice(&[0x00, 0x00, 0x09]); // object end

        let mut amf_reader = Amf0Decoder::new(&amf0_object);
        assert_eq!(
            amf_reader.decode().unwrap(),
            Amf0Value::Object(vec![("test".into(), Amf0Value::Null)])
        );
        assert!(amf_reader.is_empty());
    }

    #[test]
    fn test_reader_ecma_array() {
        let mut amf0_object = vec![0x08, 0x00, 0x00, 0x00, 0x01]; // count hint 1
        amf0_object.extend_from_slice(&[0x00, 0x04]); // 4 bytes
        amf0_object.extend_from_slice(b"test");
        amf0_object.extend_from_slice(&[0x05]); // null
        amf0_object.extend_from_slice(&[0x00, 0x00, 0x09]); // object end

        let mut amf_reader = Amf0Decoder::new(&amf0_object);
        assert_eq!(
            amf_reader.decode().unwrap(),
            Amf0Value::EcmaArray(vec![("test".into(), Amf0Value::Null)])
        );
        assert!(amf_reader.is_empty());
    }

    #[test]
    fn test_reader_ecma_array_ignores_count_hint() {
        // Count hint claims 9 entries, the pair list holds one.
        let mut amf0_object = vec![0x08, 0x00, 0x00, 0x00, 0x09];
        amf0_object.extend_from_slice(&[0x00, 0x04]);
        amf0_object.extend_from_slice(b"test");
        amf0_object.extend_from_slice(&[0x05]);
        amf0_object.extend_from_slice(&[0x00, 0x00, 0x09]);

        let mut amf_reader = Amf0Decoder::new(&amf0_object);
        assert_eq!(
            amf_reader.decode().unwrap(),
            Amf0Value::EcmaArray(vec![("test".into(), Amf0Value::Null)])
        );
    }

    #[test]
    fn test_reader_strict_array() {
        let mut amf0_array = vec![0x0a, 0x00, 0x00, 0x00, 0x03]; // 3 elements
        amf0_array.push(0x00);
        amf0_array.extend_from_slice(&1.0_f64.to_be_bytes());
        amf0_array.extend_from_slice(&[0x01, 0x01]); // Boolean true
        amf0_array.extend_from_slice(&[0x02, 0x00, 0x04]); // String with 4 bytes
        amf0_array.extend_from_slice(b"test");

        let mut amf_reader = Amf0Decoder::new(&amf0_array);
        assert_eq!(
            amf_reader.decode().unwrap(),
            Amf0Value::StrictArray(vec![
                Amf0Value::Number(1.0),
                Amf0Value::Boolean(true),
                Amf0Value::String("test".to_string()),
            ])
        );
    }

    #[test]
    fn test_reader_date() {
        let mut amf0_date = vec![0x0b];
        amf0_date.extend_from_slice(&1_234_567_500.0_f64.to_be_bytes());
        amf0_date.extend_from_slice(&120_i16.to_be_bytes());

        let mut amf_reader = Amf0Decoder::new(&amf0_date);
        assert_eq!(
            amf_reader.decode().unwrap(),
            Amf0Value::Date {
                seconds: 1_234_567,
                micros: 500_000,
                minutes_west: 120,
            }
        );
    }

    #[test]
    fn test_reader_undefined_and_unsupported() {
        let mut amf_reader = Amf0Decoder::new(&[0x06]);
        assert_eq!(amf_reader.decode().unwrap(), Amf0Value::Undefined);

        let mut amf_reader = Amf0Decoder::new(&[0x0d]);
        assert_eq!(amf_reader.decode().unwrap(), Amf0Value::Unsupported);
    }

    #[test]
    fn test_reader_multi_value() {
        let mut amf0_multi = vec![0x00];
        amf0_multi.extend_from_slice(&772.161_f64.to_be_bytes());
        amf0_multi.extend_from_slice(&[0x01, 0x01]); // true
        amf0_multi.extend_from_slice(&[0x02, 0x00, 0x0b]); // 11 bytes
        amf0_multi.extend_from_slice(b"Hello World");

        let amf_reader = Amf0Decoder::new(&amf0_multi);
        let values = amf_reader.collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(
            values,
            vec![
                Amf0Value::Number(772.161),
                Amf0Value::Boolean(true),
                Amf0Value::String("Hello World".to_string()),
            ]
        );
    }

    #[test]
    fn test_reader_unknown_marker() {
        let mut amf_reader = Amf0Decoder::new(&[0xFF]);
        assert!(matches!(
            amf_reader.decode(),
            Err(Amf0ReadError::UnknownMarker(0xFF))
        ));
    }

    #[test]
    fn test_reader_unsupported_marker() {
        let amf0_long_string = vec![Amf0Marker::LongString as u8];
        let mut amf_reader = Amf0Decoder::new(&amf0_long_string);
        assert!(matches!(
            amf_reader.decode(),
            Err(Amf0ReadError::UnsupportedType(Amf0Marker::LongString))
        ));
    }

    #[test]
    fn test_truncated_input_returns_error() {
        // Truncated number (marker + only 3 bytes of 8-byte f64)
        let truncated = vec![0x00, 0x40, 0x59, 0x00];
        let mut reader = Amf0Decoder::new(&truncated);
        assert!(matches!(
            reader.decode(),
            Err(Amf0ReadError::EndOfBuffer(_))
        ));

        // Truncated string (claims 11 bytes but only has 3)
        let truncated_str = vec![0x02, 0x00, 0x0b, b'H', b'e', b'l'];
        let mut reader = Amf0Decoder::new(&truncated_str);
        assert!(matches!(
            reader.decode(),
            Err(Amf0ReadError::EndOfBuffer(_))
        ));
    }

    #[test]
    fn test_container_recovers_partial_contents() {
        // An object whose second key length is cut off mid-read: the
        // partial contents survive.
        let mut amf0_object = vec![0x03, 0x00, 0x04];
        amf0_object.extend_from_slice(b"test");
        amf0_object.extend_from_slice(&[0x01, 0x01]); // Boolean true
        amf0_object.push(0x00); // half of the next key length, then EOF

        let mut reader = Amf0Decoder::new(&amf0_object);
        assert_eq!(
            reader.decode().unwrap(),
            Amf0Value::Object(vec![("test".into(), Amf0Value::Boolean(true))])
        );
    }

    #[test]
    fn test_truncation_inside_value_propagates() {
        // Same shape, but the truncation hits a value payload instead of a
        // key length: not recoverable.
        let mut amf0_object = vec![0x03, 0x00, 0x04];
        amf0_object.extend_from_slice(b"test");
        amf0_object.extend_from_slice(&[0x00, 0x40]); // number marker + 1 byte

        let mut reader = Amf0Decoder::new(&amf0_object);
        assert!(matches!(
            reader.decode(),
            Err(Amf0ReadError::EndOfBuffer(_))
        ));
    }

    #[test]
    fn test_duplicate_keys_keep_earliest_slot() {
        let mut amf0_object = vec![0x03];
        for value in [0x05u8, 0x06u8] {
            amf0_object.extend_from_slice(&[0x00, 0x03]);
            amf0_object.extend_from_slice(b"dup");
            amf0_object.push(value);
        }
        amf0_object.extend_from_slice(&[0x00, 0x04]);
        amf0_object.extend_from_slice(b"last");
        amf0_object.push(0x05);
        amf0_object.extend_from_slice(&[0x00, 0x00, 0x09]);

        let mut reader = Amf0Decoder::new(&amf0_object);
        assert_eq!(
            reader.decode().unwrap(),
            Amf0Value::Object(vec![
                ("dup".into(), Amf0Value::Undefined),
                ("last".into(), Amf0Value::Null),
            ])
        );
    }
}
