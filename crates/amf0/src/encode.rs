use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use crate::{Amf0Marker, Amf0Value, Amf0WriteError};

/// An AMF0 Encoder.
///
/// Writes [`Amf0Value`] trees into anything implementing [`io::Write`].
/// Keyed containers are written in insertion order; the EcmaArray count
/// field is the live element count, never a stored hint.
pub struct Amf0Encoder;

impl Amf0Encoder {
    /// Encode one value, marker byte included.
    pub fn encode<W: io::Write>(writer: &mut W, value: &Amf0Value) -> Result<(), Amf0WriteError> {
        match value {
            Amf0Value::Number(n) => Self::encode_number(writer, *n),
            Amf0Value::Boolean(b) => Self::encode_bool(writer, *b),
            Amf0Value::String(s) => Self::encode_string(writer, s),
            Amf0Value::Object(o) => Self::encode_object(writer, o),
            Amf0Value::Null => Self::encode_null(writer),
            Amf0Value::Undefined => Self::encode_undefined(writer),
            Amf0Value::EcmaArray(o) => Self::encode_ecma_array(writer, o),
            Amf0Value::StrictArray(a) => Self::encode_strict_array(writer, a),
            Amf0Value::Date {
                seconds,
                micros,
                minutes_west,
            } => Self::encode_date(writer, *seconds, *micros, *minutes_west),
            Amf0Value::Unsupported => Self::encode_unsupported(writer),
        }
    }

    fn write_string_payload<W: io::Write>(writer: &mut W, s: &str) -> Result<(), Amf0WriteError> {
        let len = u16::try_from(s.len()).map_err(|_| Amf0WriteError::StringTooLong(s.len()))?;
        writer.write_u16::<BigEndian>(len)?;
        writer.write_all(s.as_bytes())?;
        Ok(())
    }

    fn write_properties<W: io::Write>(
        writer: &mut W,
        properties: &[(String, Amf0Value)],
    ) -> Result<(), Amf0WriteError> {
        for (key, value) in properties {
            Self::write_string_payload(writer, key)?;
            Self::encode(writer, value)?;
        }
        // Object end: empty key + terminator marker.
        writer.write_u16::<BigEndian>(0)?;
        writer.write_u8(Amf0Marker::ObjectEnd as u8)?;
        Ok(())
    }

    pub fn encode_number<W: io::Write>(writer: &mut W, value: f64) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Number as u8)?;
        writer.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn encode_bool<W: io::Write>(writer: &mut W, value: bool) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Boolean as u8)?;
        writer.write_u8(value as u8)?;
        Ok(())
    }

    pub fn encode_string<W: io::Write>(writer: &mut W, value: &str) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::String as u8)?;
        Self::write_string_payload(writer, value)
    }

    pub fn encode_object<W: io::Write>(
        writer: &mut W,
        properties: &[(String, Amf0Value)],
    ) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Object as u8)?;
        Self::write_properties(writer, properties)
    }

    pub fn encode_null<W: io::Write>(writer: &mut W) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Null as u8)?;
        Ok(())
    }

    pub fn encode_undefined<W: io::Write>(writer: &mut W) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Undefined as u8)?;
        Ok(())
    }

    pub fn encode_ecma_array<W: io::Write>(
        writer: &mut W,
        properties: &[(String, Amf0Value)],
    ) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::EcmaArray as u8)?;
        writer.write_u32::<BigEndian>(properties.len() as u32)?;
        Self::write_properties(writer, properties)
    }

    pub fn encode_strict_array<W: io::Write>(
        writer: &mut W,
        values: &[Amf0Value],
    ) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::StrictArray as u8)?;
        writer.write_u32::<BigEndian>(values.len() as u32)?;
        for value in values {
            Self::encode(writer, value)?;
        }
        Ok(())
    }

    pub fn encode_date<W: io::Write>(
        writer: &mut W,
        seconds: i64,
        micros: u32,
        minutes_west: i16,
    ) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Date as u8)?;
        let milliseconds = seconds as f64 * 1000.0 + micros as f64 / 1000.0;
        writer.write_f64::<BigEndian>(milliseconds)?;
        writer.write_i16::<BigEndian>(minutes_west)?;
        Ok(())
    }

    pub fn encode_unsupported<W: io::Write>(writer: &mut W) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Unsupported as u8)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amf0Decoder;

    fn round_trip(value: &Amf0Value) -> Amf0Value {
        let mut buf = Vec::new();
        Amf0Encoder::encode(&mut buf, value).unwrap();
        let mut decoder = Amf0Decoder::new(&buf);
        let decoded = decoder.decode().unwrap();
        assert!(decoder.is_empty());
        decoded
    }

    #[test]
    fn test_scalar_round_trips() {
        for value in [
            Amf0Value::Number(772.161),
            Amf0Value::Boolean(true),
            Amf0Value::Boolean(false),
            Amf0Value::String("Hello World".to_string()),
            Amf0Value::Null,
            Amf0Value::Undefined,
            Amf0Value::Unsupported,
            Amf0Value::Date {
                seconds: 1_234_567,
                micros: 500_000,
                minutes_west: -300,
            },
        ] {
            assert_eq!(round_trip(&value), value);
        }
    }

    #[test]
    fn test_container_round_trips() {
        let value = Amf0Value::EcmaArray(vec![
            ("duration".into(), Amf0Value::Number(120.5)),
            ("title".into(), Amf0Value::String("test".into())),
            (
                "keyframes".into(),
                Amf0Value::Object(vec![
                    (
                        "times".into(),
                        Amf0Value::StrictArray(vec![
                            Amf0Value::Number(0.0),
                            Amf0Value::Number(2.0),
                        ]),
                    ),
                    (
                        "filepositions".into(),
                        Amf0Value::StrictArray(vec![
                            Amf0Value::Number(13.0),
                            Amf0Value::Number(1024.0),
                        ]),
                    ),
                ]),
            ),
        ]);

        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn test_canonical_bytes_round_trip() {
        // decode ∘ encode must reproduce canonical bytes exactly: count
        // hint equal to the element count, keys in insertion order.
        let mut bytes = vec![0x08, 0x00, 0x00, 0x00, 0x02];
        bytes.extend_from_slice(&[0x00, 0x01, b'b']);
        bytes.push(0x00);
        bytes.extend_from_slice(&2.0_f64.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x01, b'a']);
        bytes.push(0x01);
        bytes.push(0x01);
        bytes.extend_from_slice(&[0x00, 0x00, 0x09]);

        let mut decoder = Amf0Decoder::new(&bytes);
        let value = decoder.decode().unwrap();

        let mut encoded = Vec::new();
        Amf0Encoder::encode(&mut encoded, &value).unwrap();
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn test_ecma_array_writes_live_count() {
        // A decoded hint of 9 is discarded; the writer emits the actual
        // element count.
        let mut bytes = vec![0x08, 0x00, 0x00, 0x00, 0x09];
        bytes.extend_from_slice(&[0x00, 0x01, b'a', 0x05]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x09]);

        let mut decoder = Amf0Decoder::new(&bytes);
        let value = decoder.decode().unwrap();

        let mut encoded = Vec::new();
        Amf0Encoder::encode(&mut encoded, &value).unwrap();
        assert_eq!(&encoded[1..5], &[0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_date_bytes() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_date(&mut buf, 1_234_567, 500_000, -300).unwrap();

        let mut expected = vec![0x0b];
        expected.extend_from_slice(&1_234_567_500.0_f64.to_be_bytes());
        expected.extend_from_slice(&(-300_i16).to_be_bytes());
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_string_too_long() {
        let long = "x".repeat(u16::MAX as usize + 1);
        let mut buf = Vec::new();
        assert!(matches!(
            Amf0Encoder::encode_string(&mut buf, &long),
            Err(Amf0WriteError::StringTooLong(_))
        ));
    }

    #[test]
    fn test_empty_ecma_array_bytes() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_ecma_array(&mut buf, &[]).unwrap();
        assert_eq!(buf, vec![0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09]);
    }
}
