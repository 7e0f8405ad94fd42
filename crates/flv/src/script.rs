use amf0::{Amf0Decoder, Amf0ReadError, Amf0Value};

/// A decoded script (type 18) tag body: an AMF0 string key followed by
/// one AMF0 value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptData {
    pub name: String,
    pub value: Amf0Value,
}

impl ScriptData {
    pub fn parse(body: &[u8]) -> Result<Self, Amf0ReadError> {
        let mut decoder = Amf0Decoder::new(body);

        // Tolerate a non-string key by falling back to its rendering, so
        // a malformed tag still gets reported under some name.
        let name = match decoder.decode()? {
            Amf0Value::String(s) => s,
            other => other.to_string(),
        };
        let value = decoder.decode()?;

        Ok(ScriptData { name, value })
    }

    /// Decode just the leading key of a script tag body.
    pub fn parse_name(body: &[u8]) -> Option<String> {
        let mut decoder = Amf0Decoder::new(body);
        match decoder.decode().ok()? {
            Amf0Value::String(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amf0::Amf0Encoder;

    fn on_meta_data_body() -> Vec<u8> {
        let mut body = Vec::new();
        Amf0Encoder::encode_string(&mut body, "onMetaData").unwrap();
        Amf0Encoder::encode_ecma_array(
            &mut body,
            &[("duration".into(), Amf0Value::Number(12.0))],
        )
        .unwrap();
        body
    }

    #[test]
    fn test_parse_on_meta_data() {
        let body = on_meta_data_body();
        let script = ScriptData::parse(&body).unwrap();
        assert_eq!(script.name, "onMetaData");
        assert_eq!(
            script.value.get("duration"),
            Some(&Amf0Value::Number(12.0))
        );
    }

    #[test]
    fn test_parse_name_only() {
        let body = on_meta_data_body();
        assert_eq!(ScriptData::parse_name(&body).as_deref(), Some("onMetaData"));
        assert_eq!(ScriptData::parse_name(&[0x00, 0x01]), None);
    }

    #[test]
    fn test_truncated_body_errors() {
        let mut body = on_meta_data_body();
        body.truncate(5);
        assert!(ScriptData::parse(&body).is_err());
    }
}
