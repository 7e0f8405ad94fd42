use std::fmt;

use time::OffsetDateTime;

use crate::Amf0WriteError;

/// AMF0 marker types.
/// Defined in amf0_spec_121207.pdf section 2.1
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum Amf0Marker {
    /// number-marker
    Number = 0x00,
    /// boolean-marker
    Boolean = 0x01,
    /// string-marker
    String = 0x02,
    /// object-marker
    Object = 0x03,
    /// movieclip-marker
    ///
    /// reserved, not supported
    MovieClipMarker = 0x04,
    /// null-marker
    Null = 0x05,
    /// undefined-marker
    Undefined = 0x06,
    /// reference-marker
    Reference = 0x07,
    /// ecma-array-marker
    EcmaArray = 0x08,
    /// object-end-marker
    ObjectEnd = 0x09,
    /// strict-array-marker
    StrictArray = 0x0a,
    /// date-marker
    Date = 0x0b,
    /// long-string-marker
    LongString = 0x0c,
    /// unsupported-marker
    Unsupported = 0x0d,
    /// recordset-marker
    ///
    /// reserved, not supported
    Recordset = 0x0e,
    /// xml-document-marker
    XmlDocument = 0x0f,
    /// typed-object-marker
    TypedObject = 0x10,
    /// avmplus-object-marker
    ///
    /// AMF3 marker
    AVMPlusObject = 0x11,
}

impl TryFrom<u8> for Amf0Marker {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(Self::Number),
            0x01 => Ok(Self::Boolean),
            0x02 => Ok(Self::String),
            0x03 => Ok(Self::Object),
            0x04 => Ok(Self::MovieClipMarker),
            0x05 => Ok(Self::Null),
            0x06 => Ok(Self::Undefined),
            0x07 => Ok(Self::Reference),
            0x08 => Ok(Self::EcmaArray),
            0x09 => Ok(Self::ObjectEnd),
            0x0a => Ok(Self::StrictArray),
            0x0b => Ok(Self::Date),
            0x0c => Ok(Self::LongString),
            0x0d => Ok(Self::Unsupported),
            0x0e => Ok(Self::Recordset),
            0x0f => Ok(Self::XmlDocument),
            0x10 => Ok(Self::TypedObject),
            0x11 => Ok(Self::AVMPlusObject),
            other => Err(other),
        }
    }
}

/// Insertion-ordered key/value list backing Object and EcmaArray.
///
/// Keys are unique; [`upsert`] keeps the earliest insertion slot when a key
/// is written again, and re-encoding walks the list in insertion order.
pub type Amf0Properties = Vec<(String, Amf0Value)>;

/// Insert or overwrite a key. An existing key keeps its slot.
pub fn upsert(properties: &mut Amf0Properties, key: impl Into<String>, value: Amf0Value) {
    let key = key.into();
    if let Some(slot) = properties.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        properties.push((key, value));
    }
}

/// Copy `from` into `into`. With `overwrite`, values in `from` replace
/// matching keys; otherwise keys already present are preserved. New keys
/// append at the end in `from` order.
pub fn merge_properties(into: &mut Amf0Properties, from: &[(String, Amf0Value)], overwrite: bool) {
    for (key, value) in from {
        if overwrite {
            upsert(into, key.clone(), value.clone());
        } else if !into.iter().any(|(k, _)| k == key) {
            into.push((key.clone(), value.clone()));
        }
    }
}

/// AMF0 value types.
/// Defined in amf0_spec_121207.pdf section 2.2-2.14
#[derive(PartialEq, Clone, Debug)]
pub enum Amf0Value {
    /// Number Type defined section 2.2
    Number(f64),
    /// Boolean Type defined section 2.3
    Boolean(bool),
    /// String Type defined section 2.4
    String(String),
    /// Object Type defined section 2.5
    Object(Amf0Properties),
    /// Null Type defined section 2.7
    Null,
    /// Undefined Type defined section 2.8
    Undefined,
    /// EcmaArray Type defined section 2.10
    ///
    /// The wire-level associative count is a hint only: it is ignored on
    /// decode and rewritten from the live element count on encode.
    EcmaArray(Amf0Properties),
    /// StrictArray Type defined section 2.12
    StrictArray(Vec<Amf0Value>),
    /// Date Type defined section 2.13
    ///
    /// Split into whole seconds and microseconds since the Unix epoch; the
    /// wire format is f64 milliseconds plus a minutes-west-of-UTC offset.
    Date {
        seconds: i64,
        micros: u32,
        minutes_west: i16,
    },
    /// Unsupported Type defined section 2.26
    Unsupported,
}

impl Amf0Value {
    /// Get the marker of the value.
    #[inline]
    pub fn marker(&self) -> Amf0Marker {
        match self {
            Self::Number(_) => Amf0Marker::Number,
            Self::Boolean(_) => Amf0Marker::Boolean,
            Self::String(_) => Amf0Marker::String,
            Self::Object(_) => Amf0Marker::Object,
            Self::Null => Amf0Marker::Null,
            Self::Undefined => Amf0Marker::Undefined,
            Self::EcmaArray(_) => Amf0Marker::EcmaArray,
            Self::StrictArray(_) => Amf0Marker::StrictArray,
            Self::Date { .. } => Amf0Marker::Date,
            Self::Unsupported => Amf0Marker::Unsupported,
        }
    }

    /// Numeric coercion of any variant, used by diagnostics.
    ///
    /// Containers coerce to their element count, strings to a nonempty
    /// flag, dates to seconds since the epoch.
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::String(s) => {
                if s.is_empty() {
                    0.0
                } else {
                    1.0
                }
            }
            Self::Object(o) | Self::EcmaArray(o) => o.len() as f64,
            Self::StrictArray(a) => a.len() as f64,
            Self::Date {
                seconds, micros, ..
            } => *seconds as f64 + *micros as f64 / 1_000_000.0,
            Self::Null | Self::Undefined | Self::Unsupported => 0.0,
        }
    }

    /// Boolean coercion of any variant.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Number(n) => n.abs() > f32::EPSILON as f64,
            Self::Boolean(b) => *b,
            Self::String(s) => !s.is_empty(),
            Self::Object(o) | Self::EcmaArray(o) => !o.is_empty(),
            Self::StrictArray(a) => !a.is_empty(),
            Self::Date { seconds, .. } => *seconds != 0,
            Self::Null | Self::Undefined | Self::Unsupported => false,
        }
    }

    /// Returns the inner string slice if this is a `String`, or `None`
    /// otherwise.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner property slice if this is an `Object` or
    /// `EcmaArray`, or `None` otherwise.
    #[inline]
    pub fn as_object_properties(&self) -> Option<&[(String, Amf0Value)]> {
        match self {
            Self::Object(o) | Self::EcmaArray(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the inner value slice if this is a `StrictArray`,
    /// or `None` otherwise.
    #[inline]
    pub fn as_array(&self) -> Option<&[Amf0Value]> {
        match self {
            Self::StrictArray(a) => Some(a),
            _ => None,
        }
    }

    /// Look up a key in a keyed container.
    pub fn get(&self, key: &str) -> Option<&Amf0Value> {
        self.as_object_properties()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Amf0Value> {
        match self {
            Self::Object(o) | Self::EcmaArray(o) => {
                o.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Merge another ECMA array into this one. Any other operand pairing
    /// fails with [`Amf0WriteError::TypeMismatch`].
    pub fn merge(&mut self, from: &Amf0Value, overwrite: bool) -> Result<(), Amf0WriteError> {
        let (Self::EcmaArray(into), Self::EcmaArray(from)) = (self, from) else {
            return Err(Amf0WriteError::TypeMismatch);
        };
        merge_properties(into, from, overwrite);
        Ok(())
    }
}

fn fmt_properties(f: &mut fmt::Formatter<'_>, properties: &[(String, Amf0Value)]) -> fmt::Result {
    f.write_str("{ \n")?;
    for (key, value) in properties {
        writeln!(f, "  {key}: {value}")?;
    }
    f.write_str("}")
}

impl fmt::Display for Amf0Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:.6}"),
            Self::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Self::String(s) => f.write_str(s),
            Self::Object(o) | Self::EcmaArray(o) => fmt_properties(f, o),
            Self::Null => f.write_str("NULL"),
            Self::Undefined => f.write_str("UNDEFINED"),
            Self::StrictArray(a) => {
                f.write_str("{ \n")?;
                for value in a {
                    writeln!(f, "  {value}")?;
                }
                f.write_str("}")
            }
            Self::Date {
                seconds,
                minutes_west,
                ..
            } => {
                // Render as UTC calendar time, shifted by the stored offset.
                let shifted = seconds - i64::from(*minutes_west) * 60;
                let formatted = OffsetDateTime::from_unix_timestamp(shifted)
                    .ok()
                    .and_then(|dt| {
                        let format = time::macros::format_description!(
                            "[weekday repr:short] [month repr:short] [day padding:space] \
                             [hour]:[minute]:[second] [year]"
                        );
                        dt.format(&format).ok()
                    });
                match formatted {
                    Some(s) => f.write_str(&s),
                    None => f.write_str("(invalid date)"),
                }
            }
            Self::Unsupported => f.write_str("UNSUPPORTED"),
        }
    }
}
