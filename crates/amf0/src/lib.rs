mod decode;
mod define;
mod encode;
mod error;

pub use decode::Amf0Decoder;
pub use define::{merge_properties, upsert, Amf0Marker, Amf0Properties, Amf0Value};
pub use encode::Amf0Encoder;
pub use error::{Amf0ReadError, Amf0WriteError};
