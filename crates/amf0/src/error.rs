use std::io;

use bytes_util::EndOfBuffer;

use crate::Amf0Marker;

#[derive(Debug, thiserror::Error)]
pub enum Amf0ReadError {
    #[error(transparent)]
    EndOfBuffer(#[from] EndOfBuffer),
    #[error("unknown AMF0 marker byte 0x{0:02x}")]
    UnknownMarker(u8),
    #[error("unsupported AMF0 type {0:?}")]
    UnsupportedType(Amf0Marker),
    #[error("string is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Amf0WriteError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("string length {0} exceeds the u16 wire limit")]
    StringTooLong(usize),
    #[error("merge requires ECMA array operands")]
    TypeMismatch,
}
