use bytes_util::EndOfBuffer;

#[derive(Debug, thiserror::Error)]
pub enum FlvError {
    #[error("input too short to contain a valid FLV header (need {needed} bytes, got {got})")]
    TooShort { needed: usize, got: usize },
    #[error("invalid FLV signature")]
    InvalidSignature,
    #[error("unsupported FLV version: {0}")]
    UnsupportedVersion(u8),
    #[error("invalid FLV data offset: {0}")]
    InvalidDataOffset(u32),
    #[error(transparent)]
    EndOfBuffer(#[from] EndOfBuffer),
}
