use bytes_util::ByteCursor;

use crate::error::FlvError;
use crate::framing::{FLV_HEADER_SIZE, PREV_TAG_SIZE_FIELD_SIZE};

// DataOffset is a 32-bit header length field. In practice it is 9 for
// standard FLV. Put a conservative bound to avoid walking off into a
// bogus header.
const MAX_DATA_OFFSET: u32 = 64 * 1024;

/// The 9-byte FLV file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlvHeader {
    // The version of the FLV file format, usually 0x01
    pub version: u8,
    // Whether the header flags claim audio data is present
    pub has_audio: bool,
    // Whether the header flags claim video data is present
    pub has_video: bool,
    // Total size of the header, always 0x09 for version 1 files
    pub data_offset: u32,
}

impl FlvHeader {
    /// Parses the FLV header from a byte cursor.
    ///
    /// Checks the `FLV` signature and the version byte, then advances the
    /// cursor past `data_offset` bytes so it rests at the
    /// `PreviousTagSize0` field. The flags byte is decoded, but callers
    /// rewriting a file recompute the flags from the actual tag stream
    /// since legacy muxers routinely get them wrong.
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self, FlvError> {
        let signature = cursor.get_bytes(3)?;
        if signature != b"FLV" {
            return Err(FlvError::InvalidSignature);
        }

        let version = cursor.get_u8()?;
        if version != 0x01 {
            return Err(FlvError::UnsupportedVersion(version));
        }

        let flags = cursor.get_u8()?;
        let has_audio = (flags & 0b0000_0100) != 0;
        let has_video = (flags & 0b0000_0001) != 0;

        let data_offset = cursor.get_u32_be()?;
        if data_offset < FLV_HEADER_SIZE as u32 || data_offset > MAX_DATA_OFFSET {
            return Err(FlvError::InvalidDataOffset(data_offset));
        }

        // Skip any extra header bytes.
        let extra = data_offset as usize - FLV_HEADER_SIZE;
        if extra > 0 {
            cursor.get_bytes(extra)?;
        }

        Ok(FlvHeader {
            version,
            has_audio,
            has_video,
            data_offset,
        })
    }
}

/// Encode the standard 9-byte header plus the zero `PreviousTagSize0`.
///
/// Only the standard 9-byte header is emitted; an extended input header
/// (DataOffset > 9) is canonicalized on write.
pub fn encode_header_bytes(
    has_audio: bool,
    has_video: bool,
) -> [u8; FLV_HEADER_SIZE + PREV_TAG_SIZE_FIELD_SIZE] {
    let mut out = [0u8; FLV_HEADER_SIZE + PREV_TAG_SIZE_FIELD_SIZE];

    // Signature: "FLV"
    out[0] = 0x46;
    out[1] = 0x4C;
    out[2] = 0x56;

    // Version
    out[3] = 0x01;

    // Flags: bit 2 = audio, bit 0 = video
    let mut flags = 0u8;
    if has_video {
        flags |= 0x01;
    }
    if has_audio {
        flags |= 0x04;
    }
    out[4] = flags;

    // DataOffset (BE u32)
    out[5..9].copy_from_slice(&(FLV_HEADER_SIZE as u32).to_be_bytes());

    // PreviousTagSize0 (BE u32) stays zero.
    out
}
