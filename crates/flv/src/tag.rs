use std::fmt;

use tracing::warn;

use crate::framing::{self, PREV_TAG_SIZE_FIELD_SIZE, TAG_HEADER_SIZE};
use crate::timestamp::TimestampRepairer;

/// FLV Tag Type
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - FLV tags)
///
/// The 3 types that are supported are:
/// - Audio(8)
/// - Video(9)
/// - ScriptData(18)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    Audio,
    Video,
    ScriptData,
    Unknown(u8),
}

impl From<u8> for FlvTagType {
    fn from(value: u8) -> Self {
        match value {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::ScriptData,
            _ => FlvTagType::Unknown(value),
        }
    }
}

impl From<FlvTagType> for u8 {
    fn from(value: FlvTagType) -> Self {
        match value {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::ScriptData => 18,
            FlvTagType::Unknown(val) => val,
        }
    }
}

impl fmt::Display for FlvTagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlvTagType::Audio => write!(f, "Audio"),
            FlvTagType::Video => write!(f, "Video"),
            FlvTagType::ScriptData => write!(f, "Script"),
            FlvTagType::Unknown(value) => write!(f, "Unknown({value})"),
        }
    }
}

/// One framed tag, borrowing its body from the input span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTag<'a> {
    pub tag_type: FlvTagType,
    /// Reconstructed 32-bit timestamp in milliseconds.
    pub timestamp_ms: u32,
    pub stream_id: u32,
    pub body: &'a [u8],
    /// Byte offset of the tag header within the input span.
    pub offset: usize,
}

impl RawTag<'_> {
    /// Keyframe flag for video tags (frame type 1 in the high nibble of
    /// the first body byte).
    pub fn is_key_frame(&self) -> bool {
        self.tag_type == FlvTagType::Video
            && self.body.first().is_some_and(|b| (b >> 4) & 0x0F == 1)
    }
}

/// The tag framing loop, shared by both processing passes.
///
/// Walks `[start, end)` of the input span yielding one [`RawTag`] per
/// framed tag, repairing timestamps through the supplied
/// [`TimestampRepairer`]. A tag whose body or trailer runs past the end
/// clamps the logical stream end at that tag's boundary, so a second walk
/// over `[start, end())` replays exactly the tags the first one accepted.
pub struct TagStream<'a, 'r> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    repairer: &'r mut TimestampRepairer,
}

impl<'a, 'r> TagStream<'a, 'r> {
    pub fn new(
        data: &'a [u8],
        start: usize,
        end: usize,
        repairer: &'r mut TimestampRepairer,
    ) -> Self {
        Self {
            data,
            pos: start,
            end: end.min(data.len()),
            repairer,
        }
    }

    /// The (possibly clamped) end of the logical tag stream.
    pub fn end(&self) -> usize {
        self.end
    }
}

impl<'a> Iterator for TagStream<'a, '_> {
    type Item = RawTag<'a>;

    fn next(&mut self) -> Option<RawTag<'a>> {
        if self.pos >= self.end {
            return None;
        }

        let remaining = self.end - self.pos;
        if remaining < TAG_HEADER_SIZE + PREV_TAG_SIZE_FIELD_SIZE {
            warn!(
                bytes = remaining,
                offset = self.pos,
                "extra junk at end of tag stream"
            );
            self.end = self.pos;
            return None;
        }

        let mut header_bytes = [0u8; TAG_HEADER_SIZE];
        header_bytes.copy_from_slice(&self.data[self.pos..self.pos + TAG_HEADER_SIZE]);
        let header = framing::parse_tag_header_bytes(header_bytes);

        let total = TAG_HEADER_SIZE + header.data_size as usize + PREV_TAG_SIZE_FIELD_SIZE;
        if self.pos + total > self.end {
            warn!(
                tag_type = %header.tag_type,
                length = header.data_size,
                offset = self.pos,
                "tag extends past the end of the file; truncating the stream here"
            );
            self.end = self.pos;
            return None;
        }

        let timestamp_ms =
            self.repairer
                .process(header.tag_type, header.timestamp_low, header.timestamp_high);

        let body_start = self.pos + TAG_HEADER_SIZE;
        let tag = RawTag {
            tag_type: header.tag_type,
            timestamp_ms,
            stream_id: header.stream_id,
            body: &self.data[body_start..body_start + header.data_size as usize],
            offset: self.pos,
        };

        self.pos += total;
        Some(tag)
    }
}
