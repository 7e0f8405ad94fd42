use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use amf0::{Amf0Encoder, Amf0WriteError};
use byteorder::{BigEndian, WriteBytesExt};
use flv::framing::{PREV_TAG_SIZE_FIELD_SIZE, TAG_HEADER_SIZE};
use flv::header::encode_header_bytes;
use flv::script::ScriptData;
use flv::{FlvError, FlvHeader, FlvTagType, TagStream, TimestampRepairer};
use bytes_util::ByteCursor;
use tracing::{info, warn};

use crate::metadata::{MetadataAssembler, ON_METADATA};
use crate::mmap::InputMap;
use crate::sink::OutputSink;

#[derive(Debug, thiserror::Error)]
pub enum HintError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Flv(#[from] FlvError),
    #[error(transparent)]
    Amf0Write(#[from] Amf0WriteError),
    #[error("metadata re-encode changed size (expected {expected} bytes, got {got})")]
    MetadataSizeChanged { expected: u64, got: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct HintOptions {
    /// Suppress the final metadata dump on stdout.
    pub nodump: bool,
    /// Do not merge an existing `onMetaData` tag from the input.
    pub nomerge: bool,
    /// Do not copy non-`onMetaData` script tags to the output.
    pub nometapackets: bool,
    /// Emit an empty `onMetaData`; implies `nometapackets`.
    pub strip: bool,
    /// String-typed metadata overrides, applied last.
    pub tags: Vec<(String, String)>,
}

/// Run the tool: scan `input_path` and, when `output_path` is given,
/// rewrite it there with regenerated metadata. Without an output path the
/// computed metadata is printed instead.
pub fn process(
    input_path: &Path,
    output_path: Option<&Path>,
    options: &HintOptions,
) -> Result<(), HintError> {
    let input = InputMap::open(input_path)?;
    let data = input.as_slice();

    let minimum = flv::framing::FLV_HEADER_SIZE + PREV_TAG_SIZE_FIELD_SIZE;
    if data.len() < minimum {
        return Err(FlvError::TooShort {
            needed: minimum,
            got: data.len(),
        }
        .into());
    }

    let mut cursor = ByteCursor::new(data);
    let header = FlvHeader::parse(&mut cursor)?;
    // Tags start after the header and the zero PreviousTagSize0 field.
    let stream_start = header.data_offset as usize + PREV_TAG_SIZE_FIELD_SIZE;

    // Pass 1: accumulate statistics and probe stream parameters.
    let mut repairer = TimestampRepairer::new();
    let mut assembler = MetadataAssembler::new(!options.nomerge);

    let mut stream = TagStream::new(data, stream_start, data.len(), &mut repairer);
    for tag in &mut stream {
        assembler.analyze_tag(&tag);
    }
    let stream_end = stream.end();
    assembler.install_summary(repairer.last_timestamp());

    let Some(output_path) = output_path else {
        println!("{}", assembler.render());
        return Ok(());
    };

    assembler.install_authoring(&options.tags);
    assembler.install_keyframe_index();
    if options.strip {
        assembler.strip();
    }

    // Pass 2: write to a temporary file, renamed into place at the end
    // so the output may safely alias the input.
    let tmp_path = tmp_path_for(output_path);
    let stats = *assembler.stats();
    let mut sink = OutputSink::create(&tmp_path)?;

    sink.write_all(&encode_header_bytes(stats.has_audio, stats.has_video))?;

    // Script tag header with a zeroed length, backpatched once the
    // payload size is known.
    sink.write_u8(u8::from(FlvTagType::ScriptData))?;
    let length_field_offset = sink.tell();
    sink.write_all(&[0; 3])?; // body length
    sink.write_all(&[0; 4])?; // timestamp + extension
    sink.write_all(&[0; 3])?; // stream id

    let payload_start = sink.tell();
    Amf0Encoder::encode_string(&mut sink, ON_METADATA)?;
    let array_offset = sink.tell();
    assembler.encode_into(&mut sink)?;
    let payload_len = sink.tell() - payload_start;
    let first_encode_len = sink.tell() - array_offset;

    sink.write_u32::<BigEndian>((TAG_HEADER_SIZE as u64 + payload_len) as u32)?;
    let tag_stream_offset = sink.tell();

    sink.seek(length_field_offset)?;
    sink.write_u24::<BigEndian>(payload_len as u32)?;
    sink.seek(tag_stream_offset)?;

    // Copy tags, recording where each keyframe lands in the output.
    let nometapackets = options.nometapackets || options.strip;
    repairer.rewind();
    let mut keyframe_slot = 0usize;

    for tag in TagStream::new(data, stream_start, stream_end, &mut repairer) {
        let copy = match tag.tag_type {
            FlvTagType::Video => true,
            FlvTagType::Audio => !tag.body.is_empty(),
            FlvTagType::ScriptData => {
                // The rewritten header replaces the input's onMetaData.
                !nometapackets
                    && ScriptData::parse_name(tag.body).as_deref() != Some(ON_METADATA)
            }
            FlvTagType::Unknown(tag_type) => {
                warn!(
                    tag_type,
                    length = tag.body.len(),
                    timestamp_ms = tag.timestamp_ms,
                    offset = tag.offset,
                    "skipping unknown tag type"
                );
                false
            }
        };

        if !copy {
            continue;
        }

        if tag.is_key_frame() {
            assembler.set_keyframe_slot(
                keyframe_slot,
                f64::from(tag.timestamp_ms) / 1000.0,
                sink.tell() as f64,
            );
            keyframe_slot += 1;
        }

        sink.write_all(&flv::framing::encode_tag_header_bytes(
            tag.tag_type,
            tag.body.len() as u32,
            tag.timestamp_ms,
            tag.stream_id,
        ))?;
        // Body plus the trailing PreviousTagSize field, verbatim from
        // the input.
        let body_start = tag.offset + TAG_HEADER_SIZE;
        let trailer_end = body_start + tag.body.len() + PREV_TAG_SIZE_FIELD_SIZE;
        sink.write_all(&data[body_start..trailer_end])?;
    }

    // Regenerate the metadata in place: the keyframe index is filled in
    // and datasize becomes the final output size.
    if !options.strip {
        assembler.set_datasize(sink.tell() as f64);
    }
    sink.seek(array_offset)?;
    assembler.encode_into(&mut sink)?;

    let second_encode_len = sink.tell() - array_offset;
    if second_encode_len != first_encode_len {
        return Err(HintError::MetadataSizeChanged {
            expected: first_encode_len,
            got: second_encode_len,
        });
    }

    sink.finish()?;
    drop(input);
    fs::rename(&tmp_path, output_path)?;

    let duration = f64::from(stats.last_timestamp) / 1000.0;
    info!(
        "Total: {} video bytes, {} audio bytes, {:.3} seconds long",
        stats.total_video, stats.total_audio, duration
    );

    if !options.nodump {
        println!("Final onMetaData tag contents: {}", assembler.render());
    }

    Ok(())
}

fn tmp_path_for(output_path: &Path) -> PathBuf {
    let mut tmp = OsString::from(output_path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
