use std::io;

use amf0::{merge_properties, upsert, Amf0Encoder, Amf0Properties, Amf0Value, Amf0WriteError};
use flv::audio::AudioParams;
use flv::script::ScriptData;
use flv::video::{probe_resolution, VideoCodecId};
use flv::{FlvTagType, RawTag};
use time::OffsetDateTime;
use tracing::{info, warn};

pub const ON_METADATA: &str = "onMetaData";

const METADATA_CREATOR: &str = "flvhint";

/// Aggregate counters collected over the tag stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub has_audio: bool,
    pub has_video: bool,
    pub has_keyframes: bool,
    /// Audio body bytes, format byte included.
    pub total_audio: u64,
    /// Video body bytes, excluding the frame-type/codec byte.
    pub total_video: u64,
    pub vframe_count: u32,
    pub keyframe_count: u32,
    pub last_timestamp: u32,
}

/// Builds the `onMetaData` ECMA array over the two passes.
///
/// Keys keep their earliest insertion slot, so an existing metadata tag
/// merged at the top of the file pins the key order and a rerun over the
/// tool's own output stays byte-stable.
pub struct MetadataAssembler {
    stats: ScanStats,
    properties: Amf0Properties,
    merge_enabled: bool,
    have_audio_params: bool,
    have_video_params: bool,
}

impl MetadataAssembler {
    pub fn new(merge_enabled: bool) -> Self {
        Self {
            stats: ScanStats::default(),
            properties: Amf0Properties::new(),
            merge_enabled,
            have_audio_params: false,
            have_video_params: false,
        }
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    fn set(&mut self, key: &str, value: Amf0Value) {
        upsert(&mut self.properties, key, value);
    }

    pub fn analyze_tag(&mut self, tag: &RawTag<'_>) {
        match tag.tag_type {
            FlvTagType::Audio => self.analyze_audio_tag(tag),
            FlvTagType::Video => self.analyze_video_tag(tag),
            FlvTagType::ScriptData => self.analyze_script_tag(tag),
            FlvTagType::Unknown(tag_type) => warn!(
                tag_type,
                length = tag.body.len(),
                timestamp_ms = tag.timestamp_ms,
                offset = tag.offset,
                "skipping unknown tag type"
            ),
        }
    }

    fn analyze_audio_tag(&mut self, tag: &RawTag<'_>) {
        // Adobe FMS' Stream.record() sometimes generates zero size audio
        // tags at arbitrary positions; they carry nothing.
        if tag.body.is_empty() {
            info!(offset = tag.offset, "skipping zero size audio tag");
            return;
        }

        self.stats.has_audio = true;

        if !self.have_audio_params {
            self.have_audio_params = true;
            let params = AudioParams::parse(tag.body[0]);

            self.set("audiocodecid", Amf0Value::Number(params.codec_id.into()));
            self.set("audiosamplerate", Amf0Value::Number(params.sample_rate.into()));
            self.set("audiosamplesize", Amf0Value::Number(params.sample_size.into()));
            self.set("stereo", Amf0Value::Boolean(params.stereo));

            info!(
                "Audio: {}Hz {}bit {}, codec ID {} ({})",
                params.sample_rate,
                params.sample_size,
                if params.stereo { "stereo" } else { "mono" },
                params.codec_id,
                params
                    .format()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            );
        }

        self.stats.total_audio += tag.body.len() as u64;
    }

    fn analyze_video_tag(&mut self, tag: &RawTag<'_>) {
        self.stats.has_video = true;
        self.stats.vframe_count += 1;
        self.stats.total_video += (tag.body.len() as u64).saturating_sub(1);

        let Some(&first_byte) = tag.body.first() else {
            return;
        };
        let codec_id = first_byte & 0x0F;

        if tag.is_key_frame() {
            self.stats.has_keyframes = true;
            self.stats.keyframe_count += 1;
        }

        if !self.have_video_params {
            self.have_video_params = true;

            let resolution = probe_resolution(codec_id, &tag.body[1..]);
            let codec_name = VideoCodecId::try_from(codec_id)
                .map(|c| c.to_string())
                .unwrap_or_else(|_| "(unknown)".to_string());
            let (width, height) = resolution.map_or((0, 0), |r| (r.width, r.height));
            info!("Video: {width}x{height} {codec_name}");

            // The codec id is always recorded; zero dimensions are not.
            self.set("videocodecid", Amf0Value::Number(codec_id.into()));
            if width > 0 {
                self.set("width", Amf0Value::Number(width.into()));
            }
            if height > 0 {
                self.set("height", Amf0Value::Number(height.into()));
            }
        }
    }

    fn analyze_script_tag(&mut self, tag: &RawTag<'_>) {
        match ScriptData::parse(tag.body) {
            Ok(script) if script.name == ON_METADATA => {
                if !self.merge_enabled {
                    return;
                }
                match &script.value {
                    Amf0Value::EcmaArray(existing) => {
                        info!("merging existing onMetaData tag");
                        // Values already accumulated win; new keys append.
                        merge_properties(&mut self.properties, existing, false);
                    }
                    other => warn!(
                        marker = ?other.marker(),
                        "existing onMetaData payload is not an ECMA array; skipping merge"
                    ),
                }
            }
            Ok(script) => {
                info!("META tag (key {}):\n{}", script.name, script.value);
            }
            Err(e) => warn!("error reading metadata tag: {e}"),
        }
    }

    /// Install the computed summary keys. Values overwrite anything a
    /// merge brought in, but merged keys keep their slots.
    pub fn install_summary(&mut self, last_timestamp: u32) {
        self.stats.last_timestamp = last_timestamp;

        let duration = f64::from(last_timestamp) / 1000.0;
        let framerate = f64::from(self.stats.vframe_count) / duration;
        let videodatarate = (self.stats.total_video as f64 * 8.0 / 1000.0) / duration;
        let audiodatarate = (self.stats.total_audio as f64 * 8.0 / 1000.0) / duration;

        self.set("hasAudio", Amf0Value::Boolean(self.stats.has_audio));
        self.set("hasVideo", Amf0Value::Boolean(self.stats.has_video));
        self.set("hasCuePoints", Amf0Value::Boolean(false));
        self.set("hasMetadata", Amf0Value::Boolean(true));
        self.set("canSeekToEnd", Amf0Value::Boolean(true));
        self.set("duration", Amf0Value::Number(duration));
        self.set("framerate", Amf0Value::Number(framerate));
        self.set("videodatarate", Amf0Value::Number(videodatarate));
        self.set("audiodatarate", Amf0Value::Number(audiodatarate));
        self.set("videosize", Amf0Value::Number(self.stats.total_video as f64));
        self.set("audiosize", Amf0Value::Number(self.stats.total_audio as f64));
        self.set("hasKeyframes", Amf0Value::Boolean(self.stats.has_keyframes));
        self.set(
            "totalframes",
            Amf0Value::Number(f64::from(self.stats.vframe_count)),
        );
        self.set("lasttimestamp", Amf0Value::Number(duration));
        // Patched to the real output size after the tag copy.
        self.set("datasize", Amf0Value::Number(0.0));
    }

    /// Authoring keys and user overrides, output mode only. Manually set
    /// tags override everything generated so far.
    pub fn install_authoring(&mut self, extra_tags: &[(String, String)]) {
        self.set(
            "metadatacreator",
            Amf0Value::String(METADATA_CREATOR.to_string()),
        );
        let now = OffsetDateTime::now_utc();
        self.set(
            "metadatadate",
            Amf0Value::Date {
                seconds: now.unix_timestamp(),
                micros: now.microsecond(),
                minutes_west: 0,
            },
        );

        for (name, value) in extra_tags {
            self.set(name, Amf0Value::String(value.clone()));
        }
    }

    /// Pre-size the keyframe index so the encoded metadata length is
    /// fixed before the tag copy computes file positions against it.
    pub fn install_keyframe_index(&mut self) {
        let zeros = vec![Amf0Value::Number(0.0); self.stats.keyframe_count as usize];
        self.set(
            "keyframes",
            Amf0Value::Object(vec![
                ("times".to_string(), Amf0Value::StrictArray(zeros.clone())),
                ("filepositions".to_string(), Amf0Value::StrictArray(zeros)),
            ]),
        );
    }

    /// Fill one slot of the pre-sized index. A no-op when the metadata
    /// was stripped.
    pub fn set_keyframe_slot(&mut self, index: usize, time_s: f64, position: f64) {
        let Some((_, Amf0Value::Object(pairs))) = self
            .properties
            .iter_mut()
            .find(|(k, _)| k == "keyframes")
        else {
            return;
        };
        for (name, value) in pairs.iter_mut() {
            if let Amf0Value::StrictArray(slots) = value {
                if let Some(slot) = slots.get_mut(index) {
                    let filled = if name.as_str() == "times" { time_s } else { position };
                    *slot = Amf0Value::Number(filled);
                }
            }
        }
    }

    pub fn set_datasize(&mut self, datasize: f64) {
        self.set("datasize", Amf0Value::Number(datasize));
    }

    /// Drop every key, leaving an empty ECMA array to encode.
    pub fn strip(&mut self) {
        self.properties.clear();
    }

    pub fn encode_into<W: io::Write>(&self, writer: &mut W) -> Result<(), Amf0WriteError> {
        Amf0Encoder::encode_ecma_array(writer, &self.properties)
    }

    /// Render the accumulated metadata for the stdout dump.
    pub fn render(&self) -> String {
        let mut out = String::from("{ \n");
        for (key, value) in &self.properties {
            out.push_str(&format!("  {key}: {value}\n"));
        }
        out.push('}');
        out
    }
}
