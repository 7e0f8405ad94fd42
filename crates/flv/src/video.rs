use std::fmt;

use bytes_util::{BitCursor, ByteCursor};
use tracing::warn;

/// FLV `CodecID` values for video tags.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodecId {
    H263 = 2,
    ScreenVideo = 3,
    Vp6 = 4,
    Vp6Alpha = 5,
    ScreenVideo2 = 6,
    Avc = 7,
}

impl TryFrom<u8> for VideoCodecId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            2 => Ok(Self::H263),
            3 => Ok(Self::ScreenVideo),
            4 => Ok(Self::Vp6),
            5 => Ok(Self::Vp6Alpha),
            6 => Ok(Self::ScreenVideo2),
            7 => Ok(Self::Avc),
            other => Err(other),
        }
    }
}

impl fmt::Display for VideoCodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::H263 => "H.263",
            Self::ScreenVideo => "SCREEN",
            Self::Vp6 => "VP6",
            Self::Vp6Alpha => "VP6 (alpha)",
            Self::ScreenVideo2 => "SCREEN v2",
            Self::Avc => "H.264",
        };
        f.write_str(name)
    }
}

/// Intrinsic frame dimensions recovered from the first video tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Scrape width and height from the first video tag's payload (the body
/// minus its leading frame-type/codec byte).
///
/// Returns `None` whenever the payload is too short or uses a shape the
/// probe does not understand; the caller records the codec id either way
/// and simply omits the dimensions.
pub fn probe_resolution(codec_id: u8, payload: &[u8]) -> Option<Resolution> {
    match VideoCodecId::try_from(codec_id).ok()? {
        VideoCodecId::H263 => probe_h263(payload),
        VideoCodecId::ScreenVideo => probe_screen(payload),
        VideoCodecId::Vp6 => probe_vp6(payload),
        VideoCodecId::Avc => probe_avc(payload),
        VideoCodecId::Vp6Alpha | VideoCodecId::ScreenVideo2 => None,
    }
}

/// H.263 picture header. The dimension fields sit 30 bits in and cross
/// byte boundaries by a single bit, so everything goes through the bit
/// cursor.
fn probe_h263(payload: &[u8]) -> Option<Resolution> {
    let mut cursor = ByteCursor::new(payload);
    let mut bits = BitCursor::new(&mut cursor);

    // Picture start code, version, temporal reference.
    bits.get_bits(30).ok()?;

    let (width, height) = match bits.get_bits(3).ok()? {
        0 => (bits.get_bits(8).ok()?, bits.get_bits(8).ok()?),
        1 => (bits.get_bits(16).ok()?, bits.get_bits(16).ok()?),
        2 => (352, 288),
        3 => (176, 144),
        4 => (128, 96),
        5 => (320, 240),
        6 => (160, 120),
        _ => return None,
    };

    Some(Resolution { width, height })
}

/// Screen video: 12-bit width and height starting at a nibble offset.
/// Only the low nibble of the height is recovered here.
fn probe_screen(payload: &[u8]) -> Option<Resolution> {
    if payload.len() < 4 {
        return None;
    }

    let width = (u32::from(payload[0] & 0x0F) << 8) | u32::from(payload[1]);
    let height = u32::from(payload[3] & 0xF0) >> 4;

    Some(Resolution { width, height })
}

/// VP6: bytes 4 and 5 hold the displayed macroblock columns/rows, byte 0
/// packs two sub-macroblock adjustments subtracted from width (high
/// nibble) and height (low nibble).
fn probe_vp6(payload: &[u8]) -> Option<Resolution> {
    if payload.len() < 6 {
        return None;
    }

    let width = (u32::from(payload[4]) * 16).saturating_sub(u32::from(payload[0] >> 4));
    let height = (u32::from(payload[5]) * 16).saturating_sub(u32::from(payload[0] & 0x0F));

    Some(Resolution { width, height })
}

/// H.264: decode the sequence parameter set of a NALU packet.
///
/// Config records (`avc_packet_type` 0) and end-of-sequence markers carry
/// no decodable dimensions here.
fn probe_avc(payload: &[u8]) -> Option<Resolution> {
    let avc_packet_type = *payload.first()?;
    if avc_packet_type != 1 {
        return None;
    }

    let mut cursor = ByteCursor::new(payload.get(1..)?);
    // Composition time (SI24).
    cursor.get_bytes(3).ok()?;

    let mut avc = BitCursor::new(&mut cursor);

    if avc.get_bit().ok()? {
        warn!("AVC NAL header decode: forbidden_zero_bit is 1");
        return None;
    }
    avc.get_bits(2).ok()?; // nal_ref_idc
    let nal_unit_type = avc.get_bits(5).ok()?;
    if nal_unit_type != 7 {
        // need seq_parameter_set_rbsp
        return None;
    }

    let profile_idc = avc.get_bits(8).ok()?;
    avc.get_bits(8).ok()?; // constraint_set[0-3]_flag, reserved_zero_4bits
    avc.get_bits(8).ok()?; // level_idc

    avc.get_golomb_ue().ok()?; // seq_parameter_set_id

    if matches!(profile_idc, 100 | 110 | 122 | 144) {
        let chroma_format_idc = avc.get_golomb_ue().ok()?;
        if chroma_format_idc == 3 {
            avc.get_bit().ok()?; // residual_colour_transform_flag
        }
        avc.get_golomb_ue().ok()?; // bit_depth_luma_minus8
        avc.get_golomb_ue().ok()?; // bit_depth_chroma_minus8
        avc.get_bit().ok()?; // qpprime_y_zero_transform_bypass_flag
        if avc.get_bit().ok()? {
            warn!("seq_parameter_set_rbsp decode: scaling matrices are not handled");
            return None;
        }
    }

    avc.get_golomb_ue().ok()?; // log2_max_frame_num_minus4
    let pic_order_cnt_type = avc.get_golomb_ue().ok()?;

    if pic_order_cnt_type == 0 {
        avc.get_golomb_ue().ok()?; // log2_max_pic_order_cnt_lsb_minus4
    } else if pic_order_cnt_type == 1 {
        avc.get_bit().ok()?; // delta_pic_order_always_zero_flag
        avc.get_golomb_se().ok()?; // offset_for_non_ref_pic
        avc.get_golomb_se().ok()?; // offset_for_top_to_bottom_field
        let num_ref_frames_in_pic_order_cnt_cycle = avc.get_golomb_ue().ok()?;
        for _ in 0..num_ref_frames_in_pic_order_cnt_cycle {
            avc.get_golomb_se().ok()?;
        }
    }

    avc.get_golomb_ue().ok()?; // num_ref_frames
    avc.get_bit().ok()?; // gaps_in_frame_num_value_allowed_flag

    let pic_width_in_mbs = avc.get_golomb_ue().ok()? + 1;
    let pic_height_in_map_units = avc.get_golomb_ue().ok()? + 1;

    let frame_mbs_only = avc.get_bit().ok()?;
    if !frame_mbs_only {
        avc.get_bit().ok()?; // mb_adaptive_frame_field_flag
    }

    avc.get_bit().ok()?; // direct_8x8_inference_flag

    let (mut left, mut right, mut top, mut bottom) = (0u32, 0u32, 0u32, 0u32);
    if avc.get_bit().ok()? {
        left = avc.get_golomb_ue().ok()? * 2;
        right = avc.get_golomb_ue().ok()? * 2;
        top = avc.get_golomb_ue().ok()? * 2;
        bottom = avc.get_golomb_ue().ok()? * 2;
        if !frame_mbs_only {
            // Interlaced sources crop in frame lines, which are two map
            // unit lines each.
            top *= 2;
            bottom *= 2;
        }
    }

    let width = (pic_width_in_mbs * 16).saturating_sub(left + right);
    let mut height = (pic_height_in_map_units * 16).saturating_sub(top + bottom);
    if !frame_mbs_only {
        // Map units are twice as big as macroblocks for interlaced sources.
        height *= 2;
    }

    Some(Resolution { width, height })
}
