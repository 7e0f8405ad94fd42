use std::fmt;

/// FLV `SoundFormat` values.
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Audio tags)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    Pcm = 0,
    Adpcm = 1,
    Mp3 = 2,
    PcmLe = 3,
    NellyMoser16kMono = 4,
    NellyMoser8kMono = 5,
    NellyMoser = 6,
    G711ALaw = 7,
    G711MuLaw = 8,
    Aac = 10,
    Speex = 11,
    Mp38k = 14,
}

impl TryFrom<u8> for SoundFormat {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(Self::Pcm),
            1 => Ok(Self::Adpcm),
            2 => Ok(Self::Mp3),
            3 => Ok(Self::PcmLe),
            4 => Ok(Self::NellyMoser16kMono),
            5 => Ok(Self::NellyMoser8kMono),
            6 => Ok(Self::NellyMoser),
            7 => Ok(Self::G711ALaw),
            8 => Ok(Self::G711MuLaw),
            10 => Ok(Self::Aac),
            11 => Ok(Self::Speex),
            14 => Ok(Self::Mp38k),
            other => Err(other),
        }
    }
}

impl fmt::Display for SoundFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pcm => "Uncompressed",
            Self::Adpcm => "ADPCM",
            Self::Mp3 => "MP3",
            Self::PcmLe => "Linear PCM (little endian)",
            Self::NellyMoser16kMono => "NellyMoser (16kHz Mono special case)",
            Self::NellyMoser8kMono => "NellyMoser (8kHz Mono special case)",
            Self::NellyMoser => "NellyMoser",
            Self::G711ALaw => "G.711 A-law log PCM",
            Self::G711MuLaw => "G.711 mu-law log PCM",
            Self::Aac => "AAC",
            Self::Speex => "Speex",
            Self::Mp38k => "MP3 8 kHz",
        };
        f.write_str(name)
    }
}

/// Decoded audio stream parameters from the one-byte tag prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioParams {
    /// Raw codec nibble; recorded in metadata even for codecs outside
    /// [`SoundFormat`].
    pub codec_id: u8,
    pub sample_rate: u32,
    pub sample_size: u32,
    pub stereo: bool,
}

impl AudioParams {
    /// Unpack the audio format byte: codec in the top nibble, rate index
    /// in bits 2-3, sample size in bit 1, stereo in bit 0. NellyMoser
    /// mono codecs override the packed fields wholesale.
    pub fn parse(format_byte: u8) -> Self {
        let codec_id = (format_byte >> 4) & 0x0F;

        let mut sample_rate = match (format_byte >> 2) & 0x03 {
            0 => 5500,
            1 => 11000,
            2 => 22000,
            _ => 44100,
        };
        let mut sample_size = if format_byte & 0x02 != 0 { 16 } else { 8 };
        let mut stereo = format_byte & 0x01 != 0;

        if codec_id == SoundFormat::NellyMoser16kMono as u8 {
            sample_rate = 16000;
            sample_size = 8;
            stereo = false;
        } else if codec_id == SoundFormat::NellyMoser8kMono as u8 {
            sample_rate = 8000;
            sample_size = 8;
            stereo = false;
        }

        Self {
            codec_id,
            sample_rate,
            sample_size,
            stereo,
        }
    }

    pub fn format(&self) -> Option<SoundFormat> {
        SoundFormat::try_from(self.codec_id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aac_stereo_44k() {
        // 0xAF: AAC, 44.1 kHz, 16-bit, stereo
        let params = AudioParams::parse(0xAF);
        assert_eq!(params.codec_id, 10);
        assert_eq!(params.sample_rate, 44100);
        assert_eq!(params.sample_size, 16);
        assert!(params.stereo);
        assert_eq!(params.format(), Some(SoundFormat::Aac));
    }

    #[test]
    fn test_mp3_22k_mono_8bit() {
        // 0x28: MP3, 22 kHz, 8-bit, mono
        let params = AudioParams::parse(0x28);
        assert_eq!(params.codec_id, 2);
        assert_eq!(params.sample_rate, 22000);
        assert_eq!(params.sample_size, 8);
        assert!(!params.stereo);
    }

    #[test]
    fn test_rate_indices() {
        assert_eq!(AudioParams::parse(0x00).sample_rate, 5500);
        assert_eq!(AudioParams::parse(0x04).sample_rate, 11000);
        assert_eq!(AudioParams::parse(0x08).sample_rate, 22000);
        assert_eq!(AudioParams::parse(0x0C).sample_rate, 44100);
    }

    #[test]
    fn test_nellymoser_overrides() {
        // Packed bits claim 44.1 kHz 16-bit stereo; the codec overrides.
        let params = AudioParams::parse(0x4F);
        assert_eq!(params.codec_id, 4);
        assert_eq!(params.sample_rate, 16000);
        assert_eq!(params.sample_size, 8);
        assert!(!params.stereo);

        let params = AudioParams::parse(0x5F);
        assert_eq!(params.sample_rate, 8000);
        assert_eq!(params.sample_size, 8);
        assert!(!params.stereo);
    }

    #[test]
    fn test_unknown_codec_keeps_raw_id() {
        let params = AudioParams::parse(0xC3);
        assert_eq!(params.codec_id, 12);
        assert_eq!(params.format(), None);
    }
}
