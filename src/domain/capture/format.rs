//! Audio format value object and the format -> file extension table

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidFormatError;

/// Build a four-character format code (big-endian, as written)
pub const fn fourcc(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

/// Render a format code as its four characters, or hex when not printable
pub fn fourcc_to_string(code: u32) -> String {
    let bytes = code.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        bytes.iter().map(|&b| b as char).collect()
    } else {
        format!("0x{:08x}", code)
    }
}

/// Encoded audio formats a recording can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Aac,
    LinearPcm,
    Mp3,
    AppleLossless,
    Opus,
    Ac3,
    Flac,
    Amr,
    Midi,
    ULaw,
    ALaw,
    AmrWb,
    EnhancedAc3,
    Ilbc,
}

/// All recognized formats, in table order
pub const ALL_FORMATS: &[AudioFormat] = &[
    AudioFormat::Aac,
    AudioFormat::LinearPcm,
    AudioFormat::Mp3,
    AudioFormat::AppleLossless,
    AudioFormat::Opus,
    AudioFormat::Ac3,
    AudioFormat::Flac,
    AudioFormat::Amr,
    AudioFormat::Midi,
    AudioFormat::ULaw,
    AudioFormat::ALaw,
    AudioFormat::AmrWb,
    AudioFormat::EnhancedAc3,
    AudioFormat::Ilbc,
];

impl AudioFormat {
    /// Four-character format code
    pub const fn code(&self) -> u32 {
        match self {
            Self::Aac => fourcc(b"aac "),
            Self::LinearPcm => fourcc(b"lpcm"),
            Self::Mp3 => fourcc(b".mp3"),
            Self::AppleLossless => fourcc(b"alac"),
            Self::Opus => fourcc(b"opus"),
            Self::Ac3 => fourcc(b"ac-3"),
            Self::Flac => fourcc(b"flac"),
            Self::Amr => fourcc(b"samr"),
            Self::Midi => fourcc(b"midi"),
            Self::ULaw => fourcc(b"ulaw"),
            Self::ALaw => fourcc(b"alaw"),
            Self::AmrWb => fourcc(b"sawb"),
            Self::EnhancedAc3 => fourcc(b"ec-3"),
            Self::Ilbc => fourcc(b"ilbc"),
        }
    }

    /// Look up a format by its code
    pub fn from_code(code: u32) -> Option<Self> {
        ALL_FORMATS.iter().copied().find(|f| f.code() == code)
    }

    /// File extension (with leading dot) used for files of this format
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Aac => ".aac",
            Self::LinearPcm => ".wav",
            Self::Mp3 => ".mp3",
            Self::AppleLossless => ".m4a",
            Self::Opus => ".opus",
            Self::Ac3 => ".ac3",
            Self::Flac => ".flac",
            Self::Amr => ".amr",
            Self::Midi => ".midi",
            Self::ULaw => ".ulaw",
            Self::ALaw => ".alaw",
            Self::AmrWb => ".awb",
            Self::EnhancedAc3 => ".eac3",
            Self::Ilbc => ".ilbc",
        }
    }

    /// Find the format a file extension belongs to (with or without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        ALL_FORMATS
            .iter()
            .copied()
            .find(|f| f.extension().trim_start_matches('.') == ext)
    }

    /// MIME type for uploading files of this format
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Aac => "audio/aac",
            Self::LinearPcm => "audio/wav",
            Self::Mp3 => "audio/mp3",
            Self::AppleLossless => "audio/mp4",
            Self::Opus => "audio/ogg",
            Self::Ac3 => "audio/ac3",
            Self::Flac => "audio/flac",
            Self::Amr => "audio/amr",
            Self::Midi => "audio/midi",
            Self::ULaw => "audio/basic",
            Self::ALaw => "audio/x-alaw-basic",
            Self::AmrWb => "audio/amr-wb",
            Self::EnhancedAc3 => "audio/eac3",
            Self::Ilbc => "audio/ilbc",
        }
    }

    /// Short name used in config files and on the command line
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::LinearPcm => "lpcm",
            Self::Mp3 => "mp3",
            Self::AppleLossless => "alac",
            Self::Opus => "opus",
            Self::Ac3 => "ac3",
            Self::Flac => "flac",
            Self::Amr => "amr",
            Self::Midi => "midi",
            Self::ULaw => "ulaw",
            Self::ALaw => "alaw",
            Self::AmrWb => "amr-wb",
            Self::EnhancedAc3 => "eac3",
            Self::Ilbc => "ilbc",
        }
    }

    /// Human-readable label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Aac => "MPEG-4 AAC",
            Self::LinearPcm => "Linear PCM",
            Self::Mp3 => "MPEG Layer 3",
            Self::AppleLossless => "Apple Lossless",
            Self::Opus => "Opus",
            Self::Ac3 => "AC-3",
            Self::Flac => "FLAC",
            Self::Amr => "AMR",
            Self::Midi => "MIDI stream",
            Self::ULaw => "G.711 u-law",
            Self::ALaw => "G.711 a-law",
            Self::AmrWb => "AMR wideband",
            Self::EnhancedAc3 => "Enhanced AC-3",
            Self::Ilbc => "iLBC",
        }
    }
}

/// Extension for a raw format code; `None` for codes outside the table
pub fn extension_for_code(code: u32) -> Option<&'static str> {
    AudioFormat::from_code(code).map(|f| f.extension())
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::LinearPcm
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = InvalidFormatError;

    /// Accepts the short name, the extension, or the four-character code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();

        let by_name = match input.as_str() {
            "pcm" | "linear_pcm" | "wav" => Some(Self::LinearPcm),
            "m4a" | "apple_lossless" => Some(Self::AppleLossless),
            "awb" | "amr_wb" => Some(Self::AmrWb),
            "ac-3" => Some(Self::Ac3),
            "ec-3" => Some(Self::EnhancedAc3),
            _ => ALL_FORMATS.iter().copied().find(|f| f.as_str() == input),
        };

        by_name
            .or_else(|| Self::from_extension(&input))
            .or_else(|| {
                let bytes = s.as_bytes();
                if bytes.len() == 4 {
                    Self::from_code(fourcc(&[bytes[0], bytes[1], bytes[2], bytes[3]]))
                } else {
                    None
                }
            })
            .ok_or_else(|| InvalidFormatError {
                input: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table_matches() {
        let expected = [
            (AudioFormat::Aac, ".aac"),
            (AudioFormat::LinearPcm, ".wav"),
            (AudioFormat::Mp3, ".mp3"),
            (AudioFormat::AppleLossless, ".m4a"),
            (AudioFormat::Opus, ".opus"),
            (AudioFormat::Ac3, ".ac3"),
            (AudioFormat::Flac, ".flac"),
            (AudioFormat::Amr, ".amr"),
            (AudioFormat::Midi, ".midi"),
            (AudioFormat::ULaw, ".ulaw"),
            (AudioFormat::ALaw, ".alaw"),
            (AudioFormat::AmrWb, ".awb"),
            (AudioFormat::EnhancedAc3, ".eac3"),
            (AudioFormat::Ilbc, ".ilbc"),
        ];
        assert_eq!(ALL_FORMATS.len(), 14);
        for (format, ext) in expected {
            assert_eq!(format.extension(), ext);
            assert_eq!(extension_for_code(format.code()), Some(ext));
        }
    }

    #[test]
    fn codes_are_unique() {
        for (i, a) in ALL_FORMATS.iter().enumerate() {
            for b in &ALL_FORMATS[i + 1..] {
                assert_ne!(a.code(), b.code(), "{} and {} share a code", a, b);
            }
        }
    }

    #[test]
    fn unknown_code_has_no_extension() {
        assert_eq!(extension_for_code(0), None);
        assert_eq!(extension_for_code(fourcc(b"zzzz")), None);
        assert_eq!(AudioFormat::from_code(fourcc(b"AAC ")), None);
    }

    #[test]
    fn fourcc_round_trip_display() {
        assert_eq!(fourcc_to_string(AudioFormat::Aac.code()), "aac ");
        assert_eq!(fourcc_to_string(AudioFormat::Mp3.code()), ".mp3");
        assert_eq!(fourcc_to_string(1), "0x00000001");
    }

    #[test]
    fn parse_names_extensions_and_codes() {
        assert_eq!("aac".parse::<AudioFormat>().unwrap(), AudioFormat::Aac);
        assert_eq!("WAV".parse::<AudioFormat>().unwrap(), AudioFormat::LinearPcm);
        assert_eq!(".m4a".parse::<AudioFormat>().unwrap(), AudioFormat::AppleLossless);
        assert_eq!("sawb".parse::<AudioFormat>().unwrap(), AudioFormat::AmrWb);
        assert_eq!("amr-wb".parse::<AudioFormat>().unwrap(), AudioFormat::AmrWb);
        assert!("vorbis".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn from_extension_ignores_dot_and_case() {
        assert_eq!(AudioFormat::from_extension("FLAC"), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::from_extension(".awb"), Some(AudioFormat::AmrWb));
        assert_eq!(AudioFormat::from_extension("ogg"), None);
    }
}
