//! Text encoding of attached exports

use serde::{Deserialize, Serialize};

/// Text encoding attachments are converted to before sending
///
/// Exports are written as UTF-8. Older mail clients open CSV attachments as Latin-1, so
/// summaries are transcoded by default. The conversion is lossy: characters outside
/// Latin-1 and invalid UTF-8 sequences are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentEncoding {
    /// ISO-8859-1, dropping anything it cannot represent
    #[default]
    Latin1,
    /// UTF-8, attached verbatim
    Utf8,
}

impl AttachmentEncoding {
    /// Convert UTF-8 export bytes to this encoding
    #[must_use]
    pub fn transcode(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Self::Utf8 => bytes.to_vec(),
            Self::Latin1 => bytes
                .utf8_chunks()
                .flat_map(|chunk| chunk.valid().chars())
                .filter_map(|c| u8::try_from(c).ok())
                .collect(),
        }
    }

    /// MIME type of an attachment in this encoding
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Latin1 => "text/csv; charset=ISO-8859-1",
            Self::Utf8 => "text/csv; charset=UTF-8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_latin1_keeps_accents_and_drops_the_rest() {
        let out = AttachmentEncoding::Latin1.transcode("Zoë;€5;日本\n".as_bytes());
        assert_eq!(out, b"Zo\xeb;5;\n".to_vec());
    }

    #[test]
    fn test_latin1_drops_invalid_sequences() {
        let out = AttachmentEncoding::Latin1.transcode(b"a\xff\xfeb");
        assert_eq!(out, b"ab".to_vec());
    }

    #[test]
    fn test_utf8_is_verbatim() {
        let input = "Zoë €".as_bytes();
        assert_eq!(AttachmentEncoding::Utf8.transcode(input), input.to_vec());
    }

    #[test]
    fn test_config_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            encoding: AttachmentEncoding,
        }

        let parsed: Wrapper = toml::from_str(r#"encoding = "utf8""#).unwrap();
        assert_eq!(parsed.encoding, AttachmentEncoding::Utf8);
        let parsed: Wrapper = toml::from_str(r#"encoding = "latin1""#).unwrap();
        assert_eq!(parsed.encoding, AttachmentEncoding::Latin1);
    }

    proptest! {
        #[test]
        fn latin1_text_survives_transcoding(text in "[\\x00-\\xff]*") {
            let out = AttachmentEncoding::Latin1.transcode(text.as_bytes());
            let decoded: String = out.iter().map(|b| char::from(*b)).collect();
            prop_assert_eq!(decoded, text);
        }

        #[test]
        fn latin1_output_is_the_representable_subsequence(text in "\\PC*") {
            let out = AttachmentEncoding::Latin1.transcode(text.as_bytes());
            let expected: Vec<u8> = text.chars().filter_map(|c| u8::try_from(c).ok()).collect();
            prop_assert_eq!(out, expected);
        }

        #[test]
        fn latin1_never_panics_on_arbitrary_bytes(
            bytes in proptest::collection::vec(any::<u8>(), 0..256)
        ) {
            let out = AttachmentEncoding::Latin1.transcode(&bytes);
            prop_assert!(out.len() <= bytes.len());
        }
    }
}
