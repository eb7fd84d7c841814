//! Content-based text/binary classification.

/// How a template file's bytes are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClassification {
    /// The whole content is valid UTF-8.
    Text,
    /// At least one byte sequence is not valid UTF-8; the file is opaque.
    Binary,
}

/// Classifies file content as [`FileClassification::Text`] or [`FileClassification::Binary`].
///
/// Only the bytes decide: extensions and byte-order marks are ignored, and a single
/// invalid sequence anywhere in the content makes the whole file binary.
/// Empty content is text.
pub fn classify(content: &[u8]) -> FileClassification {
    match as_text(content) {
        Some(_) => FileClassification::Text,
        None => FileClassification::Binary,
    }
}

/// Returns the content as text when it classifies as [`FileClassification::Text`].
pub fn as_text(content: &[u8]) -> Option<&str> {
    std::str::from_utf8(content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_is_text() {
        assert_eq!(classify(b""), FileClassification::Text);
    }

    #[test]
    fn test_utf8_content_is_text() {
        assert_eq!(classify("héllo {{ name }}\r\n".as_bytes()), FileClassification::Text);
        // NUL is valid UTF-8
        assert_eq!(classify(b"a\0b"), FileClassification::Text);
    }

    #[test]
    fn test_invalid_byte_anywhere_is_binary() {
        let mut content = "plain text ".repeat(4096).into_bytes();
        content.push(0xff);
        assert_eq!(classify(&content), FileClassification::Binary);

        assert_eq!(classify(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a]), FileClassification::Binary);
    }

    #[test]
    fn test_truncated_multibyte_sequence_is_binary() {
        let bytes = "é".as_bytes();
        assert_eq!(classify(&bytes[..1]), FileClassification::Binary);
    }
}
