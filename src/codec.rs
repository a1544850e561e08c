/// Image embedding codec
///
/// Turns a picked image file into a self-describing inline data URL
/// (`data:<mime>;base64,<payload>`) that can be stored directly on a
/// recipe record. The size ceiling is checked against the raw file
/// bytes before any encoding happens, so the base64 overhead never
/// counts against the limit.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::Path;
use thiserror::Error;

use crate::state::data::InlineImage;

/// Failures while turning a file into an inline image
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The file could not be read at all
    #[error("failed to read image file: {0}")]
    Read(String),
    /// The raw file is larger than the backend ceiling
    #[error("image is too large ({size} bytes, limit is {limit})")]
    TooLarge { size: usize, limit: usize },
    /// The magic bytes match no known image format
    #[error("unrecognized image format")]
    UnknownFormat,
}

/// Read a file and encode it as an inline data URL.
///
/// `limit` is the backend's image ceiling in bytes, enforced on the
/// original file length before encoding.
pub fn read_as_data_url(path: &Path, limit: usize) -> Result<InlineImage, CodecError> {
    let bytes = std::fs::read(path).map_err(|e| CodecError::Read(e.to_string()))?;
    if bytes.len() > limit {
        return Err(CodecError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }

    // Sniff the format from the magic bytes; the file extension lies
    // often enough that we never trust it.
    let format = image::guess_format(&bytes).map_err(|_| CodecError::UnknownFormat)?;
    let mime = format.to_mime_type();

    Ok(InlineImage {
        data_url: format!("data:{mime};base64,{}", BASE64.encode(&bytes)),
        source_len: bytes.len(),
    })
}

/// Recover the raw bytes from an inline data URL.
///
/// Returns `None` for anything that is not a base64 data URL; callers
/// treat that as "no thumbnail" rather than an error.
pub fn decode_data_url(data_url: &str) -> Option<Vec<u8>> {
    let rest = data_url.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    BASE64.decode(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// PNG magic followed by filler; `guess_format` only looks at the
    /// signature bytes.
    fn fake_png(len: usize) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.resize(len, 0xAB);
        bytes
    }

    #[test]
    fn test_encode_produces_a_png_data_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("glass.png");
        std::fs::write(&path, fake_png(64)).unwrap();

        let image = read_as_data_url(&path, 1024).unwrap();
        assert!(image.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(image.source_len, 64);
    }

    #[test]
    fn test_decode_round_trips_the_original_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("glass.png");
        let original = fake_png(100);
        std::fs::write(&path, &original).unwrap();

        let image = read_as_data_url(&path, 1024).unwrap();
        assert_eq!(decode_data_url(&image.data_url), Some(original));
    }

    #[test]
    fn test_size_ceiling_is_checked_before_encoding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, fake_png(2000)).unwrap();

        assert_eq!(
            read_as_data_url(&path, 1999),
            Err(CodecError::TooLarge {
                size: 2000,
                limit: 1999
            })
        );
        // Exactly at the limit is fine even though the encoded string
        // is a third longer.
        assert!(read_as_data_url(&path, 2000).is_ok());
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = read_as_data_url(&dir.path().join("nope.png"), 1024).unwrap_err();
        assert!(matches!(err, CodecError::Read(_)));
    }

    #[test]
    fn test_garbage_bytes_are_an_unknown_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"just some text").unwrap();

        assert_eq!(read_as_data_url(&path, 1024), Err(CodecError::UnknownFormat));
    }

    #[test]
    fn test_decode_rejects_non_data_urls() {
        assert_eq!(decode_data_url("https://example.com/x.png"), None);
        assert_eq!(decode_data_url("data:image/png,plain"), None);
        assert_eq!(decode_data_url(""), None);
    }
}
