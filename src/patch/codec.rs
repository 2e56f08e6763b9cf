//! Storage encoding for rendered documents: gzip, then standard base64.

use crate::core::error::{MosaicError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

pub fn encode(html: &str) -> Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(html.as_bytes()).map_err(|e| encoding_error("gzip", &e))?;
    let compressed = encoder.finish().map_err(|e| encoding_error("gzip", &e))?;
    Ok(STANDARD.encode(compressed))
}

pub fn decode(encoded: &str) -> Result<String> {
    let compressed = STANDARD.decode(encoded.trim()).map_err(|e| encoding_error("base64", &e))?;
    let mut html = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut html)
        .map_err(|e| encoding_error("gunzip", &e))?;
    Ok(html)
}

fn encoding_error(stage: &str, error: &dyn std::fmt::Display) -> MosaicError {
    MosaicError::DocumentEncoding {
        reason: format!("{stage}: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let html = "<p>Tumour purity 74%</p>\n<span data-component-start=\"x\" />";
        let encoded = encode(html).unwrap();
        assert!(encoded.starts_with("H4sI"));
        assert_eq!(decode(&encoded).unwrap(), html);
    }

    #[test]
    fn test_invalid_base64() {
        let err = decode("not base64!").unwrap_err();
        assert!(matches!(err, MosaicError::DocumentEncoding { ref reason } if reason.starts_with("base64")));
    }

    #[test]
    fn test_valid_base64_but_not_gzip() {
        let err = decode(&STANDARD.encode("plain text")).unwrap_err();
        assert!(matches!(err, MosaicError::DocumentEncoding { ref reason } if reason.starts_with("gunzip")));
    }

    #[test]
    fn test_invalid_utf8_payload() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0xff, 0xfe, 0xfd]).unwrap();
        let encoded = STANDARD.encode(encoder.finish().unwrap());
        assert!(matches!(decode(&encoded), Err(MosaicError::DocumentEncoding { .. })));
    }
}
