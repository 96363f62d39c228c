use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

use crate::error::{Result, VerifyError};

/// Image bytes as the model API expects them: base64 text plus media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Splits a `data:<mediatype>;base64,<data>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| VerifyError::invalid_image("expected a data: URI"))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| VerifyError::invalid_image("data URI has no payload"))?;
        let mime_type = header.split(';').next().unwrap_or_default().trim();

        if mime_type.is_empty() {
            return Err(VerifyError::invalid_image("data URI has no media type"));
        }
        if !header.split(';').skip(1).any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(VerifyError::invalid_image("data URI is not base64 encoded"));
        }
        if data.is_empty() {
            return Err(VerifyError::invalid_image("data URI payload is empty"));
        }

        Ok(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Reads and encodes an image file, inferring the media type from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime_type = mime_for_path(path).ok_or_else(|| {
            VerifyError::invalid_image(format!("unsupported image type: {}", path.display()))
        })?;
        let bytes = std::fs::read(path)
            .map_err(|e| VerifyError::invalid_image(format!("{}: {e}", path.display())))?;
        if bytes.is_empty() {
            return Err(VerifyError::invalid_image(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(Self {
            mime_type: mime_type.to_string(),
            data: STANDARD.encode(bytes),
        })
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// One user submission. Built per call and dropped once sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub text: String,
    pub image: Option<InlineImage>,
}

impl VerificationRequest {
    /// Rejects submissions with neither non-blank text nor an image.
    pub fn new(text: impl Into<String>, image: Option<InlineImage>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() && image.is_none() {
            return Err(VerifyError::EmptySubmission);
        }
        Ok(Self { text, image })
    }

    /// Convenience for callers holding the browser's data URI.
    pub fn from_parts(text: impl Into<String>, image_uri: Option<&str>) -> Result<Self> {
        let image = image_uri
            .filter(|uri| !uri.trim().is_empty())
            .map(InlineImage::from_data_uri)
            .transpose()?;
        Self::new(text, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_data_uri_splits_mime_and_payload() {
        let image = InlineImage::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_from_data_uri_rejects_malformed() {
        for uri in [
            "image/png;base64,abc",
            "data:image/png;base64",
            "data:;base64,abc",
            "data:image/png,abc",
            "data:image/png;base64,",
        ] {
            let err = InlineImage::from_data_uri(uri).unwrap_err();
            assert!(err.is_user_input(), "{uri} should be rejected");
        }
    }

    #[test]
    fn test_from_path_encodes_file() {
        let mut file = tempfile::Builder::new().suffix(".JPG").tempfile().unwrap();
        file.write_all(b"\xff\xd8\xff\xe0").unwrap();

        let image = InlineImage::from_path(file.path()).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/4A==");
    }

    #[test]
    fn test_from_path_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(InlineImage::from_path(file.path()).is_err());
    }

    #[test]
    fn test_request_requires_content() {
        assert!(matches!(
            VerificationRequest::new("   \n", None),
            Err(VerifyError::EmptySubmission)
        ));
        assert!(VerificationRequest::from_parts("", Some("data:image/gif;base64,R0lG")).is_ok());
        assert!(VerificationRequest::from_parts("Forward to 10 friends!", Some("")).is_ok());
    }
}
