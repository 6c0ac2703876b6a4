use crate::compositor::AssetRef;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{name} is not a recognised image: {source}")]
    NotAnImage {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

/// A user-picked image held in memory (logo or style reference).
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl UploadedImage {
    /// Wraps bytes already in memory, sniffing the format from the content.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let name = name.into();
        let format = image::guess_format(&bytes).map_err(|source| UploadError::NotAnImage {
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            mime_type: mime_for(format).to_string(),
            bytes: bytes.into(),
        })
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64())
    }

    /// Uploads travel to the compositor as data URLs.
    pub fn asset(&self) -> AssetRef {
        AssetRef::DataUrl(self.to_data_url())
    }
}

/// Reads an image file picked by the user.
pub async fn read_upload(path: &Path) -> Result<UploadedImage, UploadError> {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let bytes = tokio::fs::read(path).await?;
    log::info!("Read upload {} ({} bytes)", name, bytes.len());
    UploadedImage::from_bytes(name, bytes)
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbaImage};
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(2, 2))
            .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_from_bytes_detects_png() {
        let upload = UploadedImage::from_bytes("logo.png", tiny_png()).unwrap();
        assert_eq!(upload.mime_type, "image/png");
        assert!(upload.to_data_url().starts_with("data:image/png;base64,iVBOR"));
        assert!(matches!(upload.asset(), AssetRef::DataUrl(url) if url == upload.to_data_url()));
    }

    #[test]
    fn test_from_bytes_rejects_text() {
        let err = UploadedImage::from_bytes("notes.txt", b"hello there".to_vec()).unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage { .. }));
        assert!(err.to_string().contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_read_upload_from_disk() {
        let path = std::env::temp_dir().join(format!("cover-studio-{}.png", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, tiny_png()).await.unwrap();

        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.name, path.file_name().unwrap().to_string_lossy());
        assert_eq!(upload.mime_type, "image/png");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_read_upload_missing_file() {
        let err = read_upload(Path::new("/nonexistent/cover-studio/logo.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::IoError(_)));
    }
}
