use crate::overlay::OverlayState;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(15);

/// Where an image comes from.
#[derive(Debug, Clone)]
pub enum AssetRef {
    Bytes(Arc<[u8]>),
    /// `data:<mime>;base64,<payload>`
    DataUrl(String),
    File(PathBuf),
}

impl From<Vec<u8>> for AssetRef {
    fn from(bytes: Vec<u8>) -> Self {
        AssetRef::Bytes(bytes.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    Background,
    Overlay,
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRole::Background => f.write_str("background"),
            AssetRole::Overlay => f.write_str("overlay"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("failed to load {role} image: {reason}")]
    AssetLoad { role: AssetRole, reason: String },

    #[error("failed to encode composed image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("render task failed: {0}")]
    Render(#[from] tokio::task::JoinError),
}

impl CompositeError {
    fn load(role: AssetRole, reason: impl ToString) -> Self {
        CompositeError::AssetLoad {
            role,
            reason: reason.to_string(),
        }
    }
}

/// Everything one export needs. Built right before composing and dropped after.
#[derive(Debug, Clone)]
pub struct CompositionRequest {
    pub background: AssetRef,
    pub overlay: Option<(AssetRef, OverlayState)>,
}

/// Pixel rectangle of the overlay on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Maps a percentage state onto an output canvas.
///
/// Width scales with the canvas width, height keeps the overlay's own aspect
/// ratio regardless of the canvas shape.
pub fn overlay_rect(
    canvas: (u32, u32),
    overlay_native: (u32, u32),
    state: &OverlayState,
) -> PixelRect {
    let (canvas_w, canvas_h) = (f64::from(canvas.0), f64::from(canvas.1));
    let (native_w, native_h) = (f64::from(overlay_native.0), f64::from(overlay_native.1));

    let width = canvas_w * f64::from(state.size_percent) / 100.0;
    let height = if native_w > 0.0 {
        width * (native_h / native_w)
    } else {
        0.0
    };

    PixelRect {
        x: (canvas_w * f64::from(state.x) / 100.0).round() as i64,
        y: (canvas_h * f64::from(state.y) / 100.0).round() as i64,
        width: (width.round() as u32).max(1),
        height: (height.round() as u32).max(1),
    }
}

/// Draws the background, then the overlay on top of it.
pub fn composite(background: &DynamicImage, overlay: Option<(&DynamicImage, &OverlayState)>) -> RgbaImage {
    let (width, height) = (background.width(), background.height());
    let mut canvas = RgbaImage::new(width, height);
    imageops::overlay(&mut canvas, &background.to_rgba8(), 0, 0);

    if let Some((logo, state)) = overlay {
        let rect = overlay_rect((width, height), (logo.width(), logo.height()), state);
        let scaled = imageops::resize(&logo.to_rgba8(), rect.width, rect.height, FilterType::Lanczos3);
        imageops::overlay(&mut canvas, &scaled, rect.x, rect.y);
    }

    canvas
}

pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, CompositeError> {
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(canvas.clone()).write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)?;
    Ok(out)
}

/// Decodes the payload of a `data:` URL. Input without a comma is treated as
/// bare base64.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = url.split_once(',').map_or(url, |(_, data)| data);
    STANDARD.decode(payload.trim())
}

pub struct Compositor {
    asset_timeout: Duration,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_TIMEOUT)
    }
}

impl Compositor {
    pub fn new(asset_timeout: Duration) -> Self {
        Self { asset_timeout }
    }

    /// Loads both assets, composites them and returns PNG bytes.
    ///
    /// Any asset failure aborts the whole composition.
    pub async fn compose(&self, request: &CompositionRequest) -> Result<Vec<u8>, CompositeError> {
        let background = self.load(&request.background, AssetRole::Background).await?;
        let overlay = match &request.overlay {
            Some((asset, state)) => Some((self.load(asset, AssetRole::Overlay).await?, *state)),
            None => None,
        };

        log::info!(
            "Composing {}x{} cover{}",
            background.width(),
            background.height(),
            if overlay.is_some() { " with logo" } else { "" }
        );

        tokio::task::spawn_blocking(move || {
            let canvas = composite(&background, overlay.as_ref().map(|(logo, state)| (logo, state)));
            encode_png(&canvas)
        })
        .await?
    }

    async fn load(&self, asset: &AssetRef, role: AssetRole) -> Result<DynamicImage, CompositeError> {
        match tokio::time::timeout(self.asset_timeout, load_asset(asset, role)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Timed out loading {} after {:?}", role, self.asset_timeout);
                Err(CompositeError::load(
                    role,
                    format!("timed out after {}s", self.asset_timeout.as_secs_f32()),
                ))
            }
        }
    }
}

async fn load_asset(asset: &AssetRef, role: AssetRole) -> Result<DynamicImage, CompositeError> {
    let bytes: Arc<[u8]> = match asset {
        AssetRef::Bytes(bytes) => bytes.clone(),
        AssetRef::DataUrl(url) => decode_data_url(url)
            .map_err(|e| CompositeError::load(role, e))?
            .into(),
        AssetRef::File(path) => tokio::fs::read(path)
            .await
            .map_err(|e| CompositeError::load(role, format!("{}: {}", path.display(), e)))?
            .into(),
    };

    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| CompositeError::load(role, e))?
        .map_err(|e| CompositeError::load(role, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::LogoPlacement;
    use image::{GenericImageView, Rgba};

    const RED: Rgba<u8> = Rgba([200, 20, 20, 255]);
    const BLUE: Rgba<u8> = Rgba([10, 30, 220, 255]);

    fn solid(width: u32, height: u32, color: Rgba<u8>) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color))
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        encode_png(&image.to_rgba8()).unwrap()
    }

    fn is_blue(pixel: &Rgba<u8>) -> bool {
        pixel[2] > 180 && pixel[0] < 60
    }

    #[test]
    fn test_overlay_width_follows_size_percent() {
        let state = OverlayState::new(0.0, 0.0, 20.0);
        let rect = overlay_rect((1000, 1500), (300, 120), &state);
        assert_eq!(rect.width, 200);
        assert_eq!(rect.height, 80);
    }

    #[test]
    fn test_overlay_height_ignores_canvas_aspect() {
        let state = OverlayState::new(0.0, 0.0, 20.0);
        let tall = overlay_rect((1000, 1500), (100, 50), &state);
        let wide = overlay_rect((1000, 200), (100, 50), &state);
        assert_eq!(tall.height, 100);
        assert_eq!(wide.height, 100);
    }

    #[test]
    fn test_overlay_position_in_pixels() {
        let state = OverlayState::new(78.0, 4.0, 18.0);
        let rect = overlay_rect((1000, 1500), (64, 64), &state);
        assert_eq!((rect.x, rect.y), (780, 60));
    }

    #[test]
    fn test_composite_draws_logo_on_top() {
        let background = solid(1000, 1500, RED);
        let logo = solid(100, 50, BLUE);
        let state = OverlayState { x: 78.0, y: 4.0, size_percent: 20.0 };
        let canvas = composite(&background, Some((&logo, &state)));
        assert_eq!(canvas.dimensions(), (1000, 1500));

        // 200 x 100 logo at (780, 60)
        assert!(is_blue(canvas.get_pixel(790, 70)));
        assert!(is_blue(canvas.get_pixel(975, 155)));
        assert_eq!(*canvas.get_pixel(779, 60), RED);
        assert_eq!(*canvas.get_pixel(790, 59), RED);
        assert_eq!(*canvas.get_pixel(790, 160), RED);
        assert_eq!(*canvas.get_pixel(10, 1400), RED);
    }

    #[test]
    fn test_composite_without_overlay_copies_background() {
        let background = solid(40, 60, RED);
        let canvas = composite(&background, None);
        assert_eq!(canvas.dimensions(), (40, 60));
        assert!(canvas.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(decode_data_url("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_data_url("aGVsbG8=").unwrap(), b"hello");
        assert!(decode_data_url("data:image/png;base64,***").is_err());
    }

    #[tokio::test]
    async fn test_compose_outputs_png_at_native_size() {
        let request = CompositionRequest {
            background: png_bytes(&solid(120, 180, RED)).into(),
            overlay: Some((
                png_bytes(&solid(30, 10, BLUE)).into(),
                OverlayState { x: 50.0, y: 50.0, size_percent: 25.0 },
            )),
        };

        let png = Compositor::default().compose(&request).await.unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (120, 180));
        // 30 x 10 logo at (60, 90)
        assert!(is_blue(decoded.get_pixel(65, 92)));
        assert_eq!(*decoded.get_pixel(5, 5), RED);
    }

    #[tokio::test]
    async fn test_compose_accepts_data_url_background() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(&solid(8, 12, RED))));
        let request = CompositionRequest {
            background: AssetRef::DataUrl(url),
            overlay: None,
        };
        let png = Compositor::default().compose(&request).await.unwrap();
        assert_eq!(image::load_from_memory(&png).unwrap().dimensions(), (8, 12));
    }

    #[tokio::test]
    async fn test_compose_fails_on_corrupt_overlay() {
        let request = CompositionRequest {
            background: png_bytes(&solid(20, 30, RED)).into(),
            overlay: Some((
                AssetRef::from(b"definitely not an image".to_vec()),
                LogoPlacement::FrontCover.default_state(),
            )),
        };

        let err = Compositor::default().compose(&request).await.unwrap_err();
        assert!(matches!(err, CompositeError::AssetLoad { role: AssetRole::Overlay, .. }));
    }

    #[tokio::test]
    async fn test_compose_fails_on_missing_background_file() {
        let request = CompositionRequest {
            background: AssetRef::File(PathBuf::from("/nonexistent/cover-studio/bg.png")),
            overlay: None,
        };
        let err = Compositor::default().compose(&request).await.unwrap_err();
        assert!(matches!(err, CompositeError::AssetLoad { role: AssetRole::Background, .. }));
        assert!(err.to_string().contains("background"));
    }

    #[tokio::test]
    async fn test_compose_fails_when_asset_load_times_out() {
        let request = CompositionRequest {
            background: png_bytes(&solid(1200, 1800, RED)).into(),
            overlay: None,
        };

        let err = Compositor::new(Duration::ZERO).compose(&request).await.unwrap_err();
        assert!(matches!(err, CompositeError::AssetLoad { role: AssetRole::Background, .. }));
        assert!(err.to_string().contains("timed out"));
    }
}
