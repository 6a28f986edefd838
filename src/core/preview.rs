use crate::utils::error::{Result, UpscaleError};
use crate::utils::validation::validate_url;
use image::{DynamicImage, GenericImageView, ImageFormat};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

pub const THUMBNAIL_WIDTH: u32 = 400;
pub const THUMBNAIL_HEIGHT: u32 = 220;
pub const PREVIEW_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct PreviewInfo {
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
    pub byte_len: usize,
    pub thumbnail: DynamicImage,
}

pub struct ImagePreviewer {
    client: Client,
}

impl ImagePreviewer {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(PREVIEW_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// 下載圖片並產生縮圖，確認 URL 可被上游服務讀取
    pub async fn fetch(&self, url: &str) -> Result<PreviewInfo> {
        validate_url("image_url", url.trim())?;

        tracing::debug!("Loading preview from: {}", url);
        let response = self.client.get(url.trim()).send().await?;

        if !response.status().is_success() {
            return Err(UpscaleError::ApiStatusError {
                status: response.status().as_u16(),
                context: "Unable to fetch image".to_string(),
            });
        }

        let bytes = response.bytes().await?;
        build_preview(&bytes)
    }

    pub fn save_thumbnail(info: &PreviewInfo, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info.thumbnail.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Decode `bytes` and shrink to fit the preview box; smaller images are kept as-is.
pub fn build_preview(bytes: &[u8]) -> Result<PreviewInfo> {
    let format = image::guess_format(bytes).ok();
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();

    let thumbnail = if width > THUMBNAIL_WIDTH || height > THUMBNAIL_HEIGHT {
        decoded.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)
    } else {
        decoded
    };

    Ok(PreviewInfo {
        width,
        height,
        format,
        byte_len: bytes.len(),
        thumbnail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 90])));
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_large_image_is_shrunk_with_aspect_ratio() {
        let info = build_preview(&png_bytes(800, 440)).unwrap();

        assert_eq!((info.width, info.height), (800, 440));
        assert_eq!(info.format, Some(ImageFormat::Png));
        assert_eq!(info.thumbnail.dimensions(), (400, 220));
    }

    #[test]
    fn test_small_image_is_not_enlarged() {
        let info = build_preview(&png_bytes(120, 60)).unwrap();
        assert_eq!(info.thumbnail.dimensions(), (120, 60));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = build_preview(b"<html>not an image</html>").unwrap_err();
        assert!(matches!(err, UpscaleError::ImageError(_)));
    }

    #[tokio::test]
    async fn test_fetch_and_save_thumbnail() {
        let server = MockServer::start();
        let bytes = png_bytes(1000, 200);
        let image_mock = server.mock(|when, then| {
            when.method(GET).path("/photo.png");
            then.status(200)
                .header("Content-Type", "image/png")
                .body(bytes.clone());
        });

        let previewer = ImagePreviewer::new().unwrap();
        let info = previewer.fetch(&server.url("/photo.png")).await.unwrap();

        image_mock.assert();
        let (thumb_w, thumb_h) = info.thumbnail.dimensions();
        assert_eq!(thumb_w, 400);
        assert!(thumb_h <= 220);

        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("thumbs").join("preview.png");
        ImagePreviewer::save_thumbnail(&info, &target).unwrap();
        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_fetch_reports_http_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.png");
            then.status(404);
        });

        let err = ImagePreviewer::new()
            .unwrap()
            .fetch(&server.url("/missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpscaleError::ApiStatusError { status: 404, .. }));
    }
}
