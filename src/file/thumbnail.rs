//! Thumbnail generation.
//!
//! Decodes an uploaded image and writes a PNG preview bounded to
//! `max_dimension` on both sides, keeping the aspect ratio.

use std::io::{self, Cursor};

use image::ImageFormat;

/// Produce a bounded PNG thumbnail from encoded image bytes.
pub fn generate(bytes: &[u8], max_dimension: u32) -> io::Result<Vec<u8>> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| io::Error::other(format!("failed to decode image: {e}")))?;

    let thumbnail = image.thumbnail(max_dimension, max_dimension);

    let mut out = Cursor::new(Vec::new());
    thumbnail
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| io::Error::other(format!("failed to encode thumbnail: {e}")))?;
    Ok(out.into_inner())
}

/// Run [`generate`] on the blocking pool.
pub async fn generate_async(bytes: Vec<u8>, max_dimension: u32) -> io::Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || generate(&bytes, max_dimension))
        .await
        .map_err(|e| io::Error::other(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, RgbImage};

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_generate_bounds_dimensions() {
        let thumb = generate(&png_bytes(800, 400), 200).unwrap();
        let decoded = image::load_from_memory(&thumb).unwrap();
        let (w, h) = decoded.dimensions();
        assert_eq!(w, 200);
        assert_eq!(h, 100);
    }

    #[test]
    fn test_generate_rejects_garbage() {
        assert!(generate(b"definitely not an image", 200).is_err());
    }

    #[tokio::test]
    async fn test_generate_async() {
        let thumb = generate_async(png_bytes(50, 50), 200).await.unwrap();
        assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Png);
    }
}
