//! Uncompressed BMP serialization of captured frames
//!
//! Frames are written as 24-bit, top-down (negative height) BMP files with a
//! 54-byte header. Tesseract reads this layout through Leptonica without any
//! optional codec support.

use std::path::Path;

use image::RgbImage;

use crate::error::{DetectError, DetectResult};

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
const BITS_PER_PIXEL: u16 = 24;
/// 72 DPI expressed in pixels per meter
const PIXELS_PER_METER: i32 = 2835;

/// Bytes per pixel row including padding to a 4-byte boundary
pub fn row_stride(width: u32) -> usize {
    (width as usize * 3 + 3) & !3
}

/// Encodes an RGB image as a top-down 24-bit BMP
pub fn encode_bmp(image: &RgbImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let stride = row_stride(width);
    let pixel_bytes = stride * height as usize;
    let offset = FILE_HEADER_LEN + INFO_HEADER_LEN;
    let file_len = offset as usize + pixel_bytes;

    let mut out = Vec::with_capacity(file_len);

    // BITMAPFILEHEADER
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_len as u32).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());

    // BITMAPINFOHEADER
    out.extend_from_slice(&INFO_HEADER_LEN.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(-(height as i32)).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&BITS_PER_PIXEL.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
    out.extend_from_slice(&(pixel_bytes as u32).to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    let padding = stride - width as usize * 3;
    for row in image.rows() {
        for pixel in row {
            let [r, g, b] = pixel.0;
            out.extend_from_slice(&[b, g, r]);
        }
        out.extend(std::iter::repeat_n(0u8, padding));
    }

    out
}

/// Writes `image` to `path` as BMP
///
/// Fails with `CaptureFailed` when the file cannot be written, since a frame
/// that never reaches disk is as unusable as one that was never captured.
pub async fn write_bmp(image: &RgbImage, path: &Path) -> DetectResult<()> {
    let bytes = encode_bmp(image);
    tokio::fs::write(path, &bytes).await.map_err(|e| {
        DetectError::capture(format!("failed to write frame to {}: {}", path.display(), e))
    })?;
    tracing::debug!(
        "Wrote {}x{} frame ({} bytes) to {:?}",
        image.width(),
        image.height(),
        bytes.len(),
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{ImageFormat, Rgb};

    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 40) as u8, (y * 60) as u8, 200]))
    }

    #[test]
    fn test_row_stride_padding() {
        assert_eq!(row_stride(1), 4);
        assert_eq!(row_stride(3), 12);
        assert_eq!(row_stride(4), 12);
        assert_eq!(row_stride(5), 16);
    }

    #[test]
    fn test_header_fields() {
        let bytes = encode_bmp(&gradient(5, 3));

        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(u32::from_le_bytes(bytes[2..6].try_into().unwrap()) as usize, bytes.len());
        assert_eq!(u32::from_le_bytes(bytes[10..14].try_into().unwrap()), 54);
        assert_eq!(i32::from_le_bytes(bytes[18..22].try_into().unwrap()), 5);
        // Negative height marks top-down row order
        assert_eq!(i32::from_le_bytes(bytes[22..26].try_into().unwrap()), -3);
        assert_eq!(u16::from_le_bytes(bytes[28..30].try_into().unwrap()), 24);
        assert_eq!(bytes.len(), 54 + 16 * 3);
    }

    #[test]
    fn test_first_row_is_top_row_in_bgr() {
        let mut image = RgbImage::new(2, 2);
        image.put_pixel(0, 0, Rgb([10, 20, 30]));
        image.put_pixel(0, 1, Rgb([1, 2, 3]));

        let bytes = encode_bmp(&image);
        assert_eq!(&bytes[54..57], &[30, 20, 10]);
        // Second row starts after 6 pixel bytes plus 2 bytes padding
        assert_eq!(&bytes[62..65], &[3, 2, 1]);
    }

    #[test]
    fn test_decodes_with_image_crate() {
        let original = gradient(7, 4);
        let bytes = encode_bmp(&original);

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Bmp)
            .unwrap()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), (7, 4));
        assert_eq!(decoded, original);
    }

    #[tokio::test]
    async fn test_write_bmp_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frame.bmp");

        let err = write_bmp(&gradient(2, 2), &path).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::CaptureFailed);
    }

    #[tokio::test]
    async fn test_write_bmp_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.bmp");

        write_bmp(&gradient(3, 3), &path).await.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..2], b"BM");
    }
}
