use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, ImageFormat, RgbaImage};
use std::borrow::Cow;

use crate::models::{EntryPayload, ImageEncoding, ImagePayload};

/// 文本内容的入库上限，超过即拒收（不截断、不存储）
pub const MAX_TEXT_BYTES: usize = 1024 * 1024;

const MAX_IMAGE_PIXELS: usize = 2_600_000; // approx <= 1920x1350
const MAX_IMAGE_DIMENSION: usize = 2200;
const THUMBNAIL_MAX_DIM: u32 = 128;

/// 剪贴板的一次原始快照，由平台适配层提供
#[derive(Clone, Debug, PartialEq)]
pub enum RawContent {
    Text(String),
    /// 平台剪贴板给出的未压缩 RGBA 位图
    RgbaImage { width: u32, height: u32, bytes: Vec<u8> },
    /// 已是某种图片编码的字节流（调用方直接投喂时出现）
    EncodedImage(Vec<u8>),
    FileList(Vec<String>),
    Other(String),
}

/// 分类结论。`TooLarge` 需要提示用户，`Unsupported` 静默丢弃。
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    Accepted(EntryPayload),
    TooLarge { size_bytes: u64 },
    Unsupported,
}

/// 对一次剪贴板快照做分类，每次观察到的变化只评估一次。
/// 图片在交给存储层之前就同步生成缩略图。
pub fn classify(raw: &RawContent) -> Classification {
    match raw {
        RawContent::Text(text) => classify_text(text),
        RawContent::RgbaImage { width, height, bytes } => {
            classify_rgba(*width, *height, bytes)
        }
        RawContent::EncodedImage(bytes) => classify_encoded(bytes),
        RawContent::FileList(_) | RawContent::Other(_) => Classification::Unsupported,
    }
}

fn classify_text(text: &str) -> Classification {
    if text.trim().is_empty() {
        return Classification::Unsupported;
    }
    if text.len() > MAX_TEXT_BYTES {
        return Classification::TooLarge { size_bytes: text.len() as u64 };
    }
    Classification::Accepted(EntryPayload::Text(text.to_string()))
}

/// RGBA 快照统一压成 PNG 入库，过大的位图先按比例缩小。
fn classify_rgba(width: u32, height: u32, rgba: &[u8]) -> Classification {
    if width == 0 || height == 0 || rgba.len() < (width as usize * height as usize * 4) {
        return Classification::Unsupported;
    }

    let (norm_width, norm_height, norm_rgba) =
        normalize_image_for_storage(width as usize, height as usize, rgba);
    let png_bytes = match encode_rgba_to_png(norm_width, norm_height, norm_rgba.as_ref()) {
        Ok(bytes) => bytes,
        Err(_) => return Classification::Unsupported,
    };

    let buffer = match RgbaImage::from_raw(
        norm_width as u32,
        norm_height as u32,
        norm_rgba.into_owned(),
    ) {
        Some(buffer) => buffer,
        None => return Classification::Unsupported,
    };
    let thumbnail = match make_thumbnail(&DynamicImage::ImageRgba8(buffer)) {
        Ok(bytes) => bytes,
        Err(_) => return Classification::Unsupported,
    };

    Classification::Accepted(EntryPayload::Image(ImagePayload {
        encoding: ImageEncoding::Png,
        width: norm_width as u32,
        height: norm_height as u32,
        data: png_bytes,
        thumbnail,
    }))
}

/// 已编码的图片只接受 PNG / JPEG / BMP，其余格式静默拒收
fn classify_encoded(bytes: &[u8]) -> Classification {
    let encoding = match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => ImageEncoding::Png,
        Ok(ImageFormat::Jpeg) => ImageEncoding::Jpeg,
        Ok(ImageFormat::Bmp) => ImageEncoding::Bmp,
        _ => return Classification::Unsupported,
    };

    let decoded = match image::load_from_memory(bytes) {
        Ok(image) => image,
        Err(_) => return Classification::Unsupported,
    };
    let thumbnail = match make_thumbnail(&decoded) {
        Ok(thumb) => thumb,
        Err(_) => return Classification::Unsupported,
    };

    Classification::Accepted(EntryPayload::Image(ImagePayload {
        encoding,
        width: decoded.width(),
        height: decoded.height(),
        data: bytes.to_vec(),
        thumbnail,
    }))
}

fn encode_rgba_to_png(width: usize, height: usize, rgba: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    encoder
        .write_image(rgba, width as u32, height as u32, ColorType::Rgba8.into())
        .map_err(|e| e.to_string())?;
    Ok(out)
}

/// 缩略图固定为 PNG，最长边不超过 THUMBNAIL_MAX_DIM
fn make_thumbnail(image: &DynamicImage) -> Result<Vec<u8>, String> {
    let thumb = image.thumbnail(THUMBNAIL_MAX_DIM, THUMBNAIL_MAX_DIM);
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    encoder
        .write_image(
            thumb.to_rgba8().as_raw(),
            thumb.width(),
            thumb.height(),
            ColorType::Rgba8.into(),
        )
        .map_err(|e| e.to_string())?;
    Ok(out)
}

fn downscale_rgba_nearest(
    width: usize,
    height: usize,
    rgba: &[u8],
    target_width: usize,
    target_height: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; target_width * target_height * 4];
    for ty in 0..target_height {
        let sy = ty * height / target_height;
        for tx in 0..target_width {
            let sx = tx * width / target_width;
            let src = (sy * width + sx) * 4;
            let dst = (ty * target_width + tx) * 4;
            out[dst..dst + 4].copy_from_slice(&rgba[src..src + 4]);
        }
    }
    out
}

fn normalize_image_for_storage<'a>(
    width: usize,
    height: usize,
    rgba: &'a [u8],
) -> (usize, usize, Cow<'a, [u8]>) {
    let mut ratio: f64 = 1.0;
    if width > MAX_IMAGE_DIMENSION {
        ratio = ratio.max(width as f64 / MAX_IMAGE_DIMENSION as f64);
    }
    if height > MAX_IMAGE_DIMENSION {
        ratio = ratio.max(height as f64 / MAX_IMAGE_DIMENSION as f64);
    }
    let pixels = width.saturating_mul(height);
    if pixels > MAX_IMAGE_PIXELS {
        ratio = ratio.max((pixels as f64 / MAX_IMAGE_PIXELS as f64).sqrt());
    }

    if ratio <= 1.0 {
        return (width, height, Cow::Borrowed(rgba));
    }

    let target_width = ((width as f64 / ratio).round() as usize).max(1);
    let target_height = ((height as f64 / ratio).round() as usize).max(1);
    let resized = downscale_rgba_nearest(width, height, rgba, target_width, target_height);
    (target_width, target_height, Cow::Owned(resized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;
    use std::io::Cursor;

    fn sample_rgba(width: u32, height: u32) -> Vec<u8> {
        (0..width * height * 4).map(|i| (i % 251) as u8).collect()
    }

    fn encode_sample(format: ImageFormat) -> Vec<u8> {
        let buffer = RgbaImage::from_raw(8, 6, sample_rgba(8, 6)).unwrap();
        let image = DynamicImage::ImageRgba8(buffer);
        let mut out = Cursor::new(Vec::new());
        // JPEG/BMP 编码器不接受带 alpha 的像素
        match format {
            ImageFormat::Png => image.write_to(&mut out, format).unwrap(),
            _ => DynamicImage::ImageRgb8(image.to_rgb8())
                .write_to(&mut out, format)
                .unwrap(),
        }
        out.into_inner()
    }

    #[test]
    fn test_text_accepted() {
        match classify(&RawContent::Text("hello".to_string())) {
            Classification::Accepted(payload) => {
                assert_eq!(payload, EntryPayload::Text("hello".to_string()));
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_text_at_limit_accepted() {
        let text = "a".repeat(MAX_TEXT_BYTES);
        assert!(matches!(
            classify(&RawContent::Text(text)),
            Classification::Accepted(_)
        ));
    }

    #[test]
    fn test_text_over_limit_rejected_with_size() {
        let text = "a".repeat(MAX_TEXT_BYTES + 1);
        match classify(&RawContent::Text(text)) {
            Classification::TooLarge { size_bytes } => {
                assert_eq!(size_bytes, (MAX_TEXT_BYTES + 1) as u64);
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_blank_text_silently_dropped() {
        assert_eq!(
            classify(&RawContent::Text("  \n\t ".to_string())),
            Classification::Unsupported
        );
    }

    #[test]
    fn test_rgba_snapshot_becomes_png_with_thumbnail() {
        let raw = RawContent::RgbaImage {
            width: 8,
            height: 6,
            bytes: sample_rgba(8, 6),
        };
        match classify(&raw) {
            Classification::Accepted(EntryPayload::Image(image)) => {
                assert_eq!(image.encoding, ImageEncoding::Png);
                assert_eq!((image.width, image.height), (8, 6));
                assert_eq!(image::guess_format(&image.data).unwrap(), ImageFormat::Png);
                assert!(!image.thumbnail.is_empty());
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_encoded_formats_accepted() {
        for (format, encoding) in [
            (ImageFormat::Png, ImageEncoding::Png),
            (ImageFormat::Jpeg, ImageEncoding::Jpeg),
            (ImageFormat::Bmp, ImageEncoding::Bmp),
        ] {
            let bytes = encode_sample(format);
            match classify(&RawContent::EncodedImage(bytes.clone())) {
                Classification::Accepted(payload) => {
                    assert_eq!(payload.kind(), EntryKind::Image);
                    if let EntryPayload::Image(image) = payload {
                        assert_eq!(image.encoding, encoding);
                        // 原始字节原样入库
                        assert_eq!(image.data, bytes);
                        assert!(!image.thumbnail.is_empty());
                    }
                }
                other => panic!("{:?} not accepted: {:?}", encoding, other),
            }
        }
    }

    #[test]
    fn test_unknown_bytes_silently_dropped() {
        assert_eq!(
            classify(&RawContent::EncodedImage(vec![0x00, 0x01, 0x02, 0x03])),
            Classification::Unsupported
        );
    }

    #[test]
    fn test_file_list_silently_dropped() {
        let raw = RawContent::FileList(vec!["/tmp/a.txt".to_string()]);
        assert_eq!(classify(&raw), Classification::Unsupported);
    }

    #[test]
    fn test_thumbnail_fits_bounds() {
        let buffer = RgbaImage::from_raw(400, 200, sample_rgba(400, 200)).unwrap();
        let thumb_bytes = make_thumbnail(&DynamicImage::ImageRgba8(buffer)).unwrap();
        let thumb = image::load_from_memory(&thumb_bytes).unwrap();
        assert!(thumb.width() <= THUMBNAIL_MAX_DIM);
        assert!(thumb.height() <= THUMBNAIL_MAX_DIM);
    }

    #[test]
    fn test_oversized_rgba_is_downscaled() {
        let width = 4400usize;
        let height = 2usize;
        let raw = RawContent::RgbaImage {
            width: width as u32,
            height: height as u32,
            bytes: sample_rgba(width as u32, height as u32),
        };
        match classify(&raw) {
            Classification::Accepted(EntryPayload::Image(image)) => {
                assert!(image.width as usize <= MAX_IMAGE_DIMENSION);
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }
}
