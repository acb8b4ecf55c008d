//! # Image Loading and Optimisation
//!
//! Loads portfolio photos from disk and prepares them for PDF embedding.
//! Camera exports are usually far larger than a printed page needs, so
//! images wider than the configured maximum are downsampled (Lanczos3) and
//! re-encoded as JPEG. JPEGs that already fit are re-compressed and the
//! result is kept only when it is meaningfully smaller; otherwise the
//! original bytes pass straight through (DCTDecode). PNG, GIF and BMP images
//! are decoded to RGB pixels with a separate alpha channel for SMask
//! transparency.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageEncoder, ImageFormat};
use tracing::debug;

use crate::config::OptimizeSettings;
use crate::error::ImageError;

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// JPEG bytes, embedded as-is with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// What optimisation did to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeOutcome {
    /// Resized and/or re-compressed.
    Optimized {
        original_bytes: u64,
        new_bytes: u64,
        resized: bool,
    },
    /// Embedded from the original data.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub image: LoadedImage,
    pub outcome: OptimizeOutcome,
}

impl OptimizedImage {
    pub fn is_optimized(&self) -> bool {
        matches!(self.outcome, OptimizeOutcome::Optimized { .. })
    }

    fn unchanged(image: LoadedImage) -> Self {
        Self {
            image,
            outcome: OptimizeOutcome::Unchanged,
        }
    }
}

/// Load an image file and shrink it for embedding according to `settings`.
pub fn load_image(path: &Path, settings: &OptimizeSettings) -> Result<OptimizedImage, ImageError> {
    let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_image_bytes(&bytes, path, settings)
}

/// Same as [`load_image`] for bytes already in memory. `path` is only used
/// in error messages.
pub fn load_image_bytes(
    bytes: &[u8],
    path: &Path,
    settings: &OptimizeSettings,
) -> Result<OptimizedImage, ImageError> {
    let decode_err = |e: image::ImageError| ImageError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let format = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|source| ImageError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .format();
    let format = match format {
        Some(f @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::Bmp)) => f,
        _ => return Err(ImageError::Unsupported(path.to_path_buf())),
    };

    let (width, height) = image::io::Reader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(decode_err)?;
    if width == 0 || height == 0 {
        return Err(ImageError::Degenerate(path.to_path_buf()));
    }

    let is_jpeg = format == ImageFormat::Jpeg;
    // CMYK JPEGs cannot be passed through as DeviceRGB.
    let passthrough = is_jpeg && jpeg_components(bytes).map_or(true, |n| n == 1 || n == 3);

    if !settings.enabled && passthrough {
        return Ok(OptimizedImage::unchanged(jpeg_passthrough(bytes, width, height)));
    }

    let decode = || {
        image::io::Reader::with_format(Cursor::new(bytes), format)
            .decode()
            .map_err(decode_err)
    };

    if settings.enabled && width > settings.max_width_px {
        let new_width = settings.max_width_px;
        let new_height = ((new_width as u64 * height as u64) / width as u64).max(1) as u32;
        debug!(
            path = %path.display(),
            from = %format!("{}x{}", width, height),
            to = %format!("{}x{}", new_width, new_height),
            "resizing"
        );
        let resized = decode()?.resize_exact(new_width, new_height, FilterType::Lanczos3);
        let data = encode_jpeg(&resized, settings.jpeg_quality).map_err(decode_err)?;
        let new_bytes = data.len() as u64;
        return Ok(OptimizedImage {
            image: LoadedImage {
                pixel_data: ImagePixelData::Jpeg {
                    data,
                    color_space: JpegColorSpace::DeviceRGB,
                },
                width_px: new_width,
                height_px: new_height,
            },
            outcome: OptimizeOutcome::Optimized {
                original_bytes: bytes.len() as u64,
                new_bytes,
                resized: true,
            },
        });
    }

    if is_jpeg && settings.enabled {
        let data = encode_jpeg(&decode()?, settings.jpeg_quality).map_err(decode_err)?;
        let threshold = bytes.len() as f64 * (1.0 - settings.min_savings);
        if (data.len() as f64) < threshold || !passthrough {
            debug!(
                path = %path.display(),
                original = bytes.len(),
                recompressed = data.len(),
                "re-compressed JPEG"
            );
            let new_bytes = data.len() as u64;
            return Ok(OptimizedImage {
                image: LoadedImage {
                    pixel_data: ImagePixelData::Jpeg {
                        data,
                        color_space: JpegColorSpace::DeviceRGB,
                    },
                    width_px: width,
                    height_px: height,
                },
                outcome: OptimizeOutcome::Optimized {
                    original_bytes: bytes.len() as u64,
                    new_bytes,
                    resized: false,
                },
            });
        }
        return Ok(OptimizedImage::unchanged(jpeg_passthrough(bytes, width, height)));
    }

    Ok(OptimizedImage::unchanged(split_alpha(&decode()?)))
}

fn jpeg_passthrough(bytes: &[u8], width: u32, height: u32) -> LoadedImage {
    let color_space = match jpeg_components(bytes) {
        Some(1) => JpegColorSpace::DeviceGray,
        _ => JpegColorSpace::DeviceRGB,
    };
    LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: bytes.to_vec(),
            color_space,
        },
        width_px: width,
        height_px: height,
    }
}

/// Scan JPEG markers for the SOF (Start of Frame) segment and read the
/// number of colour components.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            // length(2) + precision(1) + height(2) + width(2) + num_components(1)
            return data.get(i + 9).copied();
        }
        if i + 3 >= data.len() {
            return None;
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    None
}

/// Composite onto white and encode as baseline JPEG.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = flatten_onto_white(img);
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
    Ok(buf)
}

fn flatten_onto_white(img: &DynamicImage) -> image::RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    image::RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

/// Decode to RGBA, split into RGB + alpha.
fn split_alpha(img: &DynamicImage) -> LoadedImage {
    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
        has_transparency |= pixel[3] != 255;
    }

    LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: has_transparency.then_some(alpha),
        },
        width_px: width,
        height_px: height,
    }
}
