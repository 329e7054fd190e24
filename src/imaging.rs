//! Image optimization before upload to Anki
//!
//! Oversized images are scaled down to fit the configured bound, PNG stays
//! PNG and everything else becomes a progressive JPEG. Any failure hands
//! back the original bytes untouched.

use std::sync::Arc;

use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::config::{ImageConfig, PngCompression};

/// Image ready to be stored as Anki media
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub bytes: Vec<u8>,
    /// File extension matching the encoded bytes, without the dot
    pub extension: String,
}

#[derive(Debug, thiserror::Error)]
enum OptimizeError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG encoding error: {0}")]
    Jpeg(#[from] jpeg_encoder::EncodingError),

    #[error("dimensions {0}x{1} exceed JPEG limits")]
    Dimensions(u32, u32),
}

#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    config: ImageConfig,
}

impl ImageOptimizer {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    /// Resize and recompress an uploaded image.
    ///
    /// `original_name` only supplies the extension when the bytes cannot be
    /// decoded at all.
    pub async fn optimize(&self, bytes: Vec<u8>, original_name: Option<&str>) -> OptimizedImage {
        let input = Arc::new(bytes);
        let config = self.config.clone();
        let task_input = Arc::clone(&input);

        let result = tokio::task::spawn_blocking(move || optimize_blocking(&config, &task_input))
            .await;

        match result {
            Ok(Ok(optimized)) => {
                let original_kb = input.len() as f64 / 1024.0;
                let optimized_kb = optimized.bytes.len() as f64 / 1024.0;
                tracing::info!(
                    original_kb = format!("{:.2}", original_kb),
                    optimized_kb = format!("{:.2}", optimized_kb),
                    extension = %optimized.extension,
                    "Image optimized"
                );
                optimized
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Image optimization failed, using original image");
                fallback(input, original_name)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Image optimization task failed, using original image");
                fallback(input, original_name)
            }
        }
    }
}

fn optimize_blocking(config: &ImageConfig, bytes: &[u8]) -> Result<OptimizedImage, OptimizeError> {
    let format = image::guess_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;

    tracing::debug!(
        width = img.width(),
        height = img.height(),
        format = ?format,
        "Decoded image"
    );

    let img = fit_within(img, config.max_width, config.max_height);

    if format == ImageFormat::Png {
        Ok(OptimizedImage {
            bytes: encode_png(&img, config.png_compression)?,
            extension: "png".to_string(),
        })
    } else {
        Ok(OptimizedImage {
            bytes: encode_progressive_jpeg(&img, config.jpeg_quality)?,
            extension: "jpg".to_string(),
        })
    }
}

/// Scale down to fit inside `max_width`x`max_height`, keeping the aspect
/// ratio. Images already inside the bound are returned unchanged.
fn fit_within(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    if img.width() <= max_width && img.height() <= max_height {
        return img;
    }

    tracing::debug!(
        width = img.width(),
        height = img.height(),
        max_width,
        max_height,
        "Resizing image"
    );
    img.resize(max_width, max_height, FilterType::Lanczos3)
}

fn encode_png(img: &DynamicImage, compression: PngCompression) -> Result<Vec<u8>, OptimizeError> {
    let compression = match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    };

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, compression, PngFilterType::Adaptive);
    img.write_with_encoder(encoder)?;
    Ok(out)
}

fn encode_progressive_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, OptimizeError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(OptimizeError::Dimensions(width, height)),
    };

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality.clamp(1, 100));
    encoder.set_progressive(true);
    encoder.encode(rgb.as_raw(), w, h, jpeg_encoder::ColorType::Rgb)?;
    Ok(out)
}

fn fallback(input: Arc<Vec<u8>>, original_name: Option<&str>) -> OptimizedImage {
    let extension = image::guess_format(&input)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .map(str::to_string)
        .or_else(|| {
            original_name
                .and_then(|name| std::path::Path::new(name).extension())
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
        })
        .unwrap_or_else(|| "jpg".to_string());

    let bytes = Arc::try_unwrap(input).unwrap_or_else(|shared| (*shared).clone());

    OptimizedImage { bytes, extension }
}
