//! Image decoding and the fixed input transform
//!
//! Every image goes through the same steps before reaching the network:
//! convert to RGB8, resize to 224x224 (aspect ratio is not preserved), scale
//! to `[0, 1]` in CHW layout, then normalize each channel with the ImageNet
//! mean and standard deviation.

use candle_core::{DType, Device, Tensor};
use image::imageops::FilterType;
use image::DynamicImage;
use phytoscan_core::{Error, Result};

/// Side length of the square network input
pub const INPUT_SIZE: u32 = 224;

/// Per-channel RGB mean
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel RGB standard deviation
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Deterministic resize + normalize transform
#[derive(Debug, Clone, Copy)]
pub struct ImageTransform {
    pub size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub filter: FilterType,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self::imagenet()
    }
}

impl ImageTransform {
    /// The transform the plant disease weights were trained with
    pub fn imagenet() -> Self {
        Self {
            size: INPUT_SIZE,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
            filter: FilterType::Triangle,
        }
    }

    /// Produce a `(3, size, size)` f32 tensor on `device`
    pub fn apply(&self, image: &DynamicImage, device: &Device) -> Result<Tensor> {
        let rgb = image.to_rgb8();
        let resized = image::imageops::resize(&rgb, self.size, self.size, self.filter);
        let side = self.size as usize;

        let pixels = Tensor::from_vec(resized.into_raw(), (side, side, 3), device)
            .map_err(|e| Error::inference(format!("Failed to create image tensor: {}", e)))?;

        let mean = Tensor::new(self.mean.as_slice(), device)
            .and_then(|t| t.reshape((3, 1, 1)))
            .map_err(|e| Error::inference(format!("Failed to create mean tensor: {}", e)))?;
        let std = Tensor::new(self.std.as_slice(), device)
            .and_then(|t| t.reshape((3, 1, 1)))
            .map_err(|e| Error::inference(format!("Failed to create std tensor: {}", e)))?;

        pixels
            .permute((2, 0, 1))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.affine(1.0 / 255.0, 0.0))
            .and_then(|t| t.broadcast_sub(&mean))
            .and_then(|t| t.broadcast_div(&std))
            .map_err(|e| Error::inference(format!("Failed to normalize image: {}", e)))
    }
}

/// Decode encoded image bytes and force them to RGB8.
///
/// Alpha and palette information is discarded.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::decode("image buffer is empty"));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::decode(format!("Failed to decode image: {}", e)))?;

    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}
