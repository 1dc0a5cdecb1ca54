// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode uploads, resize, convert to normalised classifier
// tensors, and encode results as PNG bytes or data URIs. Operates on
// in-memory images using the `image` crate.

use base64::{Engine, engine::general_purpose::STANDARD};
use docmask_core::error::DocmaskError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::{debug, instrument};

/// Per-channel mean and standard deviation applied when building tensors.
const NORMALISE_MEAN: f32 = 0.5;
const NORMALISE_STD: f32 = 0.5;

/// Dense `f32` tensor in NCHW layout, ready for a vision classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    /// `[batch, channels, height, width]`.
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

/// Image processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, enabling
/// method chaining:
///
/// ```ignore
/// let tensor = ImageProcessor::from_bytes(&upload)?.to_tensor(224);
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, BMP, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocmaskError> {
        let img = image::load_from_memory(data)
            .map_err(|err| DocmaskError::decode("image", format!("failed to decode image: {err}")))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Wrap an RGB buffer.
    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the image as 8-bit RGB.
    pub fn into_rgb8(self) -> RgbImage {
        self.image.into_rgb8()
    }

    // -- Transformations ------------------------------------------------------

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    /// Bilinear filtering, matching the classifier's training transform.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        let resized = self.image.resize_exact(width, height, FilterType::Triangle);
        Self { image: resized }
    }

    /// Resize to `size` x `size` and normalise every RGB channel to
    /// `(v / 255 - 0.5) / 0.5`, i.e. into `[-1, 1]`.
    #[instrument(skip(self), fields(size))]
    pub fn to_tensor(self, size: u32) -> ImageTensor {
        let rgb = self.resize_exact(size, size).into_rgb8();
        let (width, height) = rgb.dimensions();
        let (width, height) = (width as usize, height as usize);
        let plane = width * height;

        let mut data = vec![0.0f32; 3 * plane];
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let offset = y as usize * width + x as usize;
            for channel in 0..3 {
                let value = pixel.0[channel] as f32 / 255.0;
                data[channel * plane + offset] = (value - NORMALISE_MEAN) / NORMALISE_STD;
            }
        }

        ImageTensor {
            shape: [1, 3, height, width],
            data,
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, DocmaskError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| DocmaskError::Image(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode as a `data:image/png;base64,...` URI.
    pub fn to_png_data_uri(&self) -> Result<String, DocmaskError> {
        let png = self.to_png_bytes()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}
