//! Decode, resize and scale uploaded images

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::Array4;

use crate::error::Result;

/// Side length of the square model input
pub const INPUT_SIZE: u32 = 32;

/// Colour channels fed to the model (RGB)
pub const CHANNELS: usize = 3;

/// Converts encoded image bytes into a `(1, height, width, 3)` tensor
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    width: u32,
    height: u32,
    filter: FilterType,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            width: INPUT_SIZE,
            height: INPUT_SIZE,
            filter: FilterType::CatmullRom,
        }
    }
}

impl ImageNormalizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Use a different resampling filter
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Tensor shape produced by [`normalize`](Self::normalize), batch first
    pub fn input_shape(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, CHANNELS]
    }

    /// Decode `bytes` and produce the model input tensor.
    ///
    /// The format is detected from the content, not from any filename, so
    /// a payload that is not an image fails here with
    /// [`ClassifierError::ImageDecode`](crate::error::ClassifierError::ImageDecode).
    pub fn normalize(&self, bytes: &[u8]) -> Result<Array4<f32>> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(self.normalize_image(&decoded))
    }

    /// Normalize an already decoded image
    pub fn normalize_image(&self, img: &DynamicImage) -> Array4<f32> {
        let rgb = self.resize(img.to_rgb8());
        let [_, height, width, channels] = self.input_shape();

        Array4::from_shape_fn((1, height, width, channels), |(_, y, x, c)| {
            f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0
        })
    }

    fn resize(&self, rgb: RgbImage) -> RgbImage {
        if rgb.dimensions() == (self.width, self.height) {
            return rgb;
        }
        imageops::resize(&rgb, self.width, self.height, self.filter)
    }
}
