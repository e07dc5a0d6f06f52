use std::sync::Arc;

use ndarray::{Array2, ArrayView3};

use crate::shared::rect::Rect;
use crate::shared::vision_error::VisionError;

/// A single image: contiguous bytes in row-major order, 1 or 3 channels.
///
/// Pixel storage is reference-counted so a frame can be handed to the
/// background detection worker without copying.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    /// Wraps a tightly packed buffer of `width * height * channels` bytes.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
    ) -> Result<Self, VisionError> {
        check_channels(channels)?;
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if data.len() != expected {
            return Err(VisionError::InvalidImage(format!(
                "buffer holds {} bytes, {width}x{height}x{channels} needs {expected}",
                data.len()
            )));
        }
        Ok(Self::from_parts(data, width, height, channels, index))
    }

    pub fn gray(data: Vec<u8>, width: u32, height: u32, index: usize) -> Result<Self, VisionError> {
        Self::new(data, width, height, 1, index)
    }

    /// Copies a caller-owned buffer whose rows may be padded to `stride` bytes.
    pub fn from_strided(
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        channels: u8,
        index: usize,
    ) -> Result<Self, VisionError> {
        check_channels(channels)?;
        let row_len = width as usize * channels as usize;
        if stride < row_len {
            return Err(VisionError::InvalidImage(format!(
                "stride {stride} is shorter than a row of {row_len} bytes"
            )));
        }
        let needed = if height == 0 {
            0
        } else {
            stride * (height as usize - 1) + row_len
        };
        if pixels.len() < needed {
            return Err(VisionError::InvalidImage(format!(
                "buffer holds {} bytes, {width}x{height}x{channels} needs {needed}",
                pixels.len()
            )));
        }
        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            data.extend_from_slice(&pixels[start..start + row_len]);
        }
        Ok(Self::from_parts(data, width, height, channels, index))
    }

    pub fn from_image(image: &image::DynamicImage, index: usize) -> Self {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        Self::from_parts(luma.into_raw(), width, height, 1, index)
    }

    /// Callers guarantee `data.len() == width * height * channels`.
    fn from_parts(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data[..])
            .expect("Frame data length must match dimensions")
    }

    /// Intensity plane; multi-channel frames are averaged per pixel.
    pub fn luma(&self) -> Array2<f32> {
        let pixels = self.as_ndarray();
        if self.channels == 1 {
            return pixels.index_axis(ndarray::Axis(2), 0).mapv(f32::from);
        }
        pixels.mapv(f32::from).mean_axis(ndarray::Axis(2)).unwrap_or_else(|| {
            Array2::zeros((self.height as usize, self.width as usize))
        })
    }

    /// Copies the part of the frame covered by `rect` (clipped to bounds).
    pub fn crop(&self, rect: &Rect) -> Frame {
        let r = rect.clamp_to(self.width, self.height);
        if r.is_empty() {
            return Frame::from_parts(Vec::new(), 0, 0, self.channels, self.index);
        }
        let ch = self.channels as usize;
        let row_len = r.width as usize * ch;
        let mut data = Vec::with_capacity(row_len * r.height as usize);
        for row in r.y as usize..r.bottom() as usize {
            let start = (row * self.width as usize + r.x as usize) * ch;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        Frame::from_parts(data, r.width as u32, r.height as u32, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

fn check_channels(channels: u8) -> Result<(), VisionError> {
    if channels != 1 && channels != 3 {
        return Err(VisionError::InvalidImage(format!(
            "unsupported channel count {channels}"
        )));
    }
    Ok(())
}
