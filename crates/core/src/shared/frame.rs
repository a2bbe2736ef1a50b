use ndarray::ArrayView3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{actual} bytes cannot hold a {height}x{width}x{channels} frame ({expected} needed)")]
pub struct FrameSizeError {
    pub height: u16,
    pub width: u16,
    pub channels: u16,
    pub expected: usize,
    pub actual: usize,
}

/// A captured frame: interleaved pixel bytes in row-major order.
///
/// Dimensions are `u16` because that is what the wire header carries.
/// A frame is immutable once captured; whichever stage holds the value
/// owns it exclusively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    height: u16,
    width: u16,
    channels: u16,
}

impl Frame {
    /// # Panics
    ///
    /// If `data.len()` is not `height * width * channels`. Use
    /// [`try_new`](Self::try_new) for data of unknown size.
    pub fn new(data: Vec<u8>, height: u16, width: u16, channels: u16) -> Self {
        match Self::try_new(data, height, width, channels) {
            Ok(frame) => frame,
            Err(e) => panic!("data length must equal height * width * channels: {e}"),
        }
    }

    pub fn try_new(
        data: Vec<u8>,
        height: u16,
        width: u16,
        channels: u16,
    ) -> Result<Self, FrameSizeError> {
        let expected = Self::byte_len(height, width, channels);
        if data.len() != expected {
            return Err(FrameSizeError {
                height,
                width,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            height,
            width,
            channels,
        })
    }

    /// A frame of the given shape with every byte set to zero.
    pub fn zeroed(height: u16, width: u16, channels: u16) -> Self {
        Self::new(
            vec![0u8; Self::byte_len(height, width, channels)],
            height,
            width,
            channels,
        )
    }

    pub fn byte_len(height: u16, width: u16, channels: u16) -> usize {
        height as usize * width as usize * channels as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// `(height, width, channels)`, the order used on the wire.
    pub fn shape(&self) -> (u16, u16, u16) {
        (self.height, self.width, self.channels)
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        let (h, w, c) = self.shape();
        ArrayView3::from_shape((h as usize, w as usize, c as usize), &self.data)
            .expect("Frame data length must match dimensions")
    }
}
