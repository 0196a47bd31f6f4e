use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("empty frame: {width}x{height}")]
    Empty { width: usize, height: usize },
    #[error("buffer size mismatch: expected {expected} bytes for {width}x{height} RGB, got {got}")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },
}

/// An owned, decoded camera frame: height × width × 3 interleaved RGB bytes.
///
/// Frames are validated at construction and never mutated afterwards — every
/// transformation (see [`crate::enhance::enhance`]) produces a new frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a raw interleaved RGB buffer. Rejects empty rasters and buffers
    /// whose length does not match `width * height * 3`.
    pub fn from_rgb(width: usize, height: usize, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        let expected = width * height * 3;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                width,
                height,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw interleaved RGB bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn rgb_at(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let i = (y * self.width + x) * 3;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Luminance plane (ITU-R BT.601 weights, the same convention the
    /// original capture stack uses for RGB→gray).
    pub fn to_gray(&self) -> Gray {
        let mut data = Vec::with_capacity(self.width * self.height);
        for px in self.data.chunks_exact(3) {
            let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
            data.push(0.299 * r + 0.587 * g + 0.114 * b);
        }
        Gray {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// A single-channel grayscale plane with f32 intensities in [0, 255].
#[derive(Debug, Clone, PartialEq)]
pub struct Gray {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Gray {
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }
}
