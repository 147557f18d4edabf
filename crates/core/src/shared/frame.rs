/// A single decoded picture: contiguous pixel bytes in row-major order.
///
/// The buffer is not validated on construction. Consumers that depend on
/// the layout (the encoder) check [`Frame::is_consistent`] themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        Self {
            data,
            width,
            height,
            channels,
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

    /// Byte length implied by the declared dimensions.
    pub fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * (self.channels as usize)
    }

    /// True when the buffer length matches `width * height * channels`.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.expected_len()
    }
}

/// A frame taken from a video at a known presentation time.
///
/// Produced by the sampler in strictly increasing timestamp order and
/// never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledFrame {
    pub timestamp: f64,
    pub image: Frame,
}

impl SampledFrame {
    pub fn new(timestamp: f64, image: Frame) -> Self {
        Self { timestamp, image }
    }
}
