/// A compressed, size-bounded image ready for transmission.
///
/// Corresponds to exactly one sampled frame; `quality` records the setting
/// the payload was actually produced at.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedFrame {
    pub timestamp: f64,
    pub payload: Vec<u8>,
    pub mime_type: &'static str,
    pub quality: u8,
}

impl EncodedFrame {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
