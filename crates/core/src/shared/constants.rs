/// Spacing between sampled frames when the caller does not choose one.
pub const DEFAULT_INTERVAL_SECONDS: f64 = 2.0;

/// Upper bound on timestamps scheduled for one source. Denser schedules are
/// rejected before any frame is decoded.
pub const MAX_SAMPLED_FRAMES: usize = 10_000;

/// Frames wider than this are downscaled before encoding.
pub const DEFAULT_MAX_WIDTH: u32 = 512;

pub const DEFAULT_JPEG_QUALITY: u8 = 85;
pub const MIN_JPEG_QUALITY: u8 = 20;
pub const JPEG_QUALITY_STEP: u8 = 10;

/// Upper bound for a single encoded payload (1 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const COUNT_MAX_TOKENS: u32 = 200;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "gif", "pbm", "pgm", "ppm",
];
