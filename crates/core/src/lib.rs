pub mod encoding;
pub mod pipeline;
pub mod prompt;
pub mod remote;
pub mod shared;
pub mod video;
