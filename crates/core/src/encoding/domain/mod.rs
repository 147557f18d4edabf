pub mod encoded_frame;
pub mod frame_encoder;
