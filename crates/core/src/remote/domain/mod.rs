pub mod summary_request;
pub mod vision_model;
