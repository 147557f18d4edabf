pub mod analyze_image_use_case;
pub mod encode_executor;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod pipeline_state;
pub mod summarize_video_use_case;
pub mod summary_pipeline;
