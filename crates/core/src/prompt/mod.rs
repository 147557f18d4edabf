pub mod image_style;
pub mod instruction;
pub mod prompt_builder;
pub mod summary_style;
