//! Image provider adapters.

mod mock;
mod openai_images;

pub use mock::{MockImageFailure, MockImageGenerator};
pub use openai_images::{OpenAiImageConfig, OpenAiImageGenerator};
