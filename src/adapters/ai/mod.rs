//! Language-model adapters.

mod mock;
mod openai;

pub use mock::MockLanguageModel;
pub use openai::OpenAiModel;
