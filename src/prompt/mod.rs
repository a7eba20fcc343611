pub mod engine;

pub use engine::{collect_answers, PromptOptions};
