pub mod client;

pub use client::{CompletionOptions, LLMClient, LanguageModel};
