//! Configuration management for Ekko.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, SummaryPrompts, TranslationPrompts};
pub use settings::{
    ChatSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings, RetrievalSettings,
    Settings,
};
