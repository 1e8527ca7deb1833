//! Configuration settings for Ekko.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub chat: ChatSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for persisted indexes, summaries, and histories.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.ekko".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding backend selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI embeddings (default). Requires an API key; without one the
    /// vector tier reports itself unavailable and retrieval falls back.
    #[default]
    OpenAI,
    /// Deterministic content-hash vectors. Test/dev mode only; the
    /// vectors are reproducible but semantically meaningless.
    Hash,
    /// No embedding backend; the vector tier is always unavailable.
    None,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "hash" => Ok(EmbeddingProvider::Hash),
            "none" => Ok(EmbeddingProvider::None),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Hash => write!(f, "hash"),
            EmbeddingProvider::None => write!(f, "none"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, hash, none).
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of results returned by a search.
    pub top_k: u32,
    /// Segments selected for grounded chat context.
    pub context_segments: u32,
    /// Segments selected for agent chat context.
    pub agent_context_segments: u32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            context_segments: 8,
            agent_context_segments: 10,
        }
    }
}

/// Chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Completion model for chat, translation, and summaries.
    pub model: String,
    /// Maximum conversation turns retained per (media, user) key.
    pub history_limit: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            history_limit: 40,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::EkkoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ekko")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Initialize global tracing for an embedding application.
    ///
    /// Honors RUST_LOG when set; otherwise uses the configured log level.
    pub fn init_tracing(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("ekko={}", self.general.log_level)),
        );
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.dimensions, 384);
        assert_eq!(settings.chat.history_limit, 40);
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::OpenAI);
    }

    #[test]
    fn test_roundtrip_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.chat.model = "gpt-4.1".to_string();
        settings.embedding.provider = EmbeddingProvider::Hash;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.chat.model, "gpt-4.1");
        assert_eq!(loaded.embedding.provider, EmbeddingProvider::Hash);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("hash".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Hash);
        assert!("bogus".parse::<EmbeddingProvider>().is_err());
    }
}
