//! Prompt templates for Ekko.
//!
//! Prompts can be customized by placing TOML files in a custom prompts
//! directory. Templates use `{{variable}}` placeholders.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chat: ChatPrompts,
    pub translation: TranslationPrompts,
    pub summary: SummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for the three chat modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub grounded: String,
    pub agent: String,
    pub general: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            grounded: r#"Answer the user question STRICTLY using the transcript context. Cite timestamps in brackets.
Question: {{question}}
Context:
{{context}}
Answer:"#
                .to_string(),

            agent: r#"You are a helpful expert assistant answering questions about a media transcript.
Use ONLY the provided transcript snippets as factual source. If the answer isn't in them, say you don't know.
Cite timestamps in square brackets where relevant. Be concise.
Transcript Snippets:
{{context}}

Conversation So Far (recent turns):
{{history}}

User Question: {{question}}
Answer:"#
                .to_string(),

            general: r#"You are a helpful, detailed AI assistant. Answer the user.
If a transcript context is provided, prefer facts from it; otherwise use general knowledge.
Keep answers concise but informative.

Transcript Context (optional):
{{digest}}

Conversation So Far:
{{history}}

User: {{question}}
Assistant:"#
                .to_string(),
        }
    }
}

/// Prompt for full-transcript translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationPrompts {
    pub user: String,
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        Self {
            user: r#"Translate the following transcript into {{language}} (natural, conversational).
Preserve meaning, names, numbers. Output ONLY the translated text, no preface.

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

/// Prompt for structured summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: "Return strict JSON with keys: summary_short, summary_detailed, \
                     key_highlights (array), sentiment (positive|negative|neutral), \
                     action_points (array)."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from defaults, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }

            let translation_path = custom_path.join("translation.toml");
            if translation_path.exists() {
                let content = std::fs::read_to_string(&translation_path)?;
                prompts.translation = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a template with both provided and custom config variables.
    /// Provided variables take precedence.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
