//! Prompt templates for Shoptalk.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for answering questions against the transcript library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
    /// Rewrites a follow-up question into a standalone one.
    pub condense: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant specialized in information retrieval from woodworking video transcripts.
Always provide your responses in English, regardless of the language of the input or context.
When given transcript excerpts and a query:
1. Locate the sections of the excerpts that are relevant to the query.
2. Extract the most relevant information from those sections to form a concise and accurate answer.
3. Always include the exact relevant content from the transcript, starting from the beginning of the relevant section. Use quotation marks to denote direct quotes.
4. After providing the direct quote, summarize or explain the answer if necessary.
5. If the query cannot be answered from the given excerpts, state this clearly.
6. Always prioritize accuracy over speed. If you're not certain about an answer, say so.
7. For multi-part queries, address each part separately and clearly.
8. Provide the timestamp for where the information was found in the original video. Use the format {timestamp:MM:SS} for timestamps under an hour, and {timestamp:HH:MM:SS} for longer videos.
9. Do not include any URLs in your response. Just provide the timestamps in the specified format.
10. When referencing timestamps that may be inaccurate, you can use language like "around", "approximately", or "in the vicinity of" to indicate that the exact moment may vary slightly.
Remember, always respond in English, even if the query or context is in another language."#
                .to_string(),

            user: "Context: {{context}}\n\nChat History: {{chat_history}}\n\nQuestion: {{question}}"
                .to_string(),

            condense: r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{{chat_history}}
Follow Up Input: {{question}}
Standalone question:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
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

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
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

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
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
