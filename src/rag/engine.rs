//! The chat pipeline: retrieve, generate, link timestamps, recommend products.

use super::context::{format_context_for_prompt, SourceChunk};
use super::{partition_products, process_answer, ChatHistory, RelatedProduct, VideoLinks};
use crate::config::{IndexSettings, Prompts, RagSettings};
use crate::embedding::Embedder;
use crate::error::{Result, ShoptalkError};
use crate::llm::{ChatMessage, ChatModel};
use crate::vector_store::VectorStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// A question from the chat frontend.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
    /// Transcript index to search.
    pub selected_index: String,
    /// Flat list of alternating past questions and answers.
    #[serde(default)]
    pub chat_history: Vec<String>,
}

/// The answer returned to the chat frontend.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Answer text with `[videoN]` placeholders.
    pub response: String,
    /// Products, tag matches first.
    pub related_products: Vec<RelatedProduct>,
    /// Video URL of the best-matching transcript chunk; `None` when nothing was retrieved.
    pub url: Option<String>,
    /// Texts of the retrieved chunks.
    pub context: Vec<String>,
    /// Placeholder → timestamped URL.
    pub video_links: VideoLinks,
}

/// Answers questions against the transcript indexes.
pub struct ChatEngine {
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    vector_store: Arc<dyn VectorStore>,
    indexes: IndexSettings,
    settings: RagSettings,
    prompts: Prompts,
}

impl ChatEngine {
    /// Create a new chat engine.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
        vector_store: Arc<dyn VectorStore>,
        indexes: IndexSettings,
        settings: RagSettings,
    ) -> Self {
        Self {
            embedder,
            model,
            vector_store,
            indexes,
            settings,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer a chat request.
    #[instrument(skip(self, request), fields(index = %request.selected_index))]
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if !self.indexes.is_transcript_index(&request.selected_index) {
            return Err(ShoptalkError::InvalidIndex(request.selected_index.clone()));
        }

        info!("Processing question: {}", request.message);

        let history = ChatHistory::from_flat(&request.chat_history);
        debug!("Chat history has {} turns", history.len());

        let question = self.standalone_question(&request.message, &history).await?;
        let sources = self.retrieve(&request.selected_index, &question).await?;
        let answer = self.generate(&question, &history, &sources).await?;

        // A chunk without a URL still links, against an empty base
        let url = sources.first().map(|s| s.url.clone());
        let processed = process_answer(&answer, url.as_deref())?;
        debug!("Processed answer with {} video links", processed.video_links.len());

        // Products are matched against what was said, not what was asked
        let related_products = self.related_products(&processed.text).await?;

        Ok(ChatResponse {
            response: processed.text,
            related_products,
            url,
            context: sources.into_iter().map(|s| s.text).collect(),
            video_links: processed.video_links,
        })
    }

    /// Rewrite a follow-up into a standalone question when there is history.
    async fn standalone_question(&self, question: &str, history: &ChatHistory) -> Result<String> {
        if history.is_empty() || !self.settings.condense_question {
            return Ok(question.to_string());
        }

        let mut vars = HashMap::new();
        vars.insert("chat_history".to_string(), history.render());
        vars.insert("question".to_string(), question.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.rag.condense, &vars);

        let rewritten = self.model.complete(&[ChatMessage::user(prompt)]).await?;
        let rewritten = rewritten.trim();
        debug!("Standalone question: {}", rewritten);

        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(rewritten.to_string())
        }
    }

    async fn retrieve(&self, index: &str, question: &str) -> Result<Vec<SourceChunk>> {
        let embedding = self.embedder.embed(question).await?;
        let matches = self
            .vector_store
            .query(index, &embedding, self.settings.top_k)
            .await?;
        debug!("Retrieved {} chunks from {}", matches.len(), index);
        Ok(matches.into_iter().map(SourceChunk::from).collect())
    }

    async fn generate(
        &self,
        question: &str,
        history: &ChatHistory,
        sources: &[SourceChunk],
    ) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(sources));
        vars.insert("chat_history".to_string(), history.render());
        vars.insert("question".to_string(), question.to_string());

        let user_prompt = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);
        let system_prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.system, &HashMap::new());

        let answer = self
            .model
            .complete(&[ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)])
            .await?;

        if answer.trim().is_empty() {
            return Err(ShoptalkError::Chat("Model returned an empty answer".to_string()));
        }
        Ok(answer)
    }

    /// Look up products near the answer and order them by tag match.
    ///
    /// A failing product query yields no products rather than failing the chat.
    async fn related_products(&self, answer: &str) -> Result<Vec<RelatedProduct>> {
        let embedding = self.embedder.embed(answer).await?;

        let matches = match self
            .vector_store
            .query(&self.indexes.products, &embedding, self.settings.product_top_k)
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                error!("Error querying product index {}: {}", self.indexes.products, e);
                Vec::new()
            }
        };

        let products = matches
            .iter()
            .map(|m| RelatedProduct::from_metadata(&m.metadata))
            .collect();

        Ok(partition_products(answer, products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::vector_store::{IndexSpec, Metadata, MemoryVectorStore, Metric, Record};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const VOCAB: [&str; 4] = ["oak", "maple", "chisel", "saw"];

    /// Counts vocabulary words; close enough to semantics for ranking tests.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(VOCAB
                .iter()
                .map(|w| lower.matches(w).count() as f32 + 0.01)
                .collect())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            VOCAB.len()
        }
    }

    /// Replays scripted replies and records every prompt.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ShoptalkError::Llm("no scripted reply".to_string()))
        }
    }

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    async fn seeded_store() -> Arc<MemoryVectorStore> {
        let store = Arc::new(MemoryVectorStore::new());
        for name in ["bents", "bents-woodworking-products"] {
            store
                .create_index(&IndexSpec {
                    name: name.to_string(),
                    dimension: VOCAB.len(),
                    metric: Metric::Cosine,
                })
                .await
                .unwrap();
        }

        let embedder = KeywordEmbedder;
        let chunk = |id: &str, text: &str, url: &str| {
            (id.to_string(), text.to_string(), url.to_string())
        };
        for (id, text, url) in [
            chunk("Oak Table_chunk_0", "We finish oak with oil.", "https://youtu.be/oak"),
            chunk("Saw Sled_chunk_0", "The saw sled keeps cuts square.", "https://youtu.be/sled?si=1"),
        ] {
            let values = embedder.embed(&text).await.unwrap();
            store
                .upsert(
                    "bents",
                    &[Record::new(
                        id.clone(),
                        values,
                        meta(&[
                            ("title", id.as_str()),
                            ("text", text.as_str()),
                            ("url", url.as_str()),
                            ("chunk_id", id.as_str()),
                        ]),
                    )],
                )
                .await
                .unwrap();
        }

        for (id, title, tags) in [("p1", "Maple Board", "maple"), ("p2", "Chisel Kit", "oak, chisel")] {
            let values = embedder.embed(tags).await.unwrap();
            store
                .upsert(
                    "bents-woodworking-products",
                    &[Record::new(
                        id,
                        values,
                        meta(&[("title", title), ("tags", tags), ("link", "https://shop.example")]),
                    )],
                )
                .await
                .unwrap();
        }

        store
    }

    fn engine(store: Arc<MemoryVectorStore>, model: Arc<ScriptedModel>) -> ChatEngine {
        let settings = RagSettings {
            top_k: 1,
            ..RagSettings::default()
        };
        ChatEngine::new(
            Arc::new(KeywordEmbedder),
            model,
            store,
            IndexSettings::default(),
            settings,
        )
    }

    fn request(message: &str, history: &[&str]) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            selected_index: "bents".to_string(),
            chat_history: history.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_chat_pipeline() {
        let store = seeded_store().await;
        let model = Arc::new(ScriptedModel::new(&[
            "Wipe on oil for an oak finish {timestamp:1:05}, again at {timestamp:01:05}.",
        ]));
        let engine = engine(store, model.clone());

        let response = engine.chat(&request("How do I finish oak?", &[])).await.unwrap();

        assert_eq!(
            response.response,
            "Wipe on oil for an oak finish [video0], again at [video0]."
        );
        assert_eq!(response.video_links.len(), 1);
        assert_eq!(
            response.video_links.get("[video0]"),
            Some("https://youtu.be/oak?t=65")
        );
        assert_eq!(response.url.as_deref(), Some("https://youtu.be/oak"));
        assert_eq!(response.context, vec!["We finish oak with oil.".to_string()]);

        let titles: Vec<&str> = response
            .related_products
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Chisel Kit", "Maple Board"]);

        // No history: a single generation call with system + user prompts
        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].role, Role::System);
        assert!(calls[0][1].content.contains("Context: We finish oak with oil."));
        assert!(calls[0][1].content.ends_with("Question: How do I finish oak?"));
    }

    #[tokio::test]
    async fn test_follow_up_is_condensed_before_retrieval() {
        let store = seeded_store().await;
        let model = Arc::new(ScriptedModel::new(&[
            "How do I keep saw cuts square?",
            "Use a sled {timestamp:0:30}.",
        ]));
        let engine = engine(store, model.clone());

        let response = engine
            .chat(&request(
                "And for crosscuts?",
                &["How do I finish oak?", "Use oil.", "dangling"],
            ))
            .await
            .unwrap();

        assert_eq!(response.context, vec!["The saw sled keeps cuts square.".to_string()]);
        assert_eq!(
            response.video_links.get("[video0]"),
            Some("https://youtu.be/sled?si=1&t=30")
        );

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0][0].content.contains("Human: How do I finish oak?\nAssistant: Use oil."));
        assert!(!calls[0][0].content.contains("dangling"));
        assert!(calls[1][1].content.contains("Question: How do I keep saw cuts square?"));
    }

    #[tokio::test]
    async fn test_unknown_index_rejected() {
        let store = seeded_store().await;
        let engine = engine(store, Arc::new(ScriptedModel::new(&[])));

        let mut req = request("Anything?", &[]);
        req.selected_index = "bents-woodworking-products".to_string();
        let err = engine.chat(&req).await.unwrap_err();
        assert!(matches!(err, ShoptalkError::InvalidIndex(_)));
    }

    #[tokio::test]
    async fn test_missing_product_index_yields_no_products() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .create_index(&IndexSpec {
                name: "bents".to_string(),
                dimension: VOCAB.len(),
                metric: Metric::Cosine,
            })
            .await
            .unwrap();

        let engine = engine(store, Arc::new(ScriptedModel::new(&["Nothing found {timestamp:1:00}."])));
        let response = engine.chat(&request("oak?", &[])).await.unwrap();

        assert!(response.related_products.is_empty());
        assert!(response.context.is_empty());
        assert_eq!(response.url, None);
        // Nothing to link against without a source
        assert_eq!(response.response, "Nothing found {timestamp:1:00}.");
    }

    #[tokio::test]
    async fn test_malformed_timestamp_fails_chat() {
        let store = seeded_store().await;
        let engine = engine(store, Arc::new(ScriptedModel::new(&["See {timestamp:1:2:3:4}"])));
        let err = engine.chat(&request("oak?", &[])).await.unwrap_err();
        assert!(matches!(err, ShoptalkError::TimestampFormat(_)));
    }

    #[tokio::test]
    async fn test_source_without_url_still_links_and_validates() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .create_index(&IndexSpec {
                name: "bents".to_string(),
                dimension: VOCAB.len(),
                metric: Metric::Cosine,
            })
            .await
            .unwrap();
        store
            .upsert(
                "bents",
                &[Record::new(
                    "c0",
                    vec![1.0, 0.0, 0.0, 0.0],
                    meta(&[("title", "Oak Table"), ("text", "Oil the oak."), ("url", "")]),
                )],
            )
            .await
            .unwrap();

        let engine_ok = engine(store.clone(), Arc::new(ScriptedModel::new(&["Oil it {timestamp:1:05}."])));
        let response = engine_ok.chat(&request("oak?", &[])).await.unwrap();
        assert_eq!(response.url.as_deref(), Some(""));
        assert_eq!(response.response, "Oil it [video0].");
        assert_eq!(response.video_links.get("[video0]"), Some("?t=65"));

        let engine_bad = engine(store, Arc::new(ScriptedModel::new(&["Oil it {timestamp:1:2:3:4}."])));
        let err = engine_bad.chat(&request("oak?", &[])).await.unwrap_err();
        assert!(matches!(err, ShoptalkError::TimestampFormat(_)));
    }
}
