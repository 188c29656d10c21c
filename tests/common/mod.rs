//! Shared fixtures for the API tests: deterministic models and an in-memory app.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use http_body_util::BodyExt;
use shoptalk::config::{Prompts, Settings};
use shoptalk::contact::ContactStore;
use shoptalk::embedding::Embedder;
use shoptalk::llm::{ChatMessage, ChatModel};
use shoptalk::orchestrator::Orchestrator;
use shoptalk::server;
use shoptalk::vector_store::MemoryVectorStore;
use shoptalk::{Result, ShoptalkError};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

pub const VOCAB: [&str; 6] = ["oak", "maple", "chisel", "saw", "finish", "glue"];

/// Embeds text as vocabulary word counts.
pub struct KeywordEmbedder;

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
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }
}

/// Always answers with the same text, or fails when no answer is set.
pub struct FixedModel {
    answer: Option<String>,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FixedModel {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for FixedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.answer
            .clone()
            .ok_or_else(|| ShoptalkError::Llm("model unavailable".to_string()))
    }
}

/// Build the API over an in-memory store with every index created.
pub async fn test_app(model: Arc<FixedModel>) -> Router {
    let mut settings = Settings::default();
    settings.vector_store.provider = "memory".to_string();

    let orchestrator = Orchestrator::with_components(
        settings,
        Prompts::default(),
        Arc::new(KeywordEmbedder),
        model,
        Arc::new(MemoryVectorStore::new()),
        Arc::new(ContactStore::in_memory().unwrap()),
    );
    orchestrator.ensure_indexes().await.unwrap();

    server::router(orchestrator.app_state())
}

pub async fn json_body(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A minimal `.docx` with one paragraph per line.
pub fn docx(lines: &[&str]) -> Vec<u8> {
    let body: String = lines
        .iter()
        .map(|l| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", l))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

pub const BOUNDARY: &str = "shoptalk-test-boundary";

/// A part of a multipart form body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode a `multipart/form-data` body using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
