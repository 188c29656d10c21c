//! HTTP API consumed by the chat and catalog frontends.

use crate::catalog::{parse_tags, ProductCatalog};
use crate::config::{IndexSettings, ServerSettings};
use crate::contact::{Contact, ContactForm, ContactStore};
use crate::document::is_docx_filename;
use crate::ingest::TranscriptIngestor;
use crate::rag::{ChatEngine, ChatRequest};
use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared application state.
pub struct AppState {
    pub chat: ChatEngine,
    pub catalog: ProductCatalog,
    pub ingestor: TranscriptIngestor,
    pub contacts: Arc<ContactStore>,
    pub indexes: IndexSettings,
    pub server: ServerSettings,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.server.cors_origins);
    let body_limit = state.server.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/upload_document", post(upload_document))
        .route("/documents", get(list_documents))
        .route("/add_document", post(add_document))
        .route("/delete_document", post(delete_document))
        .route("/update_document", post(update_document))
        .route("/contact", post(contact))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AddDocumentRequest {
    title: String,
    tags: String,
    link: String,
}

#[derive(Deserialize)]
struct DeleteDocumentRequest {
    id: String,
}

#[derive(Deserialize)]
struct UpdateDocumentRequest {
    id: String,
    title: String,
    tags: String,
    link: String,
}

#[derive(Serialize)]
struct ProductSaved {
    success: bool,
    product_id: String,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ContactReceived {
    message: &'static str,
    data: Contact,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

fn upload_rejected(message: &'static str) -> Response {
    debug!("Upload rejected: {}", message);
    Json(UploadResponse {
        success: false,
        message,
    })
    .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    const CHAT_FAILED: &str = "An error occurred processing your request";

    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => {
            error!("Error in chat route: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, CHAT_FAILED);
        }
    };

    match state.chat.chat(&req).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!("Error in chat route: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, CHAT_FAILED)
        }
    }
}

/// Fields collected from an upload form.
#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    index_name: Option<String>,
    url: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                form.file = Some((filename, bytes.to_vec()));
            }
            "index_name" => {
                form.index_name = Some(field.text().await.map_err(|e| e.to_string())?);
            }
            "url" => {
                form.url = Some(field.text().await.map_err(|e| e.to_string())?);
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn upload_document(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // A request that is not a multipart form has no file part either
    let form = match multipart {
        Ok(m) => match read_upload_form(m).await {
            Ok(form) => form,
            Err(e) => {
                error!("Failed to read upload: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e);
            }
        },
        Err(_) => UploadForm::default(),
    };

    let Some((filename, bytes)) = form.file else {
        return upload_rejected("No file part");
    };
    if filename.is_empty() {
        return upload_rejected("No selected file");
    }

    let index_name = form.index_name.unwrap_or_default();
    if !state.indexes.is_transcript_index(&index_name) {
        return upload_rejected("Invalid index name");
    }

    if !is_docx_filename(&filename) {
        return upload_rejected("Invalid file format");
    }

    match state.ingestor.ingest(&index_name, &bytes, form.url).await {
        Ok(result) => {
            info!(
                "Uploaded {} ({} chunks) into {}",
                result.title, result.chunks_indexed, index_name
            );
            Json(UploadResponse {
                success: true,
                message: "File uploaded and processed successfully",
            })
            .into_response()
        }
        Err(e) => {
            error!("Error processing {}: {}", filename, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn list_documents(State(state): State<Arc<AppState>>) -> Response {
    match state.catalog.list().await {
        Ok(products) => Json(products).into_response(),
        Err(e) => {
            error!("Error listing products: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn add_document(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddDocumentRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
    };

    match state
        .catalog
        .add(&req.title, &parse_tags(&req.tags), &req.link)
        .await
    {
        Ok(product_id) => Json(ProductSaved {
            success: true,
            product_id,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeleteDocumentRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
    };

    match state.catalog.delete(&req.id).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateDocumentRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
    };

    match state
        .catalog
        .update(&req.id, &req.title, &parse_tags(&req.tags), &req.link)
        .await
    {
        Ok(product_id) => Json(ProductSaved {
            success: true,
            product_id,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn contact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Response {
    let saved = match payload {
        Ok(Json(form)) => state.contacts.save(&form).map_err(|e| e.to_string()),
        Err(e) => Err(e.body_text()),
    };

    match saved {
        Ok(data) => Json(ContactReceived {
            message: "Message received successfully!",
            data,
        })
        .into_response(),
        Err(e) => {
            error!("Error saving contact data: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "An error occurred while processing your request." })),
            )
                .into_response()
        }
    }
}
