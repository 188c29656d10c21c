//! Router tests for the HTTP API.
//!
//! Every route is driven end to end over an in-memory vector store with a
//! keyword embedder and a canned chat model.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{docx, json_body, multipart_body, test_app, FixedModel, Part, BOUNDARY};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload_document")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, json_body(response.into_body()).await)
}

async fn add_product(app: &Router, title: &str, tags: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/add_document",
            json!({ "title": title, "tags": tags, "link": format!("https://shop.example/{}", title) }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    body["product_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app(Arc::new(FixedModel::answering("unused"))).await;
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_upload_then_chat() {
    let model = Arc::new(FixedModel::answering(
        "Wipe on oil to finish oak {timestamp:01:05} and again {timestamp:1:05}.",
    ));
    let app = test_app(model.clone()).await;

    let transcript = docx(&[
        "Oak Table Finish",
        "https://youtu.be/oak",
        "Finish the oak with oil, then wax it the next day.",
    ]);
    let (status, body) = send(
        &app,
        post_form(&[
            Part::Text("index_name", "bents"),
            Part::File("file", "oak-table.docx", &transcript),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "message": "File uploaded and processed successfully" })
    );

    add_product(&app, "Glue Pot", "glue").await;
    add_product(&app, "Oak Oil", "oak, finish").await;

    let (status, body) = send(
        &app,
        post_json(
            "/chat",
            json!({ "message": "How do I finish oak?", "selected_index": "bents" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        json!("Wipe on oil to finish oak [video0] and again [video0].")
    );
    assert_eq!(
        body["video_links"],
        json!({ "[video0]": "https://youtu.be/oak?t=65" })
    );
    assert_eq!(body["url"], json!("https://youtu.be/oak"));

    let context = body["context"].as_array().unwrap();
    assert_eq!(context.len(), 1);
    assert!(context[0].as_str().unwrap().contains("Finish the oak with oil"));

    let products = body["related_products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["title"], json!("Oak Oil"));
    assert_eq!(products[0]["tags"], json!("oak, finish"));
    assert_eq!(products[1]["title"], json!("Glue Pot"));

    // The retrieved transcript reaches the model
    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0][1].content.contains("Finish the oak with oil"));
}

#[tokio::test]
async fn test_chat_failures_return_generic_error() {
    let generic = json!({ "error": "An error occurred processing your request" });

    let app = test_app(Arc::new(FixedModel::failing())).await;
    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "Hi", "selected_index": "bents" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, generic);

    let app = test_app(Arc::new(FixedModel::answering("ok"))).await;
    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "Hi", "selected_index": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, generic);

    let (status, body) = send(&app, post_json("/chat", json!({ "selected_index": "bents" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, generic);
}

#[tokio::test]
async fn test_upload_validation_messages() {
    let app = test_app(Arc::new(FixedModel::answering("unused"))).await;
    let transcript = docx(&["Title", "Body"]);

    let cases: Vec<(Vec<Part<'_>>, &str)> = vec![
        (vec![Part::Text("index_name", "bents")], "No file part"),
        (
            vec![Part::Text("index_name", "bents"), Part::File("file", "", b"")],
            "No selected file",
        ),
        (
            vec![
                Part::Text("index_name", "bents-woodworking-products"),
                Part::File("file", "t.docx", &transcript),
            ],
            "Invalid index name",
        ),
        (
            vec![Part::File("file", "t.docx", &transcript)],
            "Invalid index name",
        ),
        (
            vec![
                Part::Text("index_name", "bents"),
                Part::File("file", "notes.txt", b"plain text"),
            ],
            "Invalid file format",
        ),
    ];

    for (parts, message) in cases {
        let (status, body) = send(&app, post_form(&parts)).await;
        assert_eq!(status, StatusCode::OK, "{}", message);
        assert_eq!(body, json!({ "success": false, "message": message }));
    }

    // Not a form at all
    let (status, body) = send(&app, post_json("/upload_document", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": false, "message": "No file part" }));
}

#[tokio::test]
async fn test_upload_corrupt_docx_is_server_error() {
    let app = test_app(Arc::new(FixedModel::answering("unused"))).await;
    let (status, body) = send(
        &app,
        post_form(&[
            Part::Text("index_name", "shop-improvement"),
            Part::File("file", "broken.docx", b"not a zip archive"),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("docx"));
}

#[tokio::test]
async fn test_product_lifecycle() {
    let app = test_app(Arc::new(FixedModel::answering("unused"))).await;

    let (status, body) = send(&app, get("/documents")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let id = add_product(&app, "Chisel Set", " chisel , oak ,").await;

    let (_, body) = send(&app, get("/documents")).await;
    assert_eq!(
        body,
        json!([[id, "Chisel Set", "chisel, oak", "https://shop.example/Chisel Set", ""]])
    );

    let (status, body) = send(
        &app,
        post_json(
            "/update_document",
            json!({ "id": id, "title": "Chisel Set Pro", "tags": "chisel", "link": "https://shop.example/pro" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let new_id = body["product_id"].as_str().unwrap().to_string();
    assert_ne!(new_id, id);

    let (_, body) = send(&app, get("/documents")).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0][0], json!(new_id));
    assert_eq!(listed[0][1], json!("Chisel Set Pro"));

    let (status, body) = send(&app, post_json("/delete_document", json!({ "id": new_id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, body) = send(&app, get("/documents")).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_product_request_missing_fields() {
    let app = test_app(Arc::new(FixedModel::answering("unused"))).await;
    let (status, body) = send(&app, post_json("/add_document", json!({ "title": "No tags" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = test_app(Arc::new(FixedModel::answering("unused"))).await;

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/chat")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(preflight("http://localhost:5173"))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );

    let response = app.oneshot(preflight("https://elsewhere.example")).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

async fn upload_without_url(app: &Router) {
    let transcript = docx(&["Oak Table Finish", "Finish the oak with oil."]);
    let (status, body) = send(
        app,
        post_form(&[
            Part::Text("index_name", "bents"),
            Part::File("file", "oak.docx", &transcript),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn test_chat_over_transcript_without_url() {
    let app = test_app(Arc::new(FixedModel::answering("Oil the oak {timestamp:1:05}."))).await;
    upload_without_url(&app).await;

    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "oak?", "selected_index": "bents" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], json!(""));
    assert_eq!(body["response"], json!("Oil the oak [video0]."));
    assert_eq!(body["video_links"], json!({ "[video0]": "?t=65" }));
}

#[tokio::test]
async fn test_malformed_timestamp_without_url_is_server_error() {
    let app = test_app(Arc::new(FixedModel::answering(
        "Oil the oak {timestamp:1:05} and {timestamp:1:2:3:4}.",
    )))
    .await;
    upload_without_url(&app).await;

    let (status, body) = send(
        &app,
        post_json("/chat", json!({ "message": "oak?", "selected_index": "bents" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "An error occurred processing your request" }));
}

#[tokio::test]
async fn test_contact_form() {
    let app = test_app(Arc::new(FixedModel::answering("unused"))).await;

    let (status, body) = send(
        &app,
        post_json(
            "/contact",
            json!({
                "name": "Ada",
                "email": "ada@example.com",
                "subject": "Bench plans",
                "message": "Do you sell the workbench plans?"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Message received successfully!"));
    assert_eq!(body["data"]["id"], json!(1));
    assert_eq!(body["data"]["email"], json!("ada@example.com"));
    assert_eq!(body["data"]["subject"], json!("Bench plans"));
    assert!(body["data"]["created_at"].is_string());

    let failed = json!({ "message": "An error occurred while processing your request." });
    for bad in [json!({ "name": "Ada" }), json!({ "name": "", "email": "a@b.c", "message": "Hi" })] {
        let (status, body) = send(&app, post_json("/contact", bad)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, failed);
    }
}
