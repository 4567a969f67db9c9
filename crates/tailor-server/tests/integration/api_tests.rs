use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use tailor_core::AppError;
use tailor_core::testutil::{MockExtractor, MockScraper};

use crate::common::{
    FAKE_PDF, JOB_URL, Part, SERVER_KEY, TestAppBuilder, body_bytes, body_json, create_session,
    json_request, multipart_request, send, setup_test_app, tailor_request,
};

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app();

    let response = send(
        &app.router,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["free_tier_used"], 0);
    assert_eq!(json["free_tier_limit"], 3);
    assert_eq!(json["sessions"], 0);
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = setup_test_app();

    let response = send(
        &app.router,
        Request::get("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/v1/tailor"].is_object());
    assert!(json["paths"]["/v1/sessions/{id}/export/pdf"].is_object());
    assert!(json["components"]["schemas"]["ResumeRecord"].is_object());
}

// ---------------------------------------------------------------------------
// Tailor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tailor_creates_session_on_free_tier() {
    let app = setup_test_app();

    let response = send(&app.router, tailor_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["record"]["personal_info"]["name"], "Jane Doe");
    assert_eq!(json["record"]["skills"], json!(["Python", "SQL", "Rust"]));
    assert_eq!(json["degraded"], false);
    assert!(json["reason"].is_null());
    assert_eq!(json["free_tier_remaining"], 2);

    // Free tier falls back to the server's own key for the default provider.
    let created = app.factory.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, tailor_core::Provider::Google);
    assert_eq!(created[0].1, SERVER_KEY);
    assert_eq!(app.scraper.urls.lock().unwrap().as_slice(), [JOB_URL]);
}

#[tokio::test]
async fn own_key_skips_free_tier() {
    let app = TestAppBuilder::new().free_tier_cap(0).build();

    let request = multipart_request(&[
        Part::file("resume", FAKE_PDF),
        Part::text("job_url", JOB_URL),
        Part::text("provider", "Anthropic"),
        Part::text("api_key", "user-key"),
    ]);
    let response = send(&app.router, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let created = app.factory.created.lock().unwrap().clone();
    assert_eq!(
        created,
        vec![(tailor_core::Provider::Anthropic, "user-key".to_string())]
    );
}

#[tokio::test]
async fn free_tier_exhaustion_returns_429() {
    let app = TestAppBuilder::new().free_tier_cap(1).build();

    assert_eq!(
        send(&app.router, tailor_request()).await.status(),
        StatusCode::OK
    );

    let response = send(&app.router, tailor_request()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["error"], "free_tier_exhausted");
    assert_eq!(
        json["message"],
        "Free trial limit reached (1/1). Please enter your own API key to continue."
    );
    // Rejected before any stage ran.
    assert_eq!(app.scraper.call_count(), 1);
}

#[tokio::test]
async fn blank_api_key_counts_as_free_tier() {
    let app = setup_test_app();

    let request = multipart_request(&[
        Part::file("resume", FAKE_PDF),
        Part::text("job_url", JOB_URL),
        Part::text("api_key", "   "),
    ]);
    let json = body_json(send(&app.router, request).await).await;

    assert_eq!(json["free_tier_remaining"], 2);
}

#[tokio::test]
async fn missing_fields_return_400() {
    let app = setup_test_app();

    let no_url = multipart_request(&[Part::file("resume", FAKE_PDF)]);
    let response = send(&app.router, no_url).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "bad_request");
    assert!(json["message"].as_str().unwrap().contains("job_url"));

    let no_resume = multipart_request(&[Part::text("job_url", JOB_URL)]);
    let response = send(&app.router, no_resume).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let empty_resume =
        multipart_request(&[Part::file("resume", b""), Part::text("job_url", JOB_URL)]);
    let response = send(&app.router, empty_resume).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing reached the pipeline.
    assert_eq!(app.scraper.call_count(), 0);
}

#[tokio::test]
async fn unsupported_provider_returns_400() {
    let app = setup_test_app();

    let request = multipart_request(&[
        Part::file("resume", FAKE_PDF),
        Part::text("job_url", JOB_URL),
        Part::text("provider", "cohere"),
    ]);
    let response = send(&app.router, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "config_error");
    assert!(json["message"].as_str().unwrap().contains("cohere"));
}

#[tokio::test]
async fn oversized_resume_returns_413() {
    let app = TestAppBuilder::new().max_upload_bytes(16).build();

    let big = vec![b'x'; 64];
    let request = multipart_request(&[Part::file("resume", &big), Part::text("job_url", JOB_URL)]);
    let response = send(&app.router, request).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error"], "payload_too_large");
}

#[tokio::test]
async fn unreadable_resume_returns_422() {
    let app = TestAppBuilder::new()
        .extractor(MockExtractor::failing())
        .build();

    let response = send(&app.router, tailor_request()).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "extraction_error");
    assert_eq!(app.scraper.call_count(), 0);
}

#[tokio::test]
async fn scrape_failure_returns_502() {
    let app = TestAppBuilder::new()
        .scraper(MockScraper::with_error(AppError::HttpError(
            "HTTP 403 Forbidden".into(),
        )))
        .build();

    let response = send(&app.router, tailor_request()).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "scrape_error");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("Failed to scrape job")
    );
    assert_eq!(app.factory.completer.call_count(), 0);
}

#[tokio::test]
async fn unusable_completion_is_degraded_not_an_error() {
    let app = TestAppBuilder::new()
        .completion("Sorry, I can't help with that.")
        .build();

    let response = send(&app.router, tailor_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["degraded"], true);
    assert!(json["reason"].as_str().unwrap().starts_with("Invalid JSON"));
    assert!(json["record"]["personal_info"].is_object());
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_session_returns_stored_record() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = send(
        &app.router,
        Request::get(format!("/v1/sessions/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["session_id"], id.as_str());
    assert_eq!(json["provider"], "google");
    assert_eq!(json["record"]["experience"][0]["company"], "Acme");
}

#[tokio::test]
async fn unknown_session_returns_404() {
    let app = setup_test_app();

    let response = send(
        &app.router,
        Request::get("/v1/sessions/00000000-0000-0000-0000-000000000000")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn skills_edit_splits_on_commas() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/v1/sessions/{id}/skills"),
            json!({ "text": "Python,  Go , ,Kubernetes" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["record"]["skills"], json!(["Python", "Go", "Kubernetes"]));
}

#[tokio::test]
async fn experience_points_edit() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/v1/sessions/{id}/experience/0/points"),
            json!({ "text": "Shipped a Rust service\n\n  Cut costs by 30%  \n" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["record"]["experience"][0]["points"],
        json!(["Shipped a Rust service", "Cut costs by 30%"])
    );
}

#[tokio::test]
async fn points_edit_out_of_range_returns_400() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/v1/sessions/{id}/projects/5/points"),
            json!({ "text": "anything" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "config_error");
}

#[tokio::test]
async fn project_points_edit() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    send(
        &app.router,
        json_request(
            "PUT",
            &format!("/v1/sessions/{id}"),
            json!({
                "personal_info": { "name": "Jane Doe" },
                "projects": [{ "title": "Inkwell", "points": ["old bullet"] }]
            }),
        ),
    )
    .await;

    let response = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/v1/sessions/{id}/projects/0/points"),
            json!({ "text": "Wrote a PDF renderer\nAdded SQL exports" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["record"]["projects"][0]["title"], "Inkwell");
    assert_eq!(
        json["record"]["projects"][0]["points"],
        json!(["Wrote a PDF renderer", "Added SQL exports"])
    );
}

#[tokio::test]
async fn replace_record_accepts_lenient_json() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/v1/sessions/{id}"),
            json!({
                "personal_info": { "name": "Jane Q. Doe", "phone": 5550100 },
                "skills": "Python"
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["record"]["personal_info"]["name"], "Jane Q. Doe");
    assert_eq!(json["record"]["personal_info"]["phone"], "5550100");
    assert_eq!(json["record"]["skills"], json!(["Python"]));
    assert_eq!(json["record"]["experience"], json!([]));
}

#[tokio::test]
async fn rerun_with_session_id_replaces_the_record() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    send(
        &app.router,
        json_request(
            "PUT",
            &format!("/v1/sessions/{id}/skills"),
            json!({ "text": "Haskell" }),
        ),
    )
    .await;

    let rerun = multipart_request(&[
        Part::file("resume", FAKE_PDF),
        Part::text("job_url", JOB_URL),
        Part::text("session_id", &id),
    ]);
    let response = send(&app.router, rerun).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["session_id"], id.as_str());
    assert_eq!(json["record"]["skills"], json!(["Python", "SQL", "Rust"]));

    let health = body_json(
        send(
            &app.router,
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await,
    )
    .await;
    assert_eq!(health["sessions"], 1);
}

#[tokio::test]
async fn rerun_with_unknown_session_id_returns_404() {
    let app = setup_test_app();

    let request = multipart_request(&[
        Part::file("resume", FAKE_PDF),
        Part::text("job_url", JOB_URL),
        Part::text("session_id", "00000000-0000-0000-0000-000000000000"),
    ]);
    let response = send(&app.router, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    // Nothing ran and the free tier is untouched.
    assert_eq!(app.scraper.call_count(), 0);
    assert_eq!(app.factory.completer.call_count(), 0);

    let bad = multipart_request(&[
        Part::file("resume", FAKE_PDF),
        Part::text("job_url", JOB_URL),
        Part::text("session_id", "not-a-uuid"),
    ]);
    assert_eq!(
        send(&app.router, bad).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn delete_session_discards_it() {
    let app = setup_test_app();
    let id = create_session(&app).await;
    let uri = format!("/v1/sessions/{id}");

    let response = send(
        &app.router,
        Request::delete(uri.as_str()).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app.router,
        Request::get(uri.as_str()).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app.router,
        Request::delete(uri.as_str()).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_cap_evicts_oldest() {
    let app = TestAppBuilder::new().max_sessions(2).build();

    let first = create_session(&app).await;
    for _ in 0..2 {
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        create_session(&app).await;
    }

    let health = body_json(
        send(
            &app.router,
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await,
    )
    .await;
    assert_eq!(health["sessions"], 2);

    let response = send(
        &app.router,
        Request::get(format!("/v1/sessions/{first}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn export_json_is_attachment() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    let response = send(
        &app.router,
        Request::get(format!("/v1/sessions/{id}/export/json"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"resume_data.json\""
    );
    let bytes = body_bytes(response).await;
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("{\n  \"executive_summary\""));
    let record = tailor_export::from_json(&text).unwrap();
    assert_eq!(record.personal_info.name, "Jane Doe");
}

#[tokio::test]
async fn export_pdf_reflects_edits() {
    let app = setup_test_app();
    let id = create_session(&app).await;

    send(
        &app.router,
        json_request(
            "PUT",
            &format!("/v1/sessions/{id}/skills"),
            json!({ "text": "Haskell" }),
        ),
    )
    .await;

    let response = send(
        &app.router,
        Request::get(format!("/v1/sessions/{id}/export/pdf"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"tailored_resume.pdf\""
    );

    let pdf = body_bytes(response).await;
    assert!(pdf.starts_with(b"%PDF-"));
    let lines = shown_text(&pdf);
    assert!(lines.iter().any(|line| line == "Jane Doe"));
    assert!(lines.iter().any(|line| line.contains("Haskell")));
    assert!(!lines.iter().any(|line| line.contains("Rust")));
}

/// Strings drawn with `Tj` on every page, in order.
fn shown_text(pdf: &[u8]) -> Vec<String> {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    let mut out = Vec::new();
    for page_id in doc.get_pages().values() {
        let content = doc.get_and_decode_page_content(*page_id).unwrap();
        for op in content.operations.iter().filter(|op| op.operator == "Tj") {
            if let Some(lopdf::Object::String(bytes, _)) = op.operands.first() {
                out.push(bytes.iter().map(|&b| char::from(b)).collect());
            }
        }
    }
    out
}
