pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analyses", post(handlers::handle_create_analysis))
        .route("/api/v1/analyses/:id", get(handlers::handle_get_analysis))
        .route(
            "/api/v1/analyses/:id/candidates/:candidate_id/preview",
            get(handlers::handle_candidate_preview),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::AnalystDirectory;
    use crate::models::candidate::{Assessment, CandidateRecord};
    use crate::screening::batch::BatchOutcome;
    use crate::screening::extract::{DOCX_MIME, PDF_MIME};
    use crate::screening::registry::BatchRegistry;
    use crate::screening::test_support::{
        canned_response, docx_document, pdf_with_text, MemoryStore, StubEvaluator,
    };

    const BOUNDARY: &str = "----screener-test-boundary-7MA4YWxkTrZu0gW";

    fn app(evaluator: StubEvaluator, store: Arc<MemoryStore>) -> Router {
        app_with_batches(evaluator, store, BatchRegistry::default())
    }

    fn app_with_batches(
        evaluator: StubEvaluator,
        store: Arc<MemoryStore>,
        batches: BatchRegistry,
    ) -> Router {
        build_router(AppState {
            evaluator: Arc::new(evaluator),
            store,
            analysts: Arc::new(AnalystDirectory::new([(
                "alice".to_string(),
                "s3cret".to_string(),
            )])),
            batches,
            max_upload_bytes: 5 * 1024 * 1024,
        })
    }

    fn basic_auth() -> String {
        format!("Basic {}", STANDARD.encode("alice:s3cret"))
    }

    fn multipart_body(job_description: Option<&str>, resumes: &[(&str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(jd) = job_description {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\n{jd}\r\n"
                )
                .as_bytes(),
            );
        }
        for (file_name, mime, bytes) in resumes {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resumes\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::AUTHORIZATION, basic_auth())
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_credentials() {
        let response = app(StubEvaluator::default(), Arc::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "screener");
    }

    #[tokio::test]
    async fn test_missing_credentials_are_rejected() {
        let response = app(StubEvaluator::default(), Arc::default())
            .oneshot(
                Request::get(format!("/api/v1/analyses/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let response = app(StubEvaluator::default(), Arc::default())
            .oneshot(
                Request::get(format!("/api/v1/analyses/{}", uuid::Uuid::new_v4()))
                    .header(
                        header::AUTHORIZATION,
                        format!("Basic {}", STANDARD.encode("alice:guess")),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_analysis_is_not_found() {
        let response = app(StubEvaluator::default(), Arc::default())
            .oneshot(
                Request::get(format!("/api/v1/analyses/{}", uuid::Uuid::new_v4()))
                    .header(header::AUTHORIZATION, basic_auth())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_upload_without_job_description_is_rejected() {
        let resume = docx_document(&["Jane Doe"], &[]);
        let body = multipart_body(None, &[("jane.docx", DOCX_MIME, resume.as_slice())]);
        let store = Arc::new(MemoryStore::default());
        let response = app(StubEvaluator::default(), store.clone())
            .oneshot(upload_request("/api/v1/analyses", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"]["code"],
            "VALIDATION_ERROR"
        );
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_resumes_is_rejected() {
        let body = multipart_body(Some("Senior Java developer"), &[]);
        let response = app(StubEvaluator::default(), Arc::default())
            .oneshot(upload_request("/api/v1/analyses", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_waited_upload_returns_ranked_report() {
        let resume = docx_document(&["Jane Doe", "Java, Spring Boot, 5 years"], &[]);
        let body = multipart_body(
            Some("Senior Java developer"),
            &[("jane.docx", DOCX_MIME, resume.as_slice())],
        );
        let evaluator = StubEvaluator::new(vec![Ok(canned_response("Jane Doe", 88, "Recommended"))]);
        let store = Arc::new(MemoryStore::default());

        let response = app(evaluator, store.clone())
            .oneshot(upload_request("/api/v1/analyses?wait=true", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report = json_body(response).await;
        assert_eq!(report["status"], "complete");
        assert_eq!(report["analyst"], "alice");
        assert_eq!(report["fraction"], 1.0);
        assert_eq!(report["summary"]["candidates"], 1);
        assert_eq!(report["summary"]["recommended"], 1);
        let candidate = &report["candidates"][0];
        assert_eq!(candidate["rank"], 1);
        assert_eq!(candidate["band"], "strong");
        assert_eq!(candidate["applicant_name"], "Jane Doe");
        assert_eq!(candidate["source_file_name"], "jane.docx");

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].analyzed_by, "alice");
    }

    #[tokio::test]
    async fn test_accepted_upload_is_polled_until_complete() {
        let resume = docx_document(&["Jane Doe", "Java"], &[]);
        let body = multipart_body(
            Some("Senior Java developer"),
            &[("jane.docx", DOCX_MIME, resume.as_slice())],
        );
        let evaluator = StubEvaluator::new(vec![Ok(canned_response("Jane Doe", 72, "Maybe"))]);
        let app = app(evaluator, Arc::default());

        let response = app
            .clone()
            .oneshot(upload_request("/api/v1/analyses", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let accepted = json_body(response).await;
        assert_eq!(accepted["progress"]["total"], 1);
        let id = accepted["id"].as_str().unwrap().to_string();

        let mut report = Value::Null;
        for _ in 0..500 {
            let response = app
                .clone()
                .oneshot(get_request(&format!("/api/v1/analyses/{id}")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            report = json_body(response).await;
            if report["status"] == "complete" {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(report["status"], "complete");
        assert_eq!(report["fraction"], 1.0);
        assert_eq!(report["candidates"][0]["applicant_name"], "Jane Doe");
        assert_eq!(report["candidates"][0]["final_recommendation"], "Maybe");
    }

    #[tokio::test]
    async fn test_candidate_previews() {
        let docx = docx_document(&["Jane Doe", "Java"], &[]);
        let pdf = pdf_with_text("John Smith Spring Boot");
        let body = multipart_body(
            Some("Senior Java developer"),
            &[
                ("jane.docx", DOCX_MIME, docx.as_slice()),
                ("john.pdf", PDF_MIME, pdf.as_slice()),
            ],
        );
        let evaluator = StubEvaluator::new(vec![
            Ok(canned_response("Jane Doe", 70, "Maybe")),
            Ok(canned_response("John Smith", 90, "Recommended")),
        ]);
        let app = app(evaluator, Arc::default());

        let response = app
            .clone()
            .oneshot(upload_request("/api/v1/analyses?wait=true", body))
            .await
            .unwrap();
        let report = json_body(response).await;
        let batch_id = report["id"].as_str().unwrap().to_string();
        let candidate_id = |file_name: &str| {
            report["candidates"]
                .as_array()
                .unwrap()
                .iter()
                .find(|c| c["source_file_name"] == file_name)
                .map(|c| c["id"].as_str().unwrap().to_string())
                .unwrap()
        };

        let uri = format!(
            "/api/v1/analyses/{batch_id}/candidates/{}/preview",
            candidate_id("john.pdf")
        );
        let response = app.clone().oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let preview = json_body(response).await;
        assert_eq!(preview["kind"], "pdf");
        assert_eq!(
            preview["data_uri"],
            format!("data:application/pdf;base64,{}", STANDARD.encode(&pdf))
        );

        let uri = format!(
            "/api/v1/analyses/{batch_id}/candidates/{}/preview",
            candidate_id("jane.docx")
        );
        let response = app.clone().oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let preview = json_body(response).await;
        assert_eq!(preview["kind"], "text");
        assert_eq!(preview["excerpt"], "Jane Doe\nJava...");

        let uri = format!(
            "/api/v1/analyses/{batch_id}/candidates/{}/preview",
            uuid::Uuid::new_v4()
        );
        let response = app.oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preview_of_released_file_is_not_found() {
        let batches = BatchRegistry::default();
        let now = chrono::Local::now().naive_local();
        let batch_id = batches.start("alice", 1, now);
        let record = CandidateRecord {
            id: uuid::Uuid::new_v4(),
            assessment: Assessment::transport_failure(&"n/a"),
            source_file_name: "old.pdf".to_string(),
            source_file_bytes: bytes::Bytes::new(),
            source_mime_type: PDF_MIME.to_string(),
            analyzed_by: "alice".to_string(),
            analyzed_at: now,
        };
        let candidate_id = record.id;
        batches.finish(
            batch_id,
            BatchOutcome {
                records: vec![record],
                notices: vec![],
            },
        );

        let response = app_with_batches(StubEvaluator::default(), Arc::default(), batches)
            .oneshot(get_request(&format!(
                "/api/v1/analyses/{batch_id}/candidates/{candidate_id}/preview"
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
