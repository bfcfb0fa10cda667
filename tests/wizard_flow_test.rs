use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use httpmock::prelude::*;
use reqwest::Client;
use serde_json::{json, Value};
use tourmarket::core::wizard::WizardStep;
use tourmarket::core::{Activity, Faq, Location, ServiceDraft};
use tourmarket::{build_router, AppConfig, AppState, BackendClient, MarketError, Wizard};
use tower::ServiceExt;

fn draft() -> ServiceDraft {
    ServiceDraft {
        name: "Lagoon Kayak".to_string(),
        description: "Half-day paddle".to_string(),
        category: "water".to_string(),
        images: vec!["https://img.example.com/kayak.jpg".to_string()],
        price: Some(80.0),
        location: Location {
            city: "Bacalar".to_string(),
            country: "Mexico".to_string(),
            ..Default::default()
        },
        providers: vec!["sup-3".to_string()],
        itinerary: vec![
            Activity {
                title: "Lunch".to_string(),
                date: "2025-07-01".to_string(),
                time: "13:00".to_string(),
                ..Default::default()
            },
            Activity {
                title: "Launch".to_string(),
                date: "2025-07-01".to_string(),
                time: "08:30".to_string(),
                ..Default::default()
            },
        ],
        faqs: vec![Faq {
            question: "Life jackets?".to_string(),
            answer: "Included".to_string(),
        }],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_submit_posts_sorted_payload() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/services")
            .json_body_partial(r#"{ "name": "Lagoon Kayak", "discountPercent": 0.0 }"#);
        then.status(201)
            .header("Content-Type", "application/json")
            .json_body(json!({ "id": "svc-77" }));
    });

    let backend = BackendClient::with_client(&server.base_url(), Client::new());
    let mut wizard = Wizard::with_draft(draft());
    assert_eq!(wizard.go_to_step(WizardStep::ALL.len() as isize - 1), 9);

    let created = wizard.submit(&backend).await.unwrap();
    mock.assert();
    assert_eq!(created["id"], "svc-77");
}

#[tokio::test]
async fn test_submit_refused_before_review() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.path_contains("/");
        then.status(201);
    });

    let backend = BackendClient::with_client(&server.base_url(), Client::new());
    let err = Wizard::with_draft(draft()).submit(&backend).await.unwrap_err();

    assert!(matches!(err, MarketError::StepValidationError { .. }));
    mock.assert_hits(0);
}

#[tokio::test]
async fn test_backend_rejection_surfaces_as_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/services");
        then.status(409)
            .header("Content-Type", "application/json")
            .json_body(json!({ "message": "Duplicate service name" }));
    });

    let backend = BackendClient::with_client(&server.base_url(), Client::new());
    let mut wizard = Wizard::with_draft(draft());
    wizard.go_to_step(9);

    match wizard.submit(&backend).await.unwrap_err() {
        MarketError::BackendError { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "Duplicate service name");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_wizard_routes() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/services");
        then.status(201)
            .header("Content-Type", "application/json")
            .json_body(json!({ "id": "svc-1" }));
    });

    let mut config = AppConfig::default();
    config.backend.url = server.base_url();
    let app = build_router(AppState::new(config).unwrap());

    let request = Request::builder()
        .method("POST")
        .uri("/api/wizard/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": "Only a name" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let statuses: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(statuses[0]["step"], "basic_info");
    assert_eq!(statuses[0]["valid"], false);
    assert_eq!(statuses[9]["valid"], true);

    let request = Request::builder()
        .method("POST")
        .uri("/api/wizard/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&draft()).unwrap()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    mock.assert();

    let request = Request::builder()
        .method("POST")
        .uri("/api/wizard/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": "Incomplete" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
