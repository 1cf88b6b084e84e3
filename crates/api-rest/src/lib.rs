//! # API REST
//!
//! REST API implementation for ResQ.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - the notification WebSocket stream
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON errors, CORS, API key check)
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod websocket;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::RestConfig;
pub use error::ApiError;
pub use state::{AppState, Services};

/// Largest accepted voice recording.
const VOICE_BODY_LIMIT: usize = 16 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_notifications,
        handlers::create_notification,
        handlers::mark_notification_read,
        handlers::mark_all_notifications_read,
        websocket::ws_notifications,
        handlers::submit_admission_request,
        handlers::list_admission_requests,
        handlers::get_admission_request,
        handlers::take_admission_request,
        handlers::decide_admission_request,
        handlers::list_hospitals,
        handlers::list_ambulances,
        handlers::assess_condition,
        handlers::triage,
        handlers::recommend_hospitals,
        handlers::dispatch,
        handlers::voice_analyze,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::NotificationListRes,
        api_shared::UnreadCountRes,
        api_shared::DecisionKind,
        api_shared::DecisionReq,
        api_shared::DispatchReq,
        api_shared::AmbulanceView,
        handlers::VoiceUpload,
        resq_core::Notification,
        resq_core::NotificationType,
        resq_core::AdmissionRequest,
        resq_core::AdmissionStatus,
        resq_core::PatientInfo,
        resq_core::Hospital,
        resq_core::AmbulanceStatus,
        resq_llm::AssessConditionInput,
        resq_llm::AssessConditionOutput,
        resq_llm::AdvancedTriageInput,
        resq_llm::AdvancedTriageOutput,
        resq_llm::TriageVitalSigns,
        resq_llm::PotentialCondition,
        resq_llm::HospitalData,
        resq_llm::HospitalRecommendationInput,
        resq_llm::HospitalRecommendationOutput,
        resq_llm::HospitalRecommendation,
        resq_llm::DispatchPlan,
        resq_llm::VoiceAnalysis,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router.
///
/// `/health` and the Swagger UI are always open; everything else goes through
/// [`auth::require_api_key`].
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/notifications",
            get(handlers::list_notifications).post(handlers::create_notification),
        )
        .route("/notifications/read", post(handlers::mark_all_notifications_read))
        .route("/notifications/:id/read", post(handlers::mark_notification_read))
        .route("/ws/notifications", get(websocket::ws_notifications))
        .route(
            "/admission-requests",
            get(handlers::list_admission_requests).post(handlers::submit_admission_request),
        )
        .route(
            "/admission-requests/:id",
            get(handlers::get_admission_request).delete(handlers::take_admission_request),
        )
        .route(
            "/admission-requests/:id/decision",
            post(handlers::decide_admission_request),
        )
        .route("/hospitals", get(handlers::list_hospitals))
        .route("/ambulances", get(handlers::list_ambulances))
        .route("/assessment", post(handlers::assess_condition))
        .route("/triage", post(handlers::triage))
        .route("/recommendations", post(handlers::recommend_hospitals))
        .route("/dispatch", post(handlers::dispatch))
        .route(
            "/voice-analyze",
            post(handlers::voice_analyze).layer(DefaultBodyLimit::max(VOICE_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the REST server until it fails.
///
/// # Errors
/// Returns an error if the services cannot be built, the address cannot be bound, or the
/// HTTP server fails while running.
pub async fn serve(cfg: RestConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&cfg)?;
    let app = router(state);

    tracing::info!("++ Starting ResQ REST on {}", cfg.addr);
    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_shared::ApiKey;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use resq_core::{AdmissionDesk, Directory, MemoryStore, NotificationRelay};
    use resq_llm::{ScriptedGateway, ScriptedSpeech};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const DIRECTORY: &str = r#"
hospitals:
  - { id: HOS001, name: Seoul National University Hospital, location: "37.5796,126.9990", capacity: 12, specialties: [Cardiology] }
ambulances:
  - { id: AMB012, callSign: Medic 12, currentLocation: Gangnam, status: en_route_to_hospital }
  - { id: AMB007, callSign: Medic 7, currentLocation: Sector 5, status: available }
"#;

    fn gateway() -> ScriptedGateway {
        ScriptedGateway::new()
            .with_response("assessCondition", json!({ "patientState": "Cardiac arrest" }))
            .with_response(
                "advancedTriage",
                json!({
                    "ktasLevel": 9,
                    "ktasReasoning": "Unresponsive",
                    "potentialConditions": [],
                    "recommendedTests": ["ECG"],
                    "timeToTreatmentRecommendation": "Immediately"
                }),
            )
            .with_response(
                "smartHospitalRecommendation",
                json!({
                    "recommendations": [{
                        "hospitalName": "Seoul National University Hospital",
                        "estimatedArrivalTime": "9 minutes",
                        "suitabilityScore": 95,
                        "reasoning": "Cardiology"
                    }]
                }),
            )
    }

    fn build(llm: bool, api_key: Option<&str>) -> (AppState, Arc<ScriptedGateway>) {
        let store = Arc::new(MemoryStore::new());
        let relay = Arc::new(NotificationRelay::new(store.clone(), 20));
        let desk = AdmissionDesk::new(store, relay.clone());
        let gateway = Arc::new(gateway());

        let state = AppState::new(Services {
            relay,
            desk,
            directory: Directory::parse(DIRECTORY).unwrap(),
            llm: llm.then(|| gateway.clone() as Arc<dyn resq_llm::LlmGateway>),
            speech: Some(Arc::new(ScriptedSpeech::new("의식 없음"))),
            api_key: ApiKey::from_env_value(api_key.map(str::to_string)),
        });
        (state, gateway)
    }

    fn app() -> Router {
        router(build(true, None).0)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn admission_request(id: &str) -> Value {
        json!({
            "id": id,
            "patientInfo": { "age": 58, "gender": "Male" },
            "primarySymptoms": "Severe chest pain",
            "assessedCondition": "Suspected Myocardial Infarction",
            "incidentLocation": "Near Gangnam Station",
            "ambulanceId": "AMB012",
            "etaToHospital": "12 minutes",
            "requestTimestamp": "2024-06-10T09:30:00Z",
            "status": "pending",
            "hospitalId": "HOS001"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_admission_flow_relays_notification() {
        let app = app();

        let (status, body) = send(&app, post_json("/admission-requests", admission_request("REQ001"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");

        let (status, body) = send(&app, get("/admission-requests?status=pending")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            post_json(
                "/admission-requests/REQ001/decision",
                json!({ "decision": "reject", "reason": "No ICU beds available" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "REJECTED");
        assert_eq!(body["request"]["rejectionReason"], "No ICU beds available");

        let (_, body) = send(&app, get("/notifications")).await;
        assert_eq!(body["unreadCount"], 1);
        let id = body["notifications"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, post_json(&format!("/notifications/{id}/read"), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unreadCount"], 0);

        let (status, body) = send(
            &app,
            post_json("/admission-requests/REQ001/decision", json!({ "decision": "accept" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("already rejected"));
    }

    #[tokio::test]
    async fn test_take_then_not_found() {
        let app = app();
        send(&app, post_json("/admission-requests", admission_request("REQ002"))).await;

        let delete = Request::builder()
            .method("DELETE")
            .uri("/admission-requests/REQ002")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "REQ002");

        let (status, body) = send(&app, get("/admission-requests/REQ002")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/admission-requests/REQ001/decision")
            .header("content-type", "application/json")
            .body(Body::from("{\"decision\":\"maybe\"}"))
            .unwrap();
        let (status, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_create_notification_assigns_id() {
        let app = app();
        let mut request = admission_request("REQ003");
        request["status"] = json!("accepted");
        let notification = json!({
            "type": "ACCEPTED",
            "request": request,
            "timestamp": "2024-06-10T09:35:00Z"
        });

        let (status, body) = send(&app, post_json("/notifications", notification)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].as_str().unwrap().starts_with("notification_"));

        let (status, body) = send(&app, post_json("/notifications/read", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unreadCount"], 0);
    }

    #[tokio::test]
    async fn test_directory_routes() {
        let app = app();

        let (_, body) = send(&app, get("/hospitals")).await;
        assert_eq!(body[0]["id"], "HOS001");

        let (status, body) = send(&app, get("/ambulances?status=en_route_to_hospital")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["statusLabel"], "En Route To Hospital");

        let (_, body) = send(&app, get("/ambulances")).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, _) = send(&app, get("/ambulances?status=parked")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_triage_passes_level_through() {
        let (status, body) = send(
            &app(),
            post_json("/triage", json!({ "patientDescription": "Unresponsive, no pulse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ktasLevel"], 9);
    }

    #[tokio::test]
    async fn test_dispatch_uses_directory_hospitals() {
        let (state, gateway) = build(true, None);
        let app = router(state);

        let (status, body) = send(
            &app,
            post_json(
                "/dispatch",
                json!({ "voiceInput": "Collapsed, no pulse", "ambulanceLocation": "37.49,127.02" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patientState"], "Cardiac arrest");
        assert!(gateway.requests()[1]
            .prompt
            .contains("Seoul National University Hospital (Location: 37.5796,126.9990"));

        let (status, body) = send(
            &app,
            post_json("/dispatch", json!({ "voiceInput": "", "ambulanceLocation": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Patient condition and ambulance location cannot be empty."
        );
    }

    #[tokio::test]
    async fn test_llm_routes_disabled_without_gateway() {
        let app = router(build(false, None).0);
        let (status, body) = send(
            &app,
            post_json("/assessment", json!({ "voiceInput": "Chest pain" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("not configured"));
    }

    fn multipart(field: &str, content: &[u8]) -> Request<Body> {
        let boundary = "resqboundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"report.webm\"\r\nContent-Type: audio/webm\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/voice-analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_voice_analyze() {
        let app = app();

        let (status, body) = send(&app, multipart("audio", b"webm-bytes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transcript"], "의식 없음");
        assert_eq!(body["patientState"], "Cardiac arrest");

        let (status, body) = send(&app, multipart("file", b"webm-bytes")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "audio file required");
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let app = router(build(true, Some("s3cret")).0);

        let (status, _) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get("/notifications")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing API key");

        let request = Request::builder()
            .uri("/notifications")
            .header("x-api-key", "s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, get("/hospitals?api_key=s3cret")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_key_query_param_is_decoded() {
        let app = router(build(true, Some("s3cr+t & co")).0);

        let (status, _) = send(&app, get("/hospitals?api_key=s3cr%2Bt%20%26%20co")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get("/hospitals?api_key=s3cr%2Bt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid API key");
    }

    #[tokio::test]
    async fn test_relay_notifications_reach_stream() {
        let (state, _) = build(true, None);
        let mut rx = state.subscribe();

        state
            .desk()
            .submit(serde_json::from_value(admission_request("REQ009")).unwrap())
            .unwrap();
        state
            .desk()
            .decide("REQ009", resq_core::Decision::Accept)
            .unwrap();

        let received = rx.try_recv().unwrap();
        assert_eq!(received.request.id, "REQ009");
    }

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for expected in [
            "/health",
            "/notifications",
            "/admission-requests/{id}/decision",
            "/voice-analyze",
            "/ws/notifications",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }
    }
}
