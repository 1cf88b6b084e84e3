//! HTTP handlers for the ResQ REST API.

use crate::error::ApiError;
use crate::state::AppState;
use api_shared::{
    AmbulanceView, DecisionReq, DispatchReq, ErrorRes, HealthRes, HealthService,
    NotificationListRes, UnreadCountRes,
};
use axum::{
    extract::{multipart::MultipartRejection, FromRequest, Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use resq_core::{AdmissionRequest, AdmissionStatus, AmbulanceStatus, Hospital, Notification};
use resq_llm::{
    AdvancedTriageInput, AdvancedTriageOutput, AssessConditionInput, AssessConditionOutput,
    DispatchPlan, HospitalRecommendationInput, HospitalRecommendationOutput, LlmGateway,
    VoiceAnalysis,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// JSON body extractor whose rejections render as `{ "error": ... }`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdmissionListQuery {
    /// Only requests in this state (`pending`, `accepted`, `rejected`, `diverted`).
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AmbulanceQuery {
    /// Comma-separated statuses, e.g. `available,at_hospital`.
    pub status: Option<String>,
}

/// Multipart form accepted by `/voice-analyze`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct VoiceUpload {
    /// WebM/Opus recording.
    #[schema(value_type = String, format = Binary)]
    audio: Vec<u8>,
}

fn llm(state: &AppState) -> Result<&dyn LlmGateway, ApiError> {
    state.llm().ok_or(ApiError::FeatureDisabled("language model"))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Never requires an API key.
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Stored notifications, newest first", body = NotificationListRes)
    )
)]
/// List relayed hospital decisions
///
/// # Returns
/// * `Json<NotificationListRes>` - Notifications (newest first) and the unread count
#[axum::debug_handler]
pub async fn list_notifications(State(state): State<AppState>) -> Json<NotificationListRes> {
    let notifications = state.relay().get_notifications();
    let unread_count = notifications.iter().filter(|n| !n.is_read()).count();
    Json(NotificationListRes {
        notifications,
        unread_count,
    })
}

#[utoipa::path(
    post,
    path = "/notifications",
    request_body = Notification,
    responses(
        (status = 201, description = "Notification stored and delivered", body = Notification),
        (status = 400, description = "Malformed notification", body = ErrorRes)
    )
)]
/// Publish a notification
///
/// An empty `id` is replaced with a generated one. The notification is stored at the head of
/// the list and delivered to every connected listener.
#[axum::debug_handler]
pub async fn create_notification(
    State(state): State<AppState>,
    ApiJson(notification): ApiJson<Notification>,
) -> (StatusCode, Json<Notification>) {
    let stored = state.relay().notify(notification);
    (StatusCode::CREATED, Json(stored))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Unread count after the update", body = UnreadCountRes)
    )
)]
/// Mark one notification as read
///
/// Unknown ids are ignored.
#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<UnreadCountRes> {
    state.relay().mark_as_read(&id);
    Json(UnreadCountRes {
        unread_count: state.relay().unread_count(),
    })
}

#[utoipa::path(
    post,
    path = "/notifications/read",
    responses(
        (status = 200, description = "All notifications marked read", body = UnreadCountRes)
    )
)]
#[axum::debug_handler]
pub async fn mark_all_notifications_read(State(state): State<AppState>) -> Json<UnreadCountRes> {
    state.relay().mark_all_as_read();
    Json(UnreadCountRes {
        unread_count: state.relay().unread_count(),
    })
}

#[utoipa::path(
    post,
    path = "/admission-requests",
    request_body = AdmissionRequest,
    responses(
        (status = 201, description = "Request stored as pending", body = AdmissionRequest),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Submit an admission request to a hospital
///
/// # Arguments
/// * `request` - The request; an empty `id` is allocated and the status is forced to `pending`
///
/// # Errors
/// Returns `400 Bad Request` if the body is malformed or the id is not storage-key safe.
#[axum::debug_handler]
pub async fn submit_admission_request(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdmissionRequest>,
) -> Result<(StatusCode, Json<AdmissionRequest>), ApiError> {
    let stored = state.desk().submit(request)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    get,
    path = "/admission-requests",
    params(AdmissionListQuery),
    responses(
        (status = 200, description = "Requests, pending first then newest first", body = [AdmissionRequest]),
        (status = 400, description = "Unknown status filter", body = ErrorRes)
    )
)]
/// List admission requests for the hospital portal
#[axum::debug_handler]
pub async fn list_admission_requests(
    State(state): State<AppState>,
    Query(query): Query<AdmissionListQuery>,
) -> Result<Json<Vec<AdmissionRequest>>, ApiError> {
    let filter = query
        .status
        .as_deref()
        .map(str::parse::<AdmissionStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let requests = state
        .desk()
        .list()?
        .into_iter()
        .filter(|r| filter.map_or(true, |status| r.status == status))
        .collect();
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/admission-requests/{id}",
    params(("id" = String, Path, description = "Admission request id")),
    responses(
        (status = 200, description = "The request", body = AdmissionRequest),
        (status = 404, description = "Unknown id", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_admission_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdmissionRequest>, ApiError> {
    Ok(Json(state.desk().get(&id)?))
}

#[utoipa::path(
    delete,
    path = "/admission-requests/{id}",
    params(("id" = String, Path, description = "Admission request id")),
    responses(
        (status = 200, description = "The removed request", body = AdmissionRequest),
        (status = 404, description = "Unknown id", body = ErrorRes)
    )
)]
/// Consume an admission request
///
/// Returns the request and deletes it from storage.
#[axum::debug_handler]
pub async fn take_admission_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdmissionRequest>, ApiError> {
    Ok(Json(state.desk().take(&id)?))
}

#[utoipa::path(
    post,
    path = "/admission-requests/{id}/decision",
    params(("id" = String, Path, description = "Admission request id")),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Decision recorded and relayed", body = Notification),
        (status = 400, description = "Rejection without a reason", body = ErrorRes),
        (status = 404, description = "Unknown id", body = ErrorRes),
        (status = 409, description = "Request already decided", body = ErrorRes)
    )
)]
/// Accept, reject or divert a pending admission request
///
/// The updated request is persisted and a notification of the matching type is relayed back to
/// dispatch.
///
/// # Returns
/// * `Json<Notification>` - The relayed notification
///
/// # Errors
/// - `400 Bad Request` for a rejection without a reason,
/// - `404 Not Found` for an unknown id,
/// - `409 Conflict` when the request is no longer pending.
#[axum::debug_handler]
pub async fn decide_admission_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<DecisionReq>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state.desk().decide(&id, req.into())?;
    Ok(Json(notification))
}

#[utoipa::path(
    get,
    path = "/hospitals",
    responses(
        (status = 200, description = "Directory hospitals", body = [Hospital])
    )
)]
#[axum::debug_handler]
pub async fn list_hospitals(State(state): State<AppState>) -> Json<Vec<Hospital>> {
    Json(state.directory().hospitals().to_vec())
}

#[utoipa::path(
    get,
    path = "/ambulances",
    params(AmbulanceQuery),
    responses(
        (status = 200, description = "Fleet, optionally filtered by status", body = [AmbulanceView]),
        (status = 400, description = "Unknown status", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_ambulances(
    State(state): State<AppState>,
    Query(query): Query<AmbulanceQuery>,
) -> Result<Json<Vec<AmbulanceView>>, ApiError> {
    let filter = query
        .status
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<AmbulanceStatus>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::BadRequest)?;

    let fleet = state
        .directory()
        .ambulances_with_status(&filter)
        .into_iter()
        .map(AmbulanceView::from)
        .collect();
    Ok(Json(fleet))
}

#[utoipa::path(
    post,
    path = "/assessment",
    request_body = AssessConditionInput,
    responses(
        (status = 200, description = "Classified patient state", body = AssessConditionOutput),
        (status = 400, description = "Empty input", body = ErrorRes),
        (status = 502, description = "Model call failed", body = ErrorRes),
        (status = 503, description = "Language model not configured", body = ErrorRes)
    )
)]
/// Classify a patient's state from a field report
#[axum::debug_handler]
pub async fn assess_condition(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AssessConditionInput>,
) -> Result<Json<AssessConditionOutput>, ApiError> {
    let output = resq_llm::assess_condition(llm(&state)?, &input).await?;
    Ok(Json(output))
}

#[utoipa::path(
    post,
    path = "/triage",
    request_body = AdvancedTriageInput,
    responses(
        (status = 200, description = "KTAS triage", body = AdvancedTriageOutput),
        (status = 400, description = "Empty description", body = ErrorRes),
        (status = 502, description = "Model call failed", body = ErrorRes),
        (status = 503, description = "Language model not configured", body = ErrorRes)
    )
)]
/// KTAS triage with candidate conditions
///
/// Levels and probabilities are returned exactly as the model produced them, even when outside
/// their nominal ranges.
#[axum::debug_handler]
pub async fn triage(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AdvancedTriageInput>,
) -> Result<Json<AdvancedTriageOutput>, ApiError> {
    let output = resq_llm::advanced_triage(llm(&state)?, &input).await?;
    Ok(Json(output))
}

#[utoipa::path(
    post,
    path = "/recommendations",
    request_body = HospitalRecommendationInput,
    responses(
        (status = 200, description = "Ranked hospitals", body = HospitalRecommendationOutput),
        (status = 400, description = "Missing condition or location", body = ErrorRes),
        (status = 502, description = "Model call failed", body = ErrorRes),
        (status = 503, description = "Language model not configured", body = ErrorRes)
    )
)]
/// Rank receiving hospitals
///
/// When `hospitalData` is empty the directory hospitals are used.
#[axum::debug_handler]
pub async fn recommend_hospitals(
    State(state): State<AppState>,
    ApiJson(mut input): ApiJson<HospitalRecommendationInput>,
) -> Result<Json<HospitalRecommendationOutput>, ApiError> {
    if input.hospital_data.is_empty() {
        input.hospital_data = state.directory().hospital_data_for_ai();
    }
    let output = resq_llm::recommend_hospitals(llm(&state)?, &input).await?;
    Ok(Json(output))
}

#[utoipa::path(
    post,
    path = "/dispatch",
    request_body = DispatchReq,
    responses(
        (status = 200, description = "Assessment followed by hospital ranking", body = DispatchPlan),
        (status = 400, description = "Missing report or location", body = ErrorRes),
        (status = 502, description = "Model call failed", body = ErrorRes),
        (status = 503, description = "Language model not configured", body = ErrorRes)
    )
)]
/// Assess the patient and rank hospitals in one call
#[axum::debug_handler]
pub async fn dispatch(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DispatchReq>,
) -> Result<Json<DispatchPlan>, ApiError> {
    let hospitals = req
        .hospital_data
        .unwrap_or_else(|| state.directory().hospital_data_for_ai());
    let plan = resq_llm::plan_dispatch(
        llm(&state)?,
        &req.voice_input,
        &req.ambulance_location,
        hospitals,
    )
    .await?;
    Ok(Json(plan))
}

#[utoipa::path(
    post,
    path = "/voice-analyze",
    request_body(content = VoiceUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Transcript and patient state", body = VoiceAnalysis),
        (status = 400, description = "No audio in the form", body = ErrorRes),
        (status = 502, description = "Speech or model call failed", body = ErrorRes),
        (status = 503, description = "Speech-to-text or language model not configured", body = ErrorRes)
    )
)]
/// Transcribe a recorded field report and classify the patient's state
///
/// # Errors
/// Returns `400 Bad Request` if the form has no `audio` field or the field is empty.
#[axum::debug_handler]
pub async fn voice_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VoiceAnalysis>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("audio") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            audio = Some(bytes);
            break;
        }
    }
    let audio = audio
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("audio file required".into()))?;

    let speech = state
        .speech()
        .ok_or(ApiError::FeatureDisabled("speech-to-text"))?;
    let analysis = resq_llm::analyze_voice(speech, llm(&state)?, &audio).await?;
    Ok(Json(analysis))
}
