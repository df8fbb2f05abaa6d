//! # API REST
//!
//! REST API implementation for CityCare.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Uses `api-shared` for request/response types and `citycare-core` for all data operations.
//! The binary in the workspace root builds a [`CityCare`] once and hands it to [`router`].

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{auth, dto, HealthService};
use citycare_core::constants::DEFAULT_SENSOR_HISTORY_LIMIT;
use citycare_core::{
    Alert, AlertKind, Appointment, CityCare, Consent, Facility, PatientError, PatientPatch,
    PatientRecord, PatientResult, Reading, Stat,
};
use tokio::task::JoinError;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    app: CityCare,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        login,
        list_facilities,
        register_patient,
        update_patient,
        list_patients,
        get_patient,
        book_appointment,
        list_appointments,
        list_appointments_for_doctor,
        create_alert,
        list_alerts,
        sensor_reading,
        sensor_history,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::LoginReq,
        dto::LoginRes,
        dto::SessionUser,
        dto::Role,
        dto::RegisterPatientReq,
        dto::RegisterPatientRes,
        dto::UpdatePatientReq,
        dto::UpdatePatientRes,
        dto::BookAppointmentRes,
        dto::CreateAlertRes,
        dto::SensorReadingRes,
        dto::SensorHistoryRes,
        PatientRecord,
        PatientPatch,
        Consent,
        Facility,
        Appointment,
        Alert,
        AlertKind,
        Reading,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router, including Swagger UI and CORS.
pub fn router(app: CityCare) -> Router {
    let cors = cors_layer(app.config().cors_origins());

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/facilities", get(list_facilities))
        .route("/patients", get(list_patients))
        .route("/patients/register", post(register_patient))
        .route("/patients/update", post(update_patient))
        .route("/patients/:user_id", get(get_patient))
        .route("/appointments", get(list_appointments))
        .route("/appointments/book", post(book_appointment))
        .route(
            "/appointments/for_doctor/:doctor_id",
            get(list_appointments_for_doctor),
        )
        .route("/alerts", get(list_alerts))
        .route("/alerts/create", post(create_alert))
        .route("/sensor/:patient_id/:stat", get(sensor_reading))
        .route("/sensor/:patient_id/history/:stat", get(sensor_history))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { app })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Errors mapped onto HTTP responses.
///
/// Client errors carry their message; storage failures are logged and reported as a generic
/// internal error.
#[derive(Debug)]
pub enum ApiError {
    Core(PatientError),
    Task(JoinError),
}

impl From<PatientError> for ApiError {
    fn from(e: PatientError) -> Self {
        Self::Core(e)
    }
}

/// Unreadable or mistyped request bodies are reported like any other invalid input.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Core(PatientError::InvalidInput(rejection.body_text()))
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        Self::Task(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Core(PatientError::InvalidInput(m)) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::Core(PatientError::NotFound(m)) => (StatusCode::NOT_FOUND, m.clone()),
            ApiError::Core(PatientError::Unauthorized(m)) => {
                (StatusCode::UNAUTHORIZED, m.clone())
            }
            other => {
                tracing::error!("request failed: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, Json(dto::ErrorRes::new(detail))).into_response()
    }
}

/// JSON request body whose rejections are answered with [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct JsonBody<T>(T);

/// Runs a store operation that writes files on the blocking thread pool.
async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> PatientResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(op).await??)
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertsQuery {
    /// Only return alerts addressed to this audience, e.g. `patient:PAT_001`.
    target: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum number of readings (default 30).
    limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = dto::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns liveness plus the size of every collection.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> ApiResult<dto::HealthRes> {
    let counts = state.app.counts()?;
    Ok(Json(HealthService::check_health(counts)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = dto::LoginReq,
    responses(
        (status = 200, description = "Logged in", body = dto::LoginRes),
        (status = 401, description = "Invalid doctor PIN", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<dto::LoginReq>,
) -> ApiResult<dto::LoginRes> {
    let user = auth::login(state.app.config().doctor_pin(), &req.user_id, &req.pin)?;
    Ok(Json(dto::LoginRes { user }))
}

#[utoipa::path(
    get,
    path = "/facilities",
    responses(
        (status = 200, description = "Facility catalog", body = [Facility])
    )
)]
/// List care facilities
///
/// Seeds the default catalog on first call if it is empty.
#[axum::debug_handler]
async fn list_facilities(State(state): State<AppState>) -> ApiResult<Vec<Facility>> {
    let facilities = blocking(move || state.app.facilities().list()).await?;
    Ok(Json(facilities))
}

#[utoipa::path(
    post,
    path = "/patients/register",
    request_body = dto::RegisterPatientReq,
    responses(
        (status = 200, description = "Patient registered or re-registered", body = dto::RegisterPatientRes),
        (status = 400, description = "Missing user_id or pin", body = dto::ErrorRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a patient
///
/// Upserts by `user_id`: a repeat registration replaces the PIN and any supplied linkage and
/// reports `created: false`.
#[axum::debug_handler]
async fn register_patient(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<dto::RegisterPatientReq>,
) -> ApiResult<dto::RegisterPatientRes> {
    let reg = blocking(move || {
        state.app.patients().register(
            &req.user_id,
            &req.pin,
            req.assigned_doctor_id,
            req.facility_id,
        )
    })
    .await?;
    Ok(Json(dto::RegisterPatientRes {
        ok: true,
        created: reg.created,
        patient: reg.record,
    }))
}

#[utoipa::path(
    post,
    path = "/patients/update",
    request_body = dto::UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated", body = dto::UpdatePatientRes),
        (status = 401, description = "PIN does not match", body = dto::ErrorRes),
        (status = 404, description = "Patient not found", body = dto::ErrorRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Update a patient's dashboard
///
/// Only fields present and non-null in the body are written.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<dto::UpdatePatientReq>,
) -> ApiResult<dto::UpdatePatientRes> {
    let outcome = blocking(move || {
        state
            .app
            .patients()
            .update(&req.user_id, &req.pin, req.patch)
    })
    .await?;
    Ok(Json(dto::UpdatePatientRes {
        ok: true,
        changed: outcome.changed,
        updated: outcome.record,
    }))
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patients in registration order", body = [PatientRecord])
    )
)]
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> ApiResult<Vec<PatientRecord>> {
    Ok(Json(state.app.patients().list()?))
}

#[utoipa::path(
    get,
    path = "/patients/{user_id}",
    params(("user_id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Patient record", body = PatientRecord),
        (status = 404, description = "Patient not found", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<PatientRecord> {
    Ok(Json(state.app.patients().get(&user_id)?))
}

#[utoipa::path(
    post,
    path = "/appointments/book",
    request_body = Appointment,
    responses(
        (status = 200, description = "Appointment booked", body = dto::BookAppointmentRes),
        (status = 400, description = "Missing field", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn book_appointment(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Appointment>,
) -> ApiResult<dto::BookAppointmentRes> {
    let appointment = blocking(move || state.app.appointments().book(req)).await?;
    Ok(Json(dto::BookAppointmentRes {
        ok: true,
        appointment,
    }))
}

#[utoipa::path(
    get,
    path = "/appointments",
    responses(
        (status = 200, description = "All appointments", body = [Appointment])
    )
)]
#[axum::debug_handler]
async fn list_appointments(State(state): State<AppState>) -> ApiResult<Vec<Appointment>> {
    Ok(Json(state.app.appointments().list()?))
}

#[utoipa::path(
    get,
    path = "/appointments/for_doctor/{doctor_id}",
    params(("doctor_id" = String, Path, description = "Doctor identifier")),
    responses(
        (status = 200, description = "Appointments with this doctor", body = [Appointment])
    )
)]
#[axum::debug_handler]
async fn list_appointments_for_doctor(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
) -> ApiResult<Vec<Appointment>> {
    Ok(Json(state.app.appointments().for_doctor(&doctor_id)?))
}

#[utoipa::path(
    post,
    path = "/alerts/create",
    request_body = Alert,
    responses(
        (status = 200, description = "Alert created", body = dto::CreateAlertRes),
        (status = 400, description = "Missing title", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn create_alert(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Alert>,
) -> ApiResult<dto::CreateAlertRes> {
    let alert = blocking(move || state.app.alerts().create(req)).await?;
    Ok(Json(dto::CreateAlertRes { ok: true, alert }))
}

#[utoipa::path(
    get,
    path = "/alerts",
    params(AlertsQuery),
    responses(
        (status = 200, description = "Alerts, optionally filtered by target", body = [Alert])
    )
)]
#[axum::debug_handler]
async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> ApiResult<Vec<Alert>> {
    Ok(Json(state.app.alerts().list(query.target.as_deref())?))
}

#[utoipa::path(
    get,
    path = "/sensor/{patient_id}/{stat}",
    params(
        ("patient_id" = String, Path, description = "Patient identifier"),
        ("stat" = String, Path, description = "heart_rate, o2 or temp")
    ),
    responses(
        (status = 200, description = "Simulated reading", body = dto::SensorReadingRes),
        (status = 400, description = "Unknown stat", body = dto::ErrorRes)
    )
)]
/// Simulated vital-sign reading
///
/// Generates a random value for the stat and records it in the reading history.
#[axum::debug_handler]
async fn sensor_reading(
    State(state): State<AppState>,
    Path((patient_id, stat)): Path<(String, String)>,
) -> ApiResult<dto::SensorReadingRes> {
    let parsed: Stat = stat.parse()?;
    let reading = state.app.sensors().read(&patient_id, parsed)?;
    Ok(Json(dto::SensorReadingRes::new(
        patient_id,
        parsed.as_str(),
        reading,
    )))
}

#[utoipa::path(
    get,
    path = "/sensor/{patient_id}/history/{stat}",
    params(
        ("patient_id" = String, Path, description = "Patient identifier"),
        ("stat" = String, Path, description = "heart_rate, o2 or temp"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Recent readings, oldest first", body = dto::SensorHistoryRes),
        (status = 400, description = "Unknown stat", body = dto::ErrorRes)
    )
)]
#[axum::debug_handler]
async fn sensor_history(
    State(state): State<AppState>,
    Path((patient_id, stat)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<dto::SensorHistoryRes> {
    let parsed: Stat = stat.parse()?;
    let limit = query.limit.unwrap_or(DEFAULT_SENSOR_HISTORY_LIMIT);
    let history = state.app.sensors().history(&patient_id, parsed, limit)?;
    Ok(Json(dto::SensorHistoryRes {
        patient_id,
        stat: parsed.as_str().to_string(),
        history,
    }))
}
