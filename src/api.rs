use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::auth::AdminSession;
use crate::db::{
    ApplicationFilter, create_enrollment, get_application, list_applications,
    update_application_status,
};
use crate::error::{AppError, ErrorEnvelope};
use crate::models::{ApplicationDetail, ApplicationListing, ApplicationStatus};
use crate::normalize::{clean_scalar, normalize_enrollment};
use crate::validation::validate_enrollment;

#[derive(Serialize, Deserialize, Debug)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EnrollResponse {
    pub ok: bool,
    pub application_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApplicationsResponse {
    pub ok: bool,
    pub items: Vec<ApplicationListing>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApplicationResponse {
    pub ok: bool,
    pub item: ApplicationDetail,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    status: Option<Value>,
}

fn parse_status(raw: Option<&str>) -> Result<ApplicationStatus, AppError> {
    raw.map(str::trim)
        .unwrap_or_default()
        .parse::<ApplicationStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

fn clean_query(value: Option<String>) -> Option<String> {
    value.and_then(|v| clean_scalar(&Value::String(v)))
}

#[get("/health")]
pub fn health() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

#[post("/enroll", data = "<payload>")]
pub async fn api_enroll(
    payload: Json<Value>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<EnrollResponse>, AppError> {
    let Value::Object(payload) = payload.into_inner() else {
        return Err(AppError::Validation(
            "Expected a JSON object".to_string(),
        ));
    };

    let record = validate_enrollment(normalize_enrollment(&payload))?;
    let application_id = create_enrollment(db, &record).await?;

    info!(application_id, "Enrollment accepted");
    Ok(Json(EnrollResponse {
        ok: true,
        application_id,
    }))
}

#[get("/applications?<status>&<strand>")]
pub async fn api_list_applications(
    _admin: AdminSession,
    status: Option<String>,
    strand: Option<String>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ApplicationsResponse>, AppError> {
    let status = clean_query(status)
        .map(|s| parse_status(Some(&s)))
        .transpose()?;
    let strand = clean_query(strand);

    let items = list_applications(db, &ApplicationFilter { status, strand }).await?;

    Ok(Json(ApplicationsResponse { ok: true, items }))
}

#[get("/applications/<id>")]
pub async fn api_get_application(
    _admin: AdminSession,
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let item = get_application(db, id).await?;
    Ok(Json(ApplicationResponse { ok: true, item }))
}

#[patch("/applications/<id>/status", data = "<update>")]
pub async fn api_update_status(
    admin: AdminSession,
    id: i64,
    update: Json<StatusUpdateRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<OkResponse>, AppError> {
    let status = parse_status(update.status.as_ref().and_then(Value::as_str))?;

    update_application_status(db, id, status).await?;

    info!(application_id = id, status = %status, username = %admin.username, "Application status updated");
    Ok(Json(OkResponse { ok: true }))
}

#[catch(default)]
pub fn api_error(status: Status, _req: &Request) -> Custom<Json<ErrorEnvelope>> {
    let message = status.reason().unwrap_or("Request failed");
    Custom(status, Json(ErrorEnvelope::new(message)))
}
