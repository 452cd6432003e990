//! System and job administration routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/system/hello` | Greeting, useful as a smoke test |
//! | GET | `/api/system/time` | Server time report |
//! | GET | `/api/system/job/all` | All known jobs |
//! | GET | `/api/system/job/kill/all` | Terminate every running job |
//! | GET | `/api/system/job/kill/{job_id}` | Terminate one job |
//! | GET | `/api/system/job/thumbnail/{job_id}` | Latest snapshot as PNG |
//! | GET | `/api/system/job/{job_id}` | One job by id |

use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{JobResponse, JobsResponse, MessageResponse, TimeResponse};
use crate::api::server::AppState;

/// Create the system router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hello", get(hello))
        .route("/time", get(time))
        .route("/job/all", get(get_all_jobs))
        .route("/job/kill/all", get(kill_all_jobs))
        .route("/job/kill/{job_id}", get(kill_job))
        .route("/job/thumbnail/{job_id}", get(get_thumbnail))
        .route("/job/{job_id}", get(get_job))
}

/// Test route; the API greets you in response.
async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        data: "Good morning sunshine, the earth says hello.".to_string(),
    })
}

/// Get server time.
async fn time() -> Json<TimeResponse> {
    let now = Utc::now();
    Json(TimeResponse {
        datetime: now,
        date: now.format("%a %b %d %Y").to_string(),
        time: now.format("%H:%M:%S").to_string(),
    })
}

/// Get all known jobs in insertion order.
async fn get_all_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    Json(state.registry.get_all().into())
}

/// Get a job by id.
async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let job = state.registry.get(&job_id).map_err(ApiError::from)?;
    Ok(Json(job.into()))
}

/// Terminate a job by id.
async fn kill_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let job = state.supervisor.kill(&job_id).await.map_err(ApiError::from)?;
    Ok(Json(job.into()))
}

/// Terminate every running job; returns the affected set.
async fn kill_all_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    Json(state.supervisor.kill_all().await.into())
}

/// Latest thumbnail snapshot for a job, as raw PNG bytes.
async fn get_thumbnail(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    // 404 for unknown jobs as well as jobs without a snapshot yet.
    state.registry.get(&job_id).map_err(ApiError::from)?;
    let bytes = state.thumbnails.read(&job_id).await.map_err(ApiError::from)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}
