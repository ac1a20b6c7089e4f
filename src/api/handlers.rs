use crate::api::responses::{
    HealthErrorCode, HealthErrorResponse, HealthStatus, HealthSuccessResponse, RefreshErrorCode,
    RefreshErrorResponse, RefreshSuccessResponse, VacancyErrorCode, VacancyErrorResponse,
    VacancySuccessResponse,
};
use crate::survival::SurvivalEngine;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Deserialize)]
pub struct VacancyQuery {
    pub room_no: String,
    /// RFC 3339 timestamp of the OCCUPIED transition being predicted.
    pub occupied_since: String,
    #[serde(default)]
    pub include_curve: bool,
}

pub enum VacancyResponse {
    Success(VacancySuccessResponse),
    Error {
        status: StatusCode,
        body: VacancyErrorResponse,
    },
}

impl IntoResponse for VacancyResponse {
    fn into_response(self) -> Response {
        match self {
            VacancyResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            VacancyResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_vacancy(
    State(engine): State<Arc<SurvivalEngine>>,
    Query(query): Query<VacancyQuery>,
) -> impl IntoResponse {
    build_vacancy_response(&engine, query, OffsetDateTime::now_utc())
}

fn build_vacancy_response(
    engine: &SurvivalEngine,
    query: VacancyQuery,
    now: OffsetDateTime,
) -> VacancyResponse {
    let occupied_since = match OffsetDateTime::parse(&query.occupied_since, &Rfc3339) {
        Ok(timestamp) => timestamp,
        Err(_) => {
            return invalid_timestamp_response(now);
        }
    };
    // Clock skew guard: an occupied-since in the future reads as elapsed 0.
    let occupied_since = occupied_since.min(now);

    let prediction =
        match engine.predict_vacancy_at(&query.room_no, occupied_since, query.include_curve, now) {
            Ok(prediction) => prediction,
            Err(err) => {
                error!(error = %err, room_no = %query.room_no, "Vacancy prediction failed");
                return internal_error();
            }
        };

    match format_timestamp(now) {
        Ok(timestamp) => VacancyResponse::Success(VacancySuccessResponse {
            room_no: query.room_no,
            median_remaining_minutes: prediction.median_remaining_minutes,
            q25_remaining_minutes: prediction.q25_remaining_minutes,
            q75_remaining_minutes: prediction.q75_remaining_minutes,
            probability_bands: prediction.probability_bands,
            confidence: prediction.confidence,
            survival_curve: prediction.survival_curve,
            segment: prediction.segment,
            sample_size: prediction.sample_size,
            timestamp,
        }),
        Err(_err) => internal_error(),
    }
}

fn invalid_timestamp_response(now: OffsetDateTime) -> VacancyResponse {
    VacancyResponse::Error {
        status: StatusCode::BAD_REQUEST,
        body: VacancyErrorResponse {
            error_code: VacancyErrorCode::InvalidTimestamp,
            error_message: "occupied_since is not a valid RFC 3339 timestamp".to_string(),
            timestamp: fallback_timestamp(now),
        },
    }
}

fn internal_error() -> VacancyResponse {
    VacancyResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: VacancyErrorResponse {
            error_code: VacancyErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp(OffsetDateTime::now_utc()),
        },
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp.format(&Rfc3339)
}

fn fallback_timestamp(timestamp: OffsetDateTime) -> String {
    format_timestamp(timestamp).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format response timestamp");
        "1970-01-01T00:00:00Z".to_string()
    })
}

pub enum HealthResponse {
    Success {
        status: StatusCode,
        body: HealthSuccessResponse,
    },
    Error {
        status: StatusCode,
        body: HealthErrorResponse,
    },
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        match self {
            HealthResponse::Success { status, body } => (status, Json(body)).into_response(),
            HealthResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(engine): State<Arc<SurvivalEngine>>) -> impl IntoResponse {
    build_health_response(&engine, OffsetDateTime::now_utc())
}

fn build_health_response(engine: &SurvivalEngine, now: OffsetDateTime) -> HealthResponse {
    let status = match engine.event_count() {
        Ok(0) => HealthStatus::Degraded,
        Ok(_) => HealthStatus::Ok,
        Err(err) => {
            error!(error = %err, "Event store unreachable during health check");
            HealthStatus::Ko
        }
    };

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => {
            return HealthResponse::Error {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: HealthErrorResponse {
                    error_code: HealthErrorCode::InternalError,
                    error_message: INTERNAL_ERROR_MESSAGE.to_string(),
                    timestamp: fallback_timestamp(now),
                },
            };
        }
    };

    let status_code = match status {
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };

    HealthResponse::Success {
        status: status_code,
        body: HealthSuccessResponse { status, timestamp },
    }
}

pub enum RefreshResponse {
    Success(RefreshSuccessResponse),
    Error {
        status: StatusCode,
        body: RefreshErrorResponse,
    },
}

impl IntoResponse for RefreshResponse {
    fn into_response(self) -> Response {
        match self {
            RefreshResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            RefreshResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

/// Manual counterpart of the scheduler's periodic cache clear.
pub async fn post_refresh_cache(State(engine): State<Arc<SurvivalEngine>>) -> impl IntoResponse {
    build_refresh_response(&engine, OffsetDateTime::now_utc())
}

fn build_refresh_response(engine: &SurvivalEngine, now: OffsetDateTime) -> RefreshResponse {
    match engine.refresh_cache() {
        Ok(evicted_entries) => RefreshResponse::Success(RefreshSuccessResponse {
            evicted_entries,
            timestamp: fallback_timestamp(now),
        }),
        Err(err) => {
            error!(error = %err, "Cache refresh failed");
            RefreshResponse::Error {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: RefreshErrorResponse {
                    error_code: RefreshErrorCode::InternalError,
                    error_message: INTERNAL_ERROR_MESSAGE.to_string(),
                    timestamp: fallback_timestamp(now),
                },
            }
        }
    }
}
