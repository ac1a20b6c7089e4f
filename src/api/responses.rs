use crate::survival::curve::SurvivalPoint;
use crate::survival::predict::ProbabilityBand;
use crate::survival::segment::Segment;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct VacancySuccessResponse {
    pub room_no: String,
    pub median_remaining_minutes: u32,
    pub q25_remaining_minutes: u32,
    pub q75_remaining_minutes: u32,
    pub probability_bands: Vec<ProbabilityBand>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survival_curve: Option<Vec<SurvivalPoint>>,
    pub segment: Segment,
    pub sample_size: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct VacancyErrorResponse {
    pub error_code: VacancyErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VacancyErrorCode {
    InvalidTimestamp,
    InternalError,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Ko,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthErrorResponse {
    pub error_code: HealthErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthErrorCode {
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RefreshSuccessResponse {
    pub evicted_entries: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RefreshErrorResponse {
    pub error_code: RefreshErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshErrorCode {
    InternalError,
}
