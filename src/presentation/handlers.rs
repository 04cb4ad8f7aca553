// HTTP request handlers
use crate::application::ingest_service::UploadTooLarge;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::dto::{
    CountResponse, DailySummaryResponse, DataTypesResponse, HealthStatsResponse,
    HeartRateTrendsResponse, InsightsResponse, MessageResponse, RecentActivityResponse,
    StatusResponse, TimelineResponse,
};
use crate::presentation::error::ApiError;
use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::{io, path::Path, sync::Arc};
use tokio_util::io::StreamReader;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub days: Option<u32>,
}

async fn respond<T: Serialize>(headers: &HeaderMap, data: T) -> Response {
    match json_response(StatusCode::OK, &data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn is_xml(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Health check endpoint
pub async fn health_check() -> Response {
    let status = StatusResponse {
        status: "ok",
        message: "Health analytics server is running.",
    };
    axum::Json(status).into_response()
}

pub async fn count(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let counts = state.ingest_service.counts().await?;
    Ok(respond(&headers, CountResponse::from(counts)).await)
}

/// Stream-parse an uploaded health export and ingest it as one batch
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::BadRequest("No selected file".to_string()));
        }
        if !is_xml(&file_name) {
            tracing::warn!("Rejected upload {}: not an XML file", file_name);
            return Err(ApiError::BadRequest(
                "Invalid file type. Please upload an XML file.".to_string(),
            ));
        }

        tracing::info!("Receiving upload {}", file_name);
        let limit = state.max_upload_bytes;
        let mut received: u64 = 0;
        let chunks = field.map(move |chunk| -> io::Result<Bytes> {
            // The request body limit can trip before the byte count does.
            let bytes = chunk.map_err(|err| {
                if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    io::Error::other(UploadTooLarge { limit })
                } else {
                    io::Error::other(err)
                }
            })?;
            received += bytes.len() as u64;
            if received > limit {
                return Err(io::Error::other(UploadTooLarge { limit }));
            }
            Ok(bytes)
        });

        let report = state
            .ingest_service
            .ingest(Box::pin(StreamReader::new(chunks)))
            .await?;
        return Ok(axum::Json(MessageResponse::from(report)).into_response());
    }

    Err(ApiError::BadRequest("No file part".to_string()))
}

pub async fn health_stats(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let stats = state.analytics_service.health_stats().await?;
    Ok(respond(&headers, HealthStatsResponse::from(stats)).await)
}

pub async fn data_types(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let types = state.analytics_service.data_types().await?;
    Ok(respond(&headers, DataTypesResponse::from(types)).await)
}

pub async fn timeline(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let service = &state.analytics_service;
    let days = query.days.unwrap_or_else(|| service.timeline_days());
    let timeline = service.timeline(Utc::now(), days).await?;
    Ok(respond(&headers, TimelineResponse::from(timeline)).await)
}

pub async fn heart_rate_trends(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let service = &state.analytics_service;
    let days = query.days.unwrap_or_else(|| service.timeline_days());
    let trends = service.heart_rate_trends(Utc::now(), days).await?;
    Ok(respond(&headers, HeartRateTrendsResponse::from(trends)).await)
}

pub async fn daily_summary(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let summary = state.analytics_service.daily_summary(Utc::now()).await?;
    Ok(respond(&headers, DailySummaryResponse::from(summary)).await)
}

pub async fn health_insights(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let insights = state.analytics_service.insights(Utc::now()).await?;
    Ok(respond(&headers, InsightsResponse::from(insights)).await)
}

pub async fn recent_activity(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let feed = state.analytics_service.recent_activity().await?;
    Ok(respond(&headers, RecentActivityResponse::from(feed)).await)
}
