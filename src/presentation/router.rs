// Route table and HTTP layers
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    count, daily_summary, data_types, health_check, health_insights, health_stats,
    heart_rate_trends, recent_activity, timeline, upload,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_SLACK_BYTES: u64 = 64 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .max_upload_bytes
        .saturating_add(MULTIPART_SLACK_BYTES)
        .try_into()
        .unwrap_or(usize::MAX);

    // Compression is done per handler, so no CompressionLayer here.
    Router::new()
        .route("/health", get(health_check))
        .route("/count", get(count))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/analytics/health-stats", get(health_stats))
        .route("/analytics/data-types", get(data_types))
        .route("/analytics/timeline", get(timeline))
        .route("/analytics/heart-rate-trends", get(heart_rate_trends))
        .route("/analytics/daily-summary", get(daily_summary))
        .route("/analytics/health-insights", get(health_insights))
        .route("/analytics/recent-activity", get(recent_activity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analytics_service::AnalyticsService;
    use crate::application::ingest_service::IngestService;
    use crate::infrastructure::config::AnalyticsSettings;
    use crate::infrastructure::memory_store::InMemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "health-test-boundary";

    fn app(max_upload_bytes: u64) -> Router {
        let store = Arc::new(InMemoryStore::new());
        let state = Arc::new(AppState {
            ingest_service: IngestService::new(store.clone()),
            analytics_service: AnalyticsService::new(store, AnalyticsSettings::default())
                .unwrap(),
            max_upload_bytes,
        });
        build_router(state)
    }

    fn multipart_request(field: &str, file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/xml\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_US">
 <Record type="HKQuantityTypeIdentifierHeartRate" sourceName="Watch" unit="count/min" creationDate="2024-03-01 08:01:00 +0000" startDate="2024-03-01 08:00:00 +0000" endDate="2024-03-01 08:00:00 +0000" value="70">
  <MetadataEntry key="HKMetadataKeyHeartRateMotionContext" value="0"/>
 </Record>
 <Record type="HKQuantityTypeIdentifierHeartRate" sourceName="Watch" unit="count/min" startDate="2024-03-01 18:00:00 +0000" endDate="2024-03-01 18:00:00 +0000" value="80"/>
 <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Phone" unit="count" startDate="2024-03-01 09:00:00 +0000" endDate="2024-03-01 09:30:00 +0000" value="1200"/>
</HealthData>"#;

    #[tokio::test]
    async fn test_health() {
        let app = app(1024);
        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_then_query() {
        let app = app(1024 * 1024);

        let (status, body) = get_json(&app, "/count").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["records"], 0);

        let (status, body) = send(&app, multipart_request("file", "export.xml", EXPORT)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully ingested 3 records.");

        let (_, body) = get_json(&app, "/count").await;
        assert_eq!(body["records"], 3);
        assert_eq!(body["metadata_entries"], 1);

        let (_, body) = get_json(&app, "/analytics/daily-summary").await;
        assert_eq!(body["daily_summary"]["date"], "2024-03-01");
        assert_eq!(body["daily_summary"]["avg_heart_rate"], 75.0);
        assert_eq!(body["daily_summary"]["steps"], 1200);

        let (_, body) = get_json(&app, "/analytics/timeline").await;
        assert_eq!(body["daily_steps"].as_array().unwrap().len(), 30);
        assert_eq!(body["daily_heart_rate"][29]["heart_rate"], 75.0);

        let (_, body) = get_json(&app, "/analytics/timeline?days=7").await;
        assert_eq!(body["daily_steps"].as_array().unwrap().len(), 7);

        let (_, body) = get_json(&app, "/analytics/heart-rate-trends").await;
        let trends = body["heart_rate_trends"].as_array().unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0]["min"], 70);
        assert_eq!(trends[0]["max"], 80);

        let (_, body) = get_json(&app, "/analytics/data-types").await;
        assert_eq!(
            body["data_types"][0]["type"],
            "HKQuantityTypeIdentifierHeartRate"
        );
        assert_eq!(body["data_types"][0]["count"], 2);

        let (_, body) = get_json(&app, "/analytics/health-stats").await;
        assert_eq!(body["total_records"], 3);
        assert_eq!(body["unique_types"], 2);
        assert_eq!(body["avg_heart_rate"], 75.0);

        let (_, body) = get_json(&app, "/analytics/recent-activity").await;
        let feed = body["recent_activity"].as_array().unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0]["type"], "Heart Rate");
        assert_eq!(feed[0]["time"], "18:00");
        assert_eq!(feed[0]["date"], "Mar 01");

        let (status, body) = get_json(&app, "/analytics/health-insights").await;
        assert_eq!(status, StatusCode::OK);
        // no sleep data, so only the heart-rate share counts
        assert_eq!(body["insights"]["recovery_score"]["score"], 32.0);
        assert_eq!(body["insights"]["recovery_score"]["level"], "poor");
        assert_eq!(
            body["insights"]["recovery_score"]["breakdown"]["sleep_score"],
            Value::Null
        );
        assert_eq!(
            body["insights"]["workout_recommendation"]["recommendation"],
            "rest"
        );
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let app = app(1024 * 1024);

        let (status, body) = send(&app, multipart_request("other", "export.xml", EXPORT)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file part");

        let (status, body) = send(&app, multipart_request("file", "", EXPORT)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No selected file");

        let (status, _) = send(&app, multipart_request("file", "export.csv", EXPORT)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let broken = EXPORT.replace("value=\"1200\"", "value=\"lots\"");
        let (status, body) = send(&app, multipart_request("file", "export.xml", &broken)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("record 3"));

        let (_, body) = get_json(&app, "/count").await;
        assert_eq!(body["records"], 0);
    }

    #[tokio::test]
    async fn test_upload_over_limit() {
        let app = app(256);
        let (status, _) = send(&app, multipart_request("file", "export.xml", EXPORT)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (_, body) = get_json(&app, "/count").await;
        assert_eq!(body["records"], 0);
    }

    #[tokio::test]
    async fn test_body_limit_reports_too_large() {
        let app = app(1024);
        let head = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"export.xml\"\r\n\
             Content-Type: text/xml\r\n\r\n\
             <?xml version=\"1.0\"?>\n<HealthData>\n"
        );
        // one oversized frame past the body limit, before the field byte count reaches it
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
            vec![Ok(head.into_bytes()), Ok(vec![b' '; 128 * 1024])];
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from_stream(futures::stream::iter(chunks)))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].is_string());

        let (_, body) = get_json(&app, "/count").await;
        assert_eq!(body["records"], 0);
    }

    #[tokio::test]
    async fn test_brotli_when_accepted() {
        let app = app(1024);
        let request = Request::get("/analytics/health-stats")
            .header(header::ACCEPT_ENCODING, "gzip, br")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");
    }
}
