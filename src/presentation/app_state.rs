// Application state for HTTP handlers
use crate::application::analytics_service::AnalyticsService;
use crate::application::ingest_service::IngestService;

#[derive(Clone)]
pub struct AppState {
    pub ingest_service: IngestService,
    pub analytics_service: AnalyticsService,
    pub max_upload_bytes: u64,
}
