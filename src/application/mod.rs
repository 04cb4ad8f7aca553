// Application layer - Use cases over the sample store
pub mod analytics_service;
pub mod ingest_service;
pub mod sample_repository;
