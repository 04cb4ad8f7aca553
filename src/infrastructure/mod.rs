// Infrastructure layer - Storage, parsing and configuration adapters
pub mod config;
pub mod health_xml;
pub mod http_response;
pub mod journal;
pub mod memory_store;
