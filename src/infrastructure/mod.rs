// Infrastructure layer - External dependencies and adapters
pub mod blueprint;
pub mod chunked_json;
pub mod config;
pub mod http_response;
pub mod json_file_repository;
pub mod memory_repository;
