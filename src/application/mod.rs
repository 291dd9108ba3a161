// Application layer - Layout orchestration and use cases
pub mod dashboard_repository;
pub mod dashboard_service;
pub mod events;
pub mod layout_manager;
