//! Responsive dashboard grid-layout engine.
//!
//! `domain` holds the pure layout core, `application` the layout manager and
//! dashboard use cases, `infrastructure` the document format, storage and
//! config adapters, and `presentation` the HTTP host.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
