//! REST API server: tailoring uploads, editable sessions, exports, and OpenAPI docs.

pub mod config;
pub mod dto;
pub mod error;
pub mod openapi;
pub mod pipeline;
pub mod routes;
pub mod session;
pub mod state;
