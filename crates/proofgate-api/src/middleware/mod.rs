//! # Middleware
//!
//! Request metrics. Tracing comes from `tower_http::trace::TraceLayer` and
//! CORS from `tower_http::cors::CorsLayer`, both applied in [`crate::app`].

pub mod metrics;
