//! REST API client module for the cats catalog backend.
//!
//! This module provides the `ApiClient` for authenticating and fetching
//! breed and image data. Every call goes through the request `Pipeline`,
//! which attaches the bearer token, normalizes failures into `ApiError`
//! and drives the global loading signal.

pub mod client;
pub mod error;
pub mod loading;
pub mod pipeline;

pub use client::ApiClient;
pub use error::ApiError;
pub use loading::{LoadingGuard, LoadingTracker};
pub use pipeline::{Pipeline, RetryPolicy};
