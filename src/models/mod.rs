//! Request and Response models for the cache HTTP surface
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ConfirmPredictionRequest, GetQuery, SetRequest, MAX_KEY_LENGTH};
pub use responses::{
    BehaviorResponse, ClearResponse, ConfirmPredictionResponse, DeleteResponse, GetResponse,
    HealthResponse, SetResponse,
};
