//! # API Shared
//!
//! Shared utilities and definitions for the CityCare API.
//!
//! Contains:
//! - Request/response types (`dto` module)
//! - Shared services like `HealthService`
//! - The demo login check
//!
//! Used by `api-rest`; kept separate so other front ends (the CLI, future transports) see the
//! same wire shapes.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
