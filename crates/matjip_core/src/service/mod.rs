//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and image-store calls into use-case level APIs.
//! - Keep callers decoupled from storage details.

pub mod restaurant_service;
