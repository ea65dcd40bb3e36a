//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into catalog-level APIs.
//! - Keep CLI and import layers decoupled from storage details.

pub mod catalog_service;
