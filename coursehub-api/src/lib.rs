//! # CourseHub API Server Library
//!
//! HTTP layer over `coursehub-shared`.
//!
//! ## Modules
//!
//! - `app`: application state, router and the auth layer
//! - `config`: environment configuration
//! - `error`: `ApiError` and its HTTP mapping
//! - `middleware`: route guards and security headers
//! - `routes`: request handlers, one module per resource

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
