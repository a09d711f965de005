//! Crowd-sourced availability, recommendations and subscription guidance
//! for households.
//!
//! The inference core lives in [`services`] and is made of pure functions
//! over caller-supplied snapshots. [`api`] is a thin axum adapter that keeps
//! snapshots in memory and serves the core's outputs.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
