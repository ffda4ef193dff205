//! Core library for the recruiting platform: the hiring workflow engine that
//! drives candidate pipelines through the funnel, and the WebRTC signaling
//! relay that pairs HR and candidate browsers for interview video calls.

pub mod config;
pub mod error;
pub mod signaling;
pub mod telemetry;
pub mod workflows;
