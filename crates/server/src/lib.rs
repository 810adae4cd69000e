//! HTTP boundary of the wellness inference service

pub mod api;
pub mod config;
