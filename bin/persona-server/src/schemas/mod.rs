//! Request / response types for the HTTP API.
//!
//! Core types are converted into these at the edge so the OpenAPI document
//! describes exactly what goes over the wire.

pub mod benchmark;
pub mod catalog;
pub mod chat;
pub mod info;
pub mod metrics;
pub mod session;
