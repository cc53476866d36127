//! Inbound trigger surface
//!
//! Transport-agnostic: the hosting runtime turns its request into a method
//! name and writes the returned [`TriggerResponse`] back out.

pub mod trigger;

pub use trigger::{CorsPolicy, ErrorBody, SuccessBody, TriggerResponse, handle};
