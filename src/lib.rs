//! Flightdesk - Dialogue-Driven Flight Search Engine
//!
//! This crate implements a slot-filling conversation engine that turns
//! free-form chat messages into a fully validated flight-search request,
//! executes the search exactly once, and renders the result.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
