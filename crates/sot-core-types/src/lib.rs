//! Core types shared across sot facilities
//!
//! This crate provides the canonical field keys and event names used by
//! the structured logging macros and error reporting of every other crate.

pub mod schema;
