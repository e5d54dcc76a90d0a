#![doc = "gislack-core: core logic library for gislack."]

//! This crate contains the request building, transport, dual-submission coordination and
//! rendering logic for gislack. The CLI crate only parses arguments, resolves the
//! configuration directory and prints what this crate returns.
//!
//! # Usage
//! Add this as a dependency for all Gist/Slack request, auth and submission code.

pub mod auth;
pub mod config;
pub mod contract;
pub mod correlate;
pub mod dispatch;
pub mod double_submit;
pub mod error;
pub mod gist;
pub mod models;
pub mod options;
pub mod render;
pub mod request;
pub mod slack;
pub mod transport;

pub use models::Service;
