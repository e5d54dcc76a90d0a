//! Command handlers. Each one turns validated options into calls on the core clients and
//! returns the text to print; printing itself happens once, in [`crate::cli::run`].

pub mod auth;
pub mod double_submit;
pub mod gist;
pub mod prompt;
pub mod slack;
mod table;

use anyhow::{Context, Result};
use gislack_core::transport::HttpTransport;

pub(crate) fn http_transport() -> Result<HttpTransport> {
    HttpTransport::new().context("cannot build the HTTP client")
}
