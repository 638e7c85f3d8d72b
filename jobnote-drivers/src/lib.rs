//! Driver layer for browser automation.
//!
//! This crate owns the WebDriver session used to render job pages before
//! their HTML is handed to the selection stage.
//!
//! - [`chrome::driver::JobnoteDriver`]: WebDriver client wrapper
//! - [`chrome::page::JobnotePage`]: the loaded page and its rendered source
//! - [`chrome::args`]: Chrome command-line flags and capabilities
#[cfg(feature = "chromium")]
pub mod chrome;
