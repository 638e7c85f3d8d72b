//! Page acquisition and HTML processing.
//!
//! - Page rendering trait and Fantoccini-backed implementation (`browser`)
//! - Content-region selection and plain-text rendering (`select`)
//! - Local HTML → Markdown conversion of a selected fragment (`markdown`)

pub mod browser;
pub mod markdown;
pub mod select;

mod dom;
