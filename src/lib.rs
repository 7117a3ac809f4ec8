#![forbid(unsafe_code)]

//! Library half of `vimstat`.
//!
//! Every stage of the per-line pipeline lives in its own module so the binary
//! only wires configuration, the fetcher and stdin/stdout together:
//! [`url`] validates the input line, [`fetch`] retrieves the marker lines of
//! the page, [`extract`] turns them into a [`record::VideoRecord`],
//! [`record`] validates it and [`format`] prints it.

pub mod config;
pub mod driver;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod record;
pub mod url;
