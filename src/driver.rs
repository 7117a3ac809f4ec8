//! The processing loop: one input line at a time through
//! validate → fetch → extract → validate → render.

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::debug;

use crate::extract::{ScrapeMode, extract};
use crate::fetch::{FetchError, PageFetcher};
use crate::format::OutputFormat;
use crate::record::{RecordError, ValidRecord};
use crate::url::{is_valid_url, strip_newline};

/// Why a line produced no record. `Display` is the diagnostic printed for
/// it, one line per rejected URL.
#[derive(Debug, Error)]
pub enum StatError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Unable to stat URL: {url}")]
    Unreachable {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("Bad values parsed from URL: {url}")]
    BadValues {
        url: String,
        #[source]
        source: RecordError,
    },
}

/// Counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub skipped: usize,
    pub printed: usize,
    pub rejected: usize,
}

/// Runs the whole pipeline for one URL.
pub fn stat_url<F>(url: &str, fetcher: &F, mode: ScrapeMode) -> Result<ValidRecord, StatError>
where
    F: PageFetcher + ?Sized,
{
    let url = strip_newline(url);
    if !is_valid_url(url) {
        return Err(StatError::InvalidUrl(url.to_owned()));
    }

    let lines = fetcher
        .fetch(url)
        .map_err(|source| StatError::Unreachable {
            url: url.to_owned(),
            source,
        })?;

    extract(url, &lines, mode)
        .validate(mode)
        .map_err(|source| StatError::BadValues {
            url: url.to_owned(),
            source,
        })
}

/// Reads URLs from `input` until end of input, writing records to `out` and
/// one diagnostic per rejected line to `err`. Empty lines and lines starting
/// with `#` are skipped silently.
///
/// Only I/O errors on the three streams end the run early.
pub fn run<R, W, E, F>(
    mut input: R,
    out: &mut W,
    err: &mut E,
    fetcher: &F,
    format: OutputFormat,
    mode: ScrapeMode,
) -> io::Result<RunSummary>
where
    R: BufRead,
    W: Write + ?Sized,
    E: Write + ?Sized,
    F: PageFetcher + ?Sized,
{
    let mut summary = RunSummary::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let raw = String::from_utf8_lossy(&buf);
        let line = strip_newline(&raw);
        if line.is_empty() || line.starts_with('#') {
            summary.skipped += 1;
            continue;
        }

        match stat_url(line, fetcher, mode) {
            Ok(record) => {
                format.render(&record, out)?;
                out.flush()?;
                summary.printed += 1;
            }
            Err(stat_err) => {
                debug!(error = ?stat_err, "rejected input line");
                writeln!(err, "{stat_err}")?;
                summary.rejected += 1;
            }
        }
    }
    Ok(summary)
}
