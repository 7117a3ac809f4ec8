//! Page retrieval.
//!
//! A [`PageFetcher`] makes exactly one attempt to download a page and returns
//! only the lines mentioning one of [`MARKER_KEYWORDS`]; the pages are large
//! and nothing else is needed downstream. Two implementations exist:
//! [`HttpFetcher`] talks HTTP itself through `ureq`, [`WgetFetcher`] pipes
//! `wget` into `grep` for hosts where that is preferred.

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Result, bail};
use thiserror::Error;
use tracing::debug;

/// Keywords a page line must contain (case-insensitively) to be kept.
pub const MARKER_KEYWORDS: [&str; 4] = ["google_hints", "userplays", "userlikes", "usercomments"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("reading page {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("could not run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with status {status}")]
    ToolFailed {
        tool: &'static str,
        status: ExitStatus,
    },
}

/// Source of page content for the extractor.
pub trait PageFetcher {
    /// Startup check that everything this fetcher relies on is present. The
    /// error message names the missing piece.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    /// Downloads `url` and returns its marker lines without line endings.
    fn fetch(&self, url: &str) -> Result<Vec<String>, FetchError>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for Box<F> {
    fn ensure_available(&self) -> Result<()> {
        (**self).ensure_available()
    }

    fn fetch(&self, url: &str) -> Result<Vec<String>, FetchError> {
        (**self).fetch(url)
    }
}

/// Returns `true` when `line` mentions any of [`MARKER_KEYWORDS`].
pub fn is_marker_line(line: &str) -> bool {
    let lowered = line.to_ascii_lowercase();
    MARKER_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Reads `reader` to the end and keeps the marker lines. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn read_marker_lines<R: BufRead>(mut reader: R) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if is_marker_line(line) {
            lines.push(line.to_owned());
        }
    }
    Ok(lines)
}

/// Native HTTP fetcher.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<String>, FetchError> {
        debug!(url, "fetching page over http");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|source| FetchError::Request {
                url: url.to_owned(),
                source: Box::new(source),
            })?;
        let lines = read_marker_lines(BufReader::new(response.into_reader())).map_err(|source| {
            FetchError::Read {
                url: url.to_owned(),
                source,
            }
        })?;
        debug!(url, lines = lines.len(), "marker lines received");
        Ok(lines)
    }
}

/// Fetcher that runs `wget -qO- <url> | grep -i -e <keyword>...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WgetFetcher {
    wget: OsString,
    grep: OsString,
}

impl Default for WgetFetcher {
    fn default() -> Self {
        Self::with_programs("wget", "grep")
    }
}

impl WgetFetcher {
    /// Uses the given executables instead of looking `wget`/`grep` up on
    /// `PATH`.
    pub fn with_programs(wget: impl Into<OsString>, grep: impl Into<OsString>) -> Self {
        Self {
            wget: wget.into(),
            grep: grep.into(),
        }
    }

    fn grep_command(&self) -> Command {
        let mut command = Command::new(&self.grep);
        command.arg("-i");
        for keyword in MARKER_KEYWORDS {
            command.arg("-e").arg(keyword);
        }
        command
    }
}

impl PageFetcher for WgetFetcher {
    fn ensure_available(&self) -> Result<()> {
        ensure_program_available(&self.wget, "Wget not installed.")?;
        ensure_program_available(&self.grep, "Grep not installed.")?;
        Ok(())
    }

    fn fetch(&self, url: &str) -> Result<Vec<String>, FetchError> {
        debug!(url, "fetching page with wget");
        let mut wget = Command::new(&self.wget)
            .arg("-qO-")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| FetchError::Spawn {
                tool: "wget",
                source,
            })?;

        let Some(page) = wget.stdout.take() else {
            reap(&mut wget);
            return Err(FetchError::Spawn {
                tool: "wget",
                source: io::Error::other("stdout was not captured"),
            });
        };

        let mut grep = match self
            .grep_command()
            .stdin(Stdio::from(page))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                reap(&mut wget);
                return Err(FetchError::Spawn {
                    tool: "grep",
                    source,
                });
            }
        };

        let read = match grep.stdout.take() {
            Some(filtered) => read_marker_lines(BufReader::new(filtered)),
            None => Err(io::Error::other("grep stdout was not captured")),
        };
        let grep_status = grep.wait();
        let wget_status = wget.wait();

        let lines = read.map_err(|source| FetchError::Read {
            url: url.to_owned(),
            source,
        })?;
        let wget_status = wget_status.map_err(|source| FetchError::Spawn {
            tool: "wget",
            source,
        })?;
        if !wget_status.success() {
            return Err(FetchError::ToolFailed {
                tool: "wget",
                status: wget_status,
            });
        }
        let grep_status = grep_status.map_err(|source| FetchError::Spawn {
            tool: "grep",
            source,
        })?;
        // grep exits with 1 when nothing matched, which is not a fetch error.
        if !grep_status.success() && grep_status.code() != Some(1) {
            return Err(FetchError::ToolFailed {
                tool: "grep",
                status: grep_status,
            });
        }

        debug!(url, lines = lines.len(), "marker lines received");
        Ok(lines)
    }
}

/// Runs `<program> --version` and fails with `missing` when that does not
/// succeed.
fn ensure_program_available(program: &OsString, missing: &str) -> Result<()> {
    let status = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => {
            debug!(program = ?program, %status, "version probe failed");
            bail!("{missing}")
        }
        Err(err) => {
            debug!(program = ?program, error = %err, "version probe could not run");
            bail!("{missing}")
        }
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
