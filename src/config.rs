use anyhow::{Context, Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::extract::ScrapeMode;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/vimstat-env";
pub const CONFIG_PATH_VAR: &str = "VIMSTAT_CONFIG";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("vimstat/", env!("CARGO_PKG_VERSION"));

/// How pages are downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetcherKind {
    /// Built-in HTTP client.
    #[default]
    Http,
    /// External `wget` piped into `grep`.
    Wget,
}

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub fetcher: Option<FetcherKind>,
    pub scrape_title: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub fetcher: FetcherKind,
    pub mode: ScrapeMode,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherKind::default(),
            mode: ScrapeMode::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub fn read_env_config(path: &Path) -> Result<Option<EnvConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let mut cfg = EnvConfig::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value_raw)) = trimmed.split_once('=') {
            let value = value_raw.trim().trim_matches('"');
            match key.trim() {
                "FETCHER" => {
                    cfg.fetcher = Some(
                        parse_fetcher(value)
                            .with_context(|| format!("Parsing FETCHER from {}", path.display()))?,
                    );
                }
                "SCRAPE_TITLE" => {
                    cfg.scrape_title = Some(
                        parse_bool(value).with_context(|| {
                            format!("Parsing SCRAPE_TITLE from {}", path.display())
                        })?,
                    );
                }
                "TIMEOUT_SECS" => {
                    let secs: u64 = value
                        .parse()
                        .with_context(|| format!("Parsing TIMEOUT_SECS from {}", path.display()))?;
                    if secs == 0 {
                        bail!("TIMEOUT_SECS must be positive in {}", path.display());
                    }
                    cfg.timeout_secs = Some(secs);
                }
                "USER_AGENT" => {
                    if !value.is_empty() {
                        cfg.user_agent = Some(value.to_string());
                    }
                }
                _ => {}
            }
        }
    }
    Ok(Some(cfg))
}

fn parse_fetcher(value: &str) -> Result<FetcherKind> {
    match value.to_ascii_lowercase().as_str() {
        "http" => Ok(FetcherKind::Http),
        "wget" => Ok(FetcherKind::Wget),
        other => bail!("unknown fetcher `{other}` (expected `http` or `wget`)"),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got `{other}`"),
    }
}

/// Loads the config named by `VIMSTAT_CONFIG`, falling back to
/// [`DEFAULT_CONFIG_PATH`].
pub fn load_runtime_config() -> Result<RuntimeConfig> {
    let path = env::var_os(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    load_runtime_config_from(path)
}

/// A missing file yields the defaults.
pub fn load_runtime_config_from(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    let Some(cfg) = read_env_config(path)? else {
        return Ok(RuntimeConfig::default());
    };
    let defaults = RuntimeConfig::default();
    let mode = match cfg.scrape_title {
        Some(false) => ScrapeMode::CountersOnly,
        Some(true) => ScrapeMode::Titled,
        None => defaults.mode,
    };
    Ok(RuntimeConfig {
        fetcher: cfg.fetcher.unwrap_or(defaults.fetcher),
        mode,
        timeout: cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
        user_agent: cfg.user_agent.unwrap_or(defaults.user_agent),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = load_runtime_config_from(dir.path().join("absent")).unwrap();
        assert_eq!(runtime.fetcher, FetcherKind::Http);
        assert_eq!(runtime.mode, ScrapeMode::Titled);
        assert_eq!(runtime.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(runtime.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn read_env_config_extracts_values() {
        let cfg = make_config(
            "# vimstat\nFETCHER=\"wget\"\nSCRAPE_TITLE=false\nTIMEOUT_SECS=\"5\"\nUSER_AGENT=\"bot/1.0\"\n",
        );
        let parsed = read_env_config(cfg.path()).unwrap().unwrap();
        assert_eq!(parsed.fetcher, Some(FetcherKind::Wget));
        assert_eq!(parsed.scrape_title, Some(false));
        assert_eq!(parsed.timeout_secs, Some(5));
        assert_eq!(parsed.user_agent.as_deref(), Some("bot/1.0"));
    }

    #[test]
    fn load_runtime_config_applies_overrides() {
        let cfg = make_config("SCRAPE_TITLE=no\nTIMEOUT_SECS=12\n");
        let runtime = load_runtime_config_from(cfg.path()).unwrap();
        assert_eq!(runtime.mode, ScrapeMode::CountersOnly);
        assert_eq!(runtime.timeout, Duration::from_secs(12));
        assert_eq!(runtime.fetcher, FetcherKind::Http);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for contents in ["FETCHER=curl\n", "SCRAPE_TITLE=maybe\n", "TIMEOUT_SECS=soon\n", "TIMEOUT_SECS=0\n"] {
            let cfg = make_config(contents);
            assert!(read_env_config(cfg.path()).is_err(), "{contents:?} accepted");
        }
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cfg = make_config("MEDIA_ROOT=/yt\n");
        let parsed = read_env_config(cfg.path()).unwrap().unwrap();
        assert!(parsed.fetcher.is_none());
    }
}
