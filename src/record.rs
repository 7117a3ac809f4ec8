//! The per-line video record and its validation.

use std::fmt;

use thiserror::Error;

use crate::extract::ScrapeMode;

/// Record being filled while the fetched lines are scanned.
///
/// Counters stay `None` until their marker shows up, which is how a page
/// missing one of them gets caught by [`VideoRecord::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoRecord {
    pub link: String,
    pub title: String,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
}

/// A record that passed validation. Only these reach the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecord {
    link: String,
    title: Option<String>,
    views: u64,
    likes: u64,
    comments: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Likes,
    Comments,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Counter::Views => "views",
            Counter::Likes => "likes",
            Counter::Comments => "comments",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("{0} counter not found in page")]
    MissingCounter(Counter),
    #[error("{0} counter is negative ({1})")]
    NegativeCounter(Counter, i64),
    #[error("title not found in page")]
    MissingTitle,
}

impl VideoRecord {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Self::default()
        }
    }

    pub fn is_valid(&self, mode: ScrapeMode) -> bool {
        self.check(mode).is_ok()
    }

    /// Consumes the record, returning the validated form when every counter
    /// is set and non-negative and, in titled mode, the title is non-empty.
    pub fn validate(self, mode: ScrapeMode) -> Result<ValidRecord, RecordError> {
        let (views, likes, comments) = self.check(mode)?;
        let title = mode.wants_title().then_some(self.title);
        Ok(ValidRecord {
            link: self.link,
            title,
            views,
            likes,
            comments,
        })
    }

    fn check(&self, mode: ScrapeMode) -> Result<(u64, u64, u64), RecordError> {
        if mode.wants_title() && self.title.is_empty() {
            return Err(RecordError::MissingTitle);
        }
        Ok((
            counter_value(Counter::Views, self.views)?,
            counter_value(Counter::Likes, self.likes)?,
            counter_value(Counter::Comments, self.comments)?,
        ))
    }
}

fn counter_value(counter: Counter, value: Option<i64>) -> Result<u64, RecordError> {
    let value = value.ok_or(RecordError::MissingCounter(counter))?;
    u64::try_from(value).map_err(|_| RecordError::NegativeCounter(counter, value))
}

impl ValidRecord {
    pub fn link(&self) -> &str {
        &self.link
    }

    /// `None` in counters-only mode.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn views(&self) -> u64 {
        self.views
    }

    pub fn likes(&self) -> u64 {
        self.likes
    }

    pub fn comments(&self) -> u64 {
        self.comments
    }
}
