//! Turns the marker lines of a fetched page into a [`VideoRecord`].
//!
//! Vimeo pages carry their counters in meta tags such as
//! `<meta itemprop="interactionCount" content="UserPlays:1234">` and the
//! title in a `google_hints` attribute. The fetcher hands over only the lines
//! mentioning one of those keywords; this module picks the values out of
//! them. Nothing here fails: unreadable numbers become zero and missing
//! markers simply leave the field unset for [`VideoRecord::validate`] to
//! reject.

use tracing::trace;

use crate::record::VideoRecord;
use crate::url::strip_newline;

pub const VIEWS_MARKER: &str = "userplays:";
pub const LIKES_MARKER: &str = "userlikes:";
pub const COMMENTS_MARKER: &str = "usercomments:";

/// Titles longer than this are cut.
pub const MAX_TITLE_CHARS: usize = 200;

/// Which of the two scraping behaviours to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrapeMode {
    /// Quoted values are pulled out of each line first, markers must start
    /// the value, and any other line is taken as the title. A record needs a
    /// title to be valid.
    #[default]
    Titled,
    /// Markers may appear anywhere in the raw line and no title is kept.
    CountersOnly,
}

impl ScrapeMode {
    pub fn wants_title(self) -> bool {
        matches!(self, ScrapeMode::Titled)
    }
}

/// Builds a fresh record for `url` from the fetched `lines`.
pub fn extract<I, S>(url: &str, lines: I, mode: ScrapeMode) -> VideoRecord
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut record = VideoRecord::new(strip_newline(url));
    for line in lines {
        let line = strip_newline(line.as_ref());
        match mode {
            ScrapeMode::Titled => scan_titled_line(&mut record, line),
            ScrapeMode::CountersOnly => scan_counter_line(&mut record, line),
        }
    }
    record
}

fn scan_titled_line(record: &mut VideoRecord, line: &str) {
    let value = unquote(line);
    if let Some(rest) = strip_prefix_ignore_case(value, VIEWS_MARKER) {
        record.views = Some(leading_int(rest));
    } else if let Some(rest) = strip_prefix_ignore_case(value, LIKES_MARKER) {
        record.likes = Some(leading_int(rest));
    } else if let Some(rest) = strip_prefix_ignore_case(value, COMMENTS_MARKER) {
        record.comments = Some(leading_int(rest));
    } else {
        // Page structure is not reliable: the last non-counter line wins.
        trace!(candidate = value, "title candidate");
        record.title = truncate_chars(strip_newline(value), MAX_TITLE_CHARS).to_owned();
    }
}

fn scan_counter_line(record: &mut VideoRecord, line: &str) {
    if let Some(rest) = after_marker_ignore_case(line, VIEWS_MARKER) {
        record.views = Some(leading_int(rest));
    } else if let Some(rest) = after_marker_ignore_case(line, LIKES_MARKER) {
        record.likes = Some(leading_int(rest));
    } else if let Some(rest) = after_marker_ignore_case(line, COMMENTS_MARKER) {
        record.comments = Some(leading_int(rest));
    }
}

/// Returns the text between the last two quote characters (`'` or `"`) of
/// `line`, or the whole line when it holds fewer than two.
///
/// `content="UserPlays:42" />` becomes `UserPlays:42`.
pub fn unquote(line: &str) -> &str {
    let is_quote = |c: char| c == '"' || c == '\'';
    let Some(close) = line.rfind(is_quote) else {
        return line;
    };
    let Some(open) = line[..close].rfind(is_quote) else {
        return line;
    };
    &line[open + 1..close]
}

/// Reads a base-10 integer the way C's `atol` does: leading ASCII
/// whitespace and one sign are accepted, digits are consumed up to the first
/// non-digit, and no digits at all yields zero. Overflow saturates.
pub fn leading_int(text: &str) -> i64 {
    let text = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(byte - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    value
}

fn strip_prefix_ignore_case<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let head = line.get(..marker.len())?;
    head.eq_ignore_ascii_case(marker)
        .then(|| &line[marker.len()..])
}

fn after_marker_ignore_case<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    // ASCII lowercasing keeps byte offsets intact.
    let start = line.to_ascii_lowercase().find(marker)?;
    Some(&line[start + marker.len()..])
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://vimeo.com/12345678";

    fn page() -> Vec<&'static str> {
        vec![
            r#"<meta name="google_hints" content="A short film about rust">"#,
            r#"<meta itemprop="interactionCount" content="UserPlays:42" />"#,
            r#"<meta itemprop="interactionCount" content="UserLikes:7" />"#,
            r#"<meta itemprop="interactionCount" content="UserComments:3" />"#,
        ]
    }

    #[test]
    fn titled_mode_reads_all_fields() {
        let record = extract(URL, page(), ScrapeMode::Titled);
        assert_eq!(record.link, URL);
        assert_eq!(record.title, "A short film about rust");
        assert_eq!(record.views, Some(42));
        assert_eq!(record.likes, Some(7));
        assert_eq!(record.comments, Some(3));
    }

    #[test]
    fn missing_marker_leaves_counter_unset() {
        let lines = vec!["'userlikes:1'", "'usercomments:2'", "'Title'"];
        let record = extract(URL, lines, ScrapeMode::Titled);
        assert_eq!(record.views, None);
        assert!(!record.is_valid(ScrapeMode::Titled));
    }

    #[test]
    fn markers_are_case_insensitive() {
        let lines = vec!["USERPLAYS:10", "userLikes:5", "UserComments:2"];
        let record = extract(URL, lines, ScrapeMode::Titled);
        assert_eq!(
            (record.views, record.likes, record.comments),
            (Some(10), Some(5), Some(2))
        );
    }

    #[test]
    fn last_title_candidate_wins() {
        let lines = vec!["'first title'", "'UserPlays:1'", "'second title'\n"];
        let record = extract(URL, lines, ScrapeMode::Titled);
        assert_eq!(record.title, "second title");
    }

    #[test]
    fn titled_mode_needs_marker_at_value_start() {
        let lines = vec!["<p>total UserPlays:42</p>"];
        let record = extract(URL, lines, ScrapeMode::Titled);
        assert_eq!(record.views, None);
        assert_eq!(record.title, "<p>total UserPlays:42</p>");
    }

    #[test]
    fn counters_only_matches_anywhere_and_skips_title() {
        let record = extract(URL, page(), ScrapeMode::CountersOnly);
        assert_eq!(record.views, Some(42));
        assert_eq!(record.likes, Some(7));
        assert_eq!(record.comments, Some(3));
        assert!(record.title.is_empty());
    }

    #[test]
    fn garbage_after_marker_reads_as_zero() {
        let lines = vec!["'UserPlays:n/a'", "'UserLikes:12abc'"];
        let record = extract(URL, lines, ScrapeMode::Titled);
        assert_eq!(record.views, Some(0));
        assert_eq!(record.likes, Some(12));
    }

    #[test]
    fn long_titles_are_truncated() {
        let long = format!("'{}'", "é".repeat(MAX_TITLE_CHARS + 20));
        let record = extract(URL, [long.as_str()], ScrapeMode::Titled);
        assert_eq!(record.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn unquote_takes_last_quoted_span() {
        assert_eq!(unquote(r#"a="x" b='y'"#), "y");
        assert_eq!(unquote(r#"content="UserPlays:42" />"#), "UserPlays:42");
        assert_eq!(unquote("no quotes"), "no quotes");
        assert_eq!(unquote("one \" quote"), "one \" quote");
    }

    #[test]
    fn leading_int_follows_atol() {
        assert_eq!(leading_int("42"), 42);
        assert_eq!(leading_int("  17 views"), 17);
        assert_eq!(leading_int("+8"), 8);
        assert_eq!(leading_int("-3"), -3);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int(""), 0);
        assert_eq!(leading_int("99999999999999999999999"), i64::MAX);
        assert_eq!(leading_int("-99999999999999999999999"), i64::MIN);
    }
}
