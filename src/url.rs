//! Shape check for the links read from stdin.

use crate::extract::leading_int;

/// Every supported link starts with this prefix.
pub const VIMEO_PREFIX: &str = "http://vimeo.com/";

/// Common link format is `http://vimeo.com/XXXXXXXX`.
pub const VIMEO_URL_LEN: usize = 25;

/// Returns `true` when `line` is a canonical Vimeo link: exactly
/// [`VIMEO_URL_LEN`] bytes, starting with [`VIMEO_PREFIX`], with an id that
/// reads as a positive integer.
///
/// A trailing newline is ignored. The id is read with the same lenient
/// leading-integer rule the counters use, so `http://vimeo.com/1234abcd`
/// passes while `http://vimeo.com/0000000a` does not.
pub fn is_valid_url(line: &str) -> bool {
    let url = strip_newline(line);
    if url.len() != VIMEO_URL_LEN {
        return false;
    }
    match url.strip_prefix(VIMEO_PREFIX) {
        Some(id) => leading_int(id) > 0,
        None => false,
    }
}

/// Drops trailing `\n`/`\r` characters.
pub fn strip_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_link() {
        assert!(is_valid_url("http://vimeo.com/12345678"));
        assert!(is_valid_url("http://vimeo.com/12345678\n"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("http://vimeo.com/1234567"));
        assert!(!is_valid_url("http://vimeo.com/123456789"));
        assert!(!is_valid_url("http://vimeo.com/"));
    }

    #[test]
    fn rejects_wrong_prefix_of_right_length() {
        let https = "https://vimeo.com/1234567";
        assert_eq!(https.len(), VIMEO_URL_LEN);
        assert!(!is_valid_url(https));

        let other_host = "http://vimeo.net/12345678";
        assert_eq!(other_host.len(), VIMEO_URL_LEN);
        assert!(!is_valid_url(other_host));

        assert!(!is_valid_url("HTTP://VIMEO.COM/12345678"));
    }

    #[test]
    fn rejects_non_positive_ids() {
        assert!(!is_valid_url("http://vimeo.com/0000000a"));
        assert!(!is_valid_url("http://vimeo.com/00000000"));
        assert!(!is_valid_url("http://vimeo.com/-1234567"));
        assert!(!is_valid_url("http://vimeo.com/abcdefgh"));
    }

    #[test]
    fn id_uses_leading_digits_only() {
        assert!(is_valid_url("http://vimeo.com/1234abcd"));
    }
}
