//! Per-field extractors for Google Scholar result blocks.
//!
//! Scholar does not expose structured metadata; the byline under each result
//! (`div.gs_a`) is a loosely hyphen-delimited line such as
//! `"J Smith, A Doe - Nature, 2019 - nature.com"`. Each extractor here is a
//! pure function over that text with its own fallback contract, so a failure
//! in one field never disturbs the others. Callers substitute sentinel values
//! when an extractor returns `None`.

/// Marker preceding the citation count inside a result block.
const CITED_BY_MARKER: &str = "Cited by ";

/// Maximum digits scanned after the "Cited by " marker.
const MAX_COUNT_DIGITS: usize = 5;

/// Extract the citation count from a result block's inner HTML.
///
/// Scans for the last `"Cited by "` occurrence and reads up to five digit
/// characters terminated by the next tag boundary. Returns `None` when the
/// marker is absent or the scanned text is not a number.
pub fn citation_count(block_html: &str) -> Option<u32> {
    let start = block_html.rfind(CITED_BY_MARKER)? + CITED_BY_MARKER.len();
    let digits: String = block_html[start..]
        .chars()
        .take_while(|c| *c != '<')
        .take(MAX_COUNT_DIGITS)
        .collect();
    digits.parse().ok()
}

/// Extract the publication year from a metadata line.
///
/// Looks at the last hyphen and takes the four characters ending two before
/// it (the typical shape is `"... 2019 - nature.com"`). Returns 0 when the
/// line has no hyphen or those characters are not all digits — the documented
/// sentinel, which downstream skews the cit/year metric for that row.
pub fn year(meta: &str) -> u32 {
    let chars: Vec<char> = meta.chars().collect();
    let Some(pos) = chars.iter().rposition(|c| *c == '-') else {
        return 0;
    };
    if pos < 5 {
        return 0;
    }
    let candidate = &chars[pos - 5..pos - 1];
    if candidate.iter().all(|c| c.is_ascii_digit()) {
        candidate.iter().collect::<String>().parse().unwrap_or(0)
    } else {
        0
    }
}

/// Extract the author string: everything before the first `" - "` separator,
/// with non-breaking spaces normalized to regular spaces.
pub fn author(meta: &str) -> Option<String> {
    if meta.is_empty() {
        return None;
    }
    let normalized = meta.replace('\u{a0}', " ");
    let first = normalized.split(" - ").next().unwrap_or(&normalized);
    Some(first.to_string())
}

/// Extract the publisher: the text after the last hyphen, untrimmed.
///
/// The leading space in `" nature.com"` is part of the contract; the original
/// column values carry it and consumers have come to expect it.
pub fn publisher(meta: &str) -> String {
    meta.rsplit('-').next().unwrap_or(meta).to_string()
}

/// Extract the venue from a metadata line.
///
/// Takes the second-to-last hyphen-delimited segment. When that segment is a
/// bare four-digit year (the `"authors - venue - year - publisher"` shape),
/// steps back one more segment. A segment containing commas loses its last
/// comma token (which is the year in the `"venue, year"` shape). Returns
/// `None` when no venue can be located.
pub fn venue(meta: &str) -> Option<String> {
    let segments: Vec<&str> = meta.split('-').collect();
    if segments.len() < 2 {
        return None;
    }
    let mut idx = segments.len() - 2;
    if is_year_token(segments[idx]) && idx > 0 {
        idx -= 1;
    }
    let segment = segments[idx];

    let out = if segment.contains(',') {
        let tokens: Vec<&str> = segment.split(',').collect();
        tokens[..tokens.len() - 1].join(" ").trim().to_string()
    } else {
        segment.trim().to_string()
    };

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn is_year_token(segment: &str) -> bool {
    let t = segment.trim();
    t.len() == 4 && t.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = "J Smith, A Doe - Nature - 2019 - nature.com";

    #[test]
    fn test_citation_count_digit_widths() {
        for n in ["3", "42", "137", "2048", "65535"] {
            let html = format!("<a href=\"/scholar?cites=123\">Cited by {}</a>", n);
            assert_eq!(citation_count(&html), n.parse().ok(), "width {}", n.len());
        }
    }

    #[test]
    fn test_citation_count_takes_last_marker() {
        let html = "Cited by 5</a> ... <a>Cited by 99</a>";
        assert_eq!(citation_count(html), Some(99));
    }

    #[test]
    fn test_citation_count_missing_marker() {
        assert_eq!(citation_count("<div>Related articles</div>"), None);
    }

    #[test]
    fn test_citation_count_non_numeric() {
        assert_eq!(citation_count("Cited by </a>"), None);
    }

    #[test]
    fn test_year_from_metadata_line() {
        assert_eq!(year(META), 2019);
        assert_eq!(year("A Author - Physics Letters B, 1997 - elsevier.com"), 1997);
    }

    #[test]
    fn test_year_invalid_token_is_zero() {
        assert_eq!(year("A Author - no date here - publisher"), 0);
        assert_eq!(year("no hyphen at all"), 0);
        assert_eq!(year(""), 0);
    }

    #[test]
    fn test_year_with_nbsp() {
        // Non-breaking spaces are multi-byte; the scan must stay char-safe.
        assert_eq!(year("J\u{a0}Smith - Nature, 2019 - nature.com"), 2019);
    }

    #[test]
    fn test_author_before_first_separator() {
        assert_eq!(author(META).as_deref(), Some("J Smith, A Doe"));
    }

    #[test]
    fn test_author_normalizes_nbsp() {
        assert_eq!(
            author("J\u{a0}Smith - Nature - 2019 - nature.com").as_deref(),
            Some("J Smith")
        );
    }

    #[test]
    fn test_author_empty_line() {
        assert_eq!(author(""), None);
    }

    #[test]
    fn test_publisher_keeps_leading_space() {
        assert_eq!(publisher(META), " nature.com");
    }

    #[test]
    fn test_publisher_without_hyphen_is_whole_line() {
        assert_eq!(publisher("nature.com"), "nature.com");
    }

    #[test]
    fn test_venue_year_in_own_segment() {
        assert_eq!(venue(META).as_deref(), Some("Nature"));
    }

    #[test]
    fn test_venue_comma_joined_with_year() {
        assert_eq!(
            venue("J Smith, A Doe - Nature, 2019 - nature.com").as_deref(),
            Some("Nature")
        );
    }

    #[test]
    fn test_venue_unlocatable() {
        assert_eq!(venue("no separators here"), None);
    }

    #[test]
    fn test_end_to_end_metadata_line() {
        assert_eq!(author(META).as_deref(), Some("J Smith, A Doe"));
        assert_eq!(year(META), 2019);
        assert_eq!(venue(META).as_deref(), Some("Nature"));
        assert_eq!(publisher(META), " nature.com");
    }
}
