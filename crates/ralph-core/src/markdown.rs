//! Text scanning primitives shared by the context and story extractors.
//!
//! Sections are located with a heading regex and then run lazily until the
//! first of a set of stop strings, or the end of the text. At least one
//! character is always taken, and a single trailing newline at the very end
//! of the text is never part of a section.

use regex::Regex;

/// End offset of the shortest non-empty run starting at `start` that is
/// followed by one of `stops` or by the end of `text`. `None` when `start`
/// is already at the end.
pub fn lazy_end(text: &str, start: usize, stops: &[&str]) -> Option<usize> {
    let first = text.get(start..)?.chars().next()?;
    let from = start + first.len_utf8();

    let mut end = if text.ends_with('\n') && text.len() > from {
        text.len() - 1
    } else {
        text.len()
    };
    for stop in stops {
        if let Some(i) = text[from..].find(stop) {
            end = end.min(from + i);
        }
    }
    Some(end)
}

/// The body following the first match of `heading`, cut at the first stop.
pub fn section<'a>(text: &'a str, heading: &Regex, stops: &[&str]) -> Option<&'a str> {
    let m = heading.find(text)?;
    let end = lazy_end(text, m.end(), stops)?;
    Some(&text[m.end()..end])
}

/// Every match of `marker` paired with the body that follows it. Scanning
/// resumes where the previous body ended, so bodies never overlap.
pub fn marked_runs<'a>(
    text: &'a str,
    marker: &Regex,
    stops: &[&str],
) -> Vec<(regex::Captures<'a>, &'a str)> {
    let mut runs = Vec::new();
    let mut pos = 0;
    while let Some(caps) = marker.captures_at(text, pos) {
        let m = caps.get(0).map_or(0..0, |m| m.range());
        let Some(end) = lazy_end(text, m.end, stops) else {
            break;
        };
        let body = &text[m.end..end];
        runs.push((caps, body));
        pos = end;
    }
    runs
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// `s` cut to `max` characters with `...` appended, when it is longer.
pub fn truncate_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", truncate_chars(s, max))
    } else {
        s.to_string()
    }
}
