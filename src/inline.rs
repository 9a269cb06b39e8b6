//! Inline formatting for a single line: links, then strong, then emphasis.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::Inline;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));
static STRONG_STAR: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static STRONG_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"__([^_]+)__").expect("valid regex"));
static EMPHASIS_STAR: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\*([^*]+)\*").expect("valid regex"));
static EMPHASIS_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"_([^_]+)_").expect("valid regex"));

/// Split one line into inline fragments.
///
/// Passes run in a fixed order and each only looks at the plain-text
/// fragments left by the previous one, so link targets and labels are
/// never reinterpreted as emphasis.
pub fn format_inline(text: &str) -> Vec<Inline> {
    let mut fragments = format_links(text);
    fragments = split_text_fragments(fragments, &STRONG_STAR, |cap| return Inline::Strong(cap[1].to_string()));
    fragments = split_text_fragments(fragments, &STRONG_UNDERSCORE, |cap| return Inline::Strong(cap[1].to_string()));
    fragments = split_text_fragments(fragments, &EMPHASIS_STAR, |cap| return Inline::Emphasis(cap[1].to_string()));
    fragments = split_text_fragments(fragments, &EMPHASIS_UNDERSCORE, |cap| return Inline::Emphasis(cap[1].to_string()));
    return fragments;
}

/// Links leaving the site get `target="_blank"` and `rel="noopener noreferrer"`.
pub fn is_external(url: &str) -> bool {
    return url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//");
}

/// Only the link pass of `format_inline`. Headings, coloured lines and
/// panel values keep `*` and `_` literal but still carry links, including
/// the ones contact substitution writes.
pub fn format_links(text: &str) -> Vec<Inline> {
    return split_text_fragments(vec![Inline::Text(text.to_string())], &LINK, |cap| {
        let url = cap[2].to_string();
        return Inline::Link { external: is_external(&url), label: cap[1].to_string(), url };
    });
}

/// Split at the first `sep` that is not inside a `[label](url)` link.
pub fn split_outside_links(text: &str, sep: char) -> Option<(&str, &str)> {
    let links: Vec<_> = LINK.find_iter(text).map(|m| return m.range()).collect();
    let (at, _) = text
        .match_indices(sep)
        .find(|(i, _)| return !links.iter().any(|span| return span.contains(i)))?;
    let (head, tail) = text.split_at(at);
    return Some((head, tail.get(sep.len_utf8()..).unwrap_or_default()));
}

/// Replace every match of `pattern` inside `Text` fragments with the
/// fragment `make` builds, keeping the unmatched text around it.
fn split_text_fragments<F>(fragments: Vec<Inline>, pattern: &Regex, make: F) -> Vec<Inline>
where
    F: Fn(&Captures<'_>) -> Inline,
{
    let mut out = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        let Inline::Text(text) = fragment else {
            out.push(fragment);
            continue;
        };

        let mut last = 0;
        for cap in pattern.captures_iter(&text) {
            let Some(whole) = cap.get(0) else { continue };
            if whole.start() > last {
                out.push(Inline::Text(text[last..whole.start()].to_string()));
            }
            out.push(make(&cap));
            last = whole.end();
        }
        if last < text.len() {
            out.push(Inline::Text(text[last..].to_string()));
        }
    }
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn plain_line_is_one_text_fragment() {
        assert_eq!(format_inline("A short description"), vec![text("A short description")]);
    }

    #[test]
    fn external_and_local_links() {
        let out = format_inline("see [site](https://example.com) or [cv](/cv.pdf)");
        assert_eq!(
            out,
            vec![
                text("see "),
                Inline::Link { external: true, label: "site".into(), url: "https://example.com".into() },
                text(" or "),
                Inline::Link { external: false, label: "cv".into(), url: "/cv.pdf".into() },
            ]
        );
        assert!(is_external("//cdn.example.com/x.js"));
        assert!(!is_external("#"));
    }

    #[test]
    fn strong_before_emphasis() {
        let out = format_inline("**bold** and *soft* and __also__ and _too_");
        assert_eq!(
            out,
            vec![
                Inline::Strong("bold".into()),
                text(" and "),
                Inline::Emphasis("soft".into()),
                text(" and "),
                Inline::Strong("also".into()),
                text(" and "),
                Inline::Emphasis("too".into()),
            ]
        );
    }

    #[test]
    fn link_targets_are_not_reformatted() {
        let out = format_inline("[my_file](files/my_long_name.txt)");
        assert_eq!(
            out,
            vec![Inline::Link { external: false, label: "my_file".into(), url: "files/my_long_name.txt".into() }]
        );
    }

    #[test]
    fn unclosed_delimiters_stay_literal() {
        assert_eq!(format_inline("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
        assert_eq!(format_inline("[label](unclosed"), vec![text("[label](unclosed")]);
    }

    #[test]
    fn non_greedy_within_delimiter() {
        let out = format_inline("*a* b *c*");
        assert_eq!(out, vec![Inline::Emphasis("a".into()), text(" b "), Inline::Emphasis("c".into())]);
    }

    #[test]
    fn link_pass_alone_keeps_emphasis_literal() {
        assert_eq!(
            format_links("Mail *me* [here](email:reveal)"),
            vec![
                text("Mail *me* "),
                Inline::Link { external: false, label: "here".into(), url: "email:reveal".into() },
            ]
        );
    }

    #[test]
    fn split_skips_separators_inside_links() {
        assert_eq!(split_outside_links("Role: Lead", ':'), Some(("Role", " Lead")));
        assert_eq!(split_outside_links("[Click to reveal email](email:reveal)", ':'), None);
        assert_eq!(
            split_outside_links("[cv](https://x.io/cv): latest", ':'),
            Some(("[cv](https://x.io/cv)", " latest"))
        );
    }
}
