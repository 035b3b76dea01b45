//! Conversion of bare URLs and e-mail addresses into links.

use std::sync::LazyLock;

use regex::Regex;

use crate::state::escape_html;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:https?://|www\.)[^\s<>"]*[^\s<>".,:;'!?)\]]|[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}\b"#,
    )
    .unwrap()
});

/// A piece of source text, either plain or a bare link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Link(&'a str),
}

impl<'a> Segment<'a> {
    pub(crate) fn as_str(&self) -> &'a str {
        match *self {
            Segment::Text(s) | Segment::Link(s) => s,
        }
    }
}

/// Split `text` around bare links. Empty text segments are skipped.
pub(crate) fn split_links(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for found in LINK_PATTERN.find_iter(text) {
        if found.start() > last {
            segments.push(Segment::Text(&text[last..found.start()]));
        }
        segments.push(Segment::Link(found.as_str()));
        last = found.end();
    }
    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }
    segments
}

/// Render a bare link found by [`split_links`] as an `<a>` element.
pub(crate) fn link_html(link: &str) -> String {
    let href = if link.contains("://") {
        link.to_owned()
    } else if link.contains('@') {
        format!("mailto:{link}")
    } else {
        format!("http://{link}")
    };
    format!(
        r#"<a href="{}">{}</a>"#,
        escape_html(&href),
        escape_html(link)
    )
}
