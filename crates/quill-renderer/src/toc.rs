//! Table of contents placeholder expansion.

use crate::state::{TocEntry, escape_html};

/// Paragraphs replaced by the table of contents.
const PLACEHOLDERS: [&str; 2] = ["<p>${toc}</p>", "<p>[[toc]]</p>"];

/// Replace every table of contents placeholder paragraph in `html`.
pub(crate) fn expand_placeholders(html: &mut String, entries: &[TocEntry]) {
    if !PLACEHOLDERS.iter().any(|p| html.contains(p)) {
        return;
    }
    let nav = render_toc(entries);
    for placeholder in PLACEHOLDERS {
        if html.contains(placeholder) {
            *html = html.replace(placeholder, &nav);
        }
    }
}

/// Render entries as nested ordered lists.
///
/// `open_levels` holds the level of the last item in each open list. A
/// heading deeper than that item opens a nested list under it; otherwise the
/// heading becomes a sibling once every list whose parent item is at the same
/// or a deeper level has been closed. The root list is never closed early, so
/// a document starting at `h2` still yields a single root list.
pub(crate) fn render_toc(entries: &[TocEntry]) -> String {
    let mut out = String::from(r#"<nav class="table-of-contents">"#);
    let mut open_levels: Vec<u8> = Vec::new();

    for entry in entries {
        while open_levels.len() > 1 && open_levels[open_levels.len() - 2] >= entry.level {
            out.push_str("</li></ol>");
            open_levels.pop();
        }
        match open_levels.last_mut() {
            Some(top) if *top >= entry.level => {
                out.push_str("</li><li>");
                *top = entry.level;
            }
            _ => {
                out.push_str("<ol><li>");
                open_levels.push(entry.level);
            }
        }
        out.push_str(&format!(
            r##"<a href="#{}">{}</a>"##,
            escape_html(&entry.id),
            escape_html(&entry.title)
        ));
    }

    for _ in &open_levels {
        out.push_str("</li></ol>");
    }
    out.push_str("</nav>");
    out
}
