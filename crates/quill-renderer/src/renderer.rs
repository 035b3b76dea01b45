//! Markdown renderer.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd, TextMergeStream};

use crate::highlight::highlight;
use crate::linkify::{Segment, link_html, split_links};
use crate::options::MarkdownOptions;
use crate::state::{
    CodeBlockState, CompletedHeading, HeadingState, ImageState, TableState, TocEntry, escape_html,
};
use crate::toc::expand_placeholders;
use crate::typographer::typeset;
use crate::util::{fence_language, heading_level_to_num};

/// Result of rendering markdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered HTML fragment.
    pub html: String,
    /// Table of contents entries in document order.
    pub toc: Vec<TocEntry>,
}

/// Markdown renderer configured once and reused for every document.
#[derive(Clone, Debug, Default)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    #[must_use]
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    /// Render markdown text to an HTML fragment.
    #[must_use]
    pub fn render(&self, markdown: &str) -> RenderResult {
        let parser = Parser::new_ext(markdown, self.options.parser_options());
        let mut writer = HtmlWriter::new(&self.options);
        for event in TextMergeStream::new(parser) {
            writer.process_event(event);
        }
        writer.finish()
    }
}

/// Per-render event writer.
struct HtmlWriter<'o> {
    options: &'o MarkdownOptions,
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    /// Nesting depth of links; bare URLs inside links are left alone.
    link_depth: usize,
    /// Last character written in the current block, for quote direction.
    prev_char: Option<char>,
}

impl<'o> HtmlWriter<'o> {
    fn new(options: &'o MarkdownOptions) -> Self {
        Self {
            options,
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            pending_image: None,
            link_depth: 0,
            prev_char: None,
        }
    }

    fn finish(mut self) -> RenderResult {
        let toc = self.heading.take_toc();
        let mut html = self.output;
        if self.options.toc {
            expand_placeholders(&mut html, &toc);
        }
        RenderResult { html, toc }
    }

    /// Push content to output or heading buffer based on context.
    ///
    /// Markup inside image alt text is dropped.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => {
                self.prev_char = Some('\n');
                self.push_inline("<br>");
            }
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not enabled in parser options
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        if matches!(
            tag,
            Tag::Paragraph
                | Tag::Heading { .. }
                | Tag::BlockQuote(_)
                | Tag::Item
                | Tag::TableCell
                | Tag::DefinitionListTitle
                | Tag::DefinitionListDefinition
        ) {
            self.prev_char = None;
        }
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the ID is known.
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(ref info) => fence_language(info),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(language);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => self.output.push_str(&format!(r#"<ol start="{n}">"#)),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                self.output.push_str(&format!("<{tag}{align}>"));
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                self.link_depth += 1;
                let title_attr = if title.is_empty() {
                    String::new()
                } else {
                    format!(r#" title="{}""#, escape_html(&title))
                };
                let link_tag = format!(r#"<a href="{}"{title_attr}>"#, escape_html(&dest_url));
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the end tag
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.complete_heading() {
                    self.write_heading(heading);
                }
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                let (language, content) = self.code.end();
                let html = self.code_block(language.as_deref(), &content);
                self.output.push_str(&html);
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let title_attr = if title.is_empty() {
                        String::new()
                    } else {
                        format!(r#" title="{}""#, escape_html(&title))
                    };
                    let img = format!(
                        r#"<img src="{}"{title_attr} alt="{}">"#,
                        escape_html(&src),
                        escape_html(&alt)
                    );
                    self.push_inline(&img);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => {
                self.link_depth = self.link_depth.saturating_sub(1);
                self.push_inline("</a>");
            }
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
        }
    }

    fn write_heading(&mut self, heading: CompletedHeading) {
        let CompletedHeading { level, id, html } = heading;
        let id = escape_html(&id);
        self.output.push_str(&format!(
            r#"<h{level} id="{id}" tabindex="-1">{}"#,
            html.trim()
        ));
        let anchors = &self.options.anchors;
        if anchors.permalink {
            // Symbol is inserted as HTML so icon markup can be configured.
            self.output.push_str(&format!(
                r##" <a class="header-anchor" href="#{id}" aria-hidden="true">{}</a>"##,
                anchors.permalink_symbol
            ));
        }
        self.output.push_str(&format!("</h{level}>"));
    }

    fn code_block(&self, language: Option<&str>, content: &str) -> String {
        match (self.options.highlight, language) {
            (true, Some(language)) => {
                let body = highlight(language, content).unwrap_or_else(|| escape_html(content));
                format!(
                    r#"<pre><code class="hljs language-{}">{body}</code></pre>"#,
                    escape_html(language)
                )
            }
            (true, None) => format!(
                r#"<pre><code class="hljs">{}</code></pre>"#,
                escape_html(content)
            ),
            (false, Some(language)) => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(language),
                escape_html(content)
            ),
            (false, None) => format!("<pre><code>{}</code></pre>", escape_html(content)),
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
            return;
        }
        if self.image.is_active() {
            self.image.push_str(text);
            return;
        }

        let segments = if self.options.linkify && self.link_depth == 0 {
            split_links(text)
        } else {
            vec![Segment::Text(text)]
        };
        for segment in segments {
            let (plain, html) = match segment {
                Segment::Text(s) if self.options.typographer => {
                    let typed = typeset(s, self.prev_char);
                    let html = escape_html(&typed);
                    (typed, html)
                }
                Segment::Text(s) => (s.to_owned(), escape_html(s)),
                Segment::Link(link) => (link.to_owned(), link_html(link)),
            };
            if let Some(last) = segment.as_str().chars().next_back() {
                self.prev_char = Some(last);
            }

            if self.heading.is_active() {
                self.heading.push_text(&plain);
                self.heading.push_html(&html);
            } else {
                self.output.push_str(&html);
            }
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(last) = code.chars().next_back() {
            self.prev_char = Some(last);
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.push_inline(&format!("<code>{}</code>", escape_html(code)));
    }

    fn raw_html(&mut self, html: &str) {
        if self.options.html {
            self.push_inline(html);
        } else {
            self.push_inline(&escape_html(html));
        }
    }

    fn soft_break(&mut self) {
        self.prev_char = Some('\n');
        if self.code.is_active() {
            self.code.push_newline();
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html("\n");
        } else {
            self.output.push('\n');
        }
    }

    fn task_list_marker(&mut self, checked: bool) {
        if checked {
            self.output
                .push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            self.output.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}
