//! Per-document state.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use quill_meta::Attributes;
use quill_renderer::TocEntry;
use serde_json::Value;

/// Layout used when a document does not name one.
pub const DEFAULT_LAYOUT: &str = "default";

/// Document body as it moves through the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// Markdown text, before rendering.
    Markdown(String),
    /// Rendered HTML that templates still escape.
    Html(String),
    /// Rendered HTML emitted unescaped by templates.
    Safe(String),
}

impl Body {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Markdown(text) | Self::Html(text) | Self::Safe(text) => text,
        }
    }

    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe(_))
    }

    /// Mark the body render-safe, whatever its current form.
    pub(crate) fn mark_safe(&mut self) {
        let text = match self {
            Self::Markdown(text) | Self::Html(text) | Self::Safe(text) => std::mem::take(text),
        };
        *self = Self::Safe(text);
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::Markdown(String::new())
    }
}

/// A content file on its way to rendered HTML.
///
/// Created fresh for every pass, handed to each hook, and dropped once the
/// output is written.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Path of the source file.
    pub source_path: PathBuf,
    /// Source path relative to the content root.
    pub relative_path: PathBuf,
    /// Output path relative to the output root.
    pub output_path: PathBuf,
    /// Full source text including front-matter.
    pub raw_text: String,
    /// Front-matter attributes.
    pub attributes: Attributes,
    /// Markdown the body was rendered from, set once markdown is rendered.
    pub raw_body: Option<String>,
    pub body: Body,
    /// Headings of the rendered body.
    pub toc: Vec<TocEntry>,
    /// Layout file, set once the layout is resolved.
    pub layout_file: Option<PathBuf>,
    pub modified_time: Option<DateTime<Utc>>,
    pub created_time: Option<DateTime<Utc>>,
    /// Site-wide data.
    pub site: Value,
}

impl Document {
    /// Layout named by the `layout` attribute.
    ///
    /// Missing, empty, or non-string values select [`DEFAULT_LAYOUT`].
    #[must_use]
    pub fn layout_name(&self) -> &str {
        self.attributes
            .get("layout")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_LAYOUT)
    }

    /// Template context for this document.
    ///
    /// Every attribute is available at top level (`{{title}}`) and under
    /// `attributes`. Document fields are added after the attributes and take
    /// precedence over attributes with the same name.
    #[must_use]
    pub fn context(&self) -> Value {
        let mut context = self.attributes.clone();
        context.insert(
            "attributes".to_owned(),
            Value::Object(self.attributes.clone()),
        );
        context.insert("body".to_owned(), Value::from(self.body.as_str()));
        context.insert(
            "rawBody".to_owned(),
            self.raw_body.as_deref().map_or(Value::Null, Value::from),
        );
        context.insert(
            "toc".to_owned(),
            serde_json::to_value(&self.toc).unwrap_or_default(),
        );
        context.insert(
            "markdownFile".to_owned(),
            Value::from(self.source_path.display().to_string()),
        );
        context.insert(
            "layoutFile".to_owned(),
            self.layout_file
                .as_ref()
                .map_or(Value::Null, |p| Value::from(p.display().to_string())),
        );
        context.insert(
            "outputFile".to_owned(),
            Value::from(self.output_path.display().to_string()),
        );
        context.insert("modifiedTime".to_owned(), timestamp(self.modified_time));
        context.insert("createdTime".to_owned(), timestamp(self.created_time));
        context.insert("site".to_owned(), self.site.clone());
        Value::Object(context)
    }
}

fn timestamp(time: Option<DateTime<Utc>>) -> Value {
    time.map_or(Value::Null, |t| {
        Value::from(t.to_rfc3339_opts(SecondsFormat::Millis, true))
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn document(attributes: Value) -> Document {
        let Value::Object(attributes) = attributes else {
            panic!("attributes must be an object");
        };
        Document {
            source_path: PathBuf::from("/site/content/guide.md"),
            relative_path: PathBuf::from("guide.md"),
            output_path: PathBuf::from("guide.html"),
            attributes,
            ..Document::default()
        }
    }

    #[test]
    fn test_layout_name_defaults() {
        assert_eq!(document(json!({})).layout_name(), "default");
        assert_eq!(document(json!({"layout": ""})).layout_name(), "default");
        assert_eq!(document(json!({"layout": 3})).layout_name(), "default");
        assert_eq!(document(json!({"layout": "blog"})).layout_name(), "blog");
    }

    #[test]
    fn test_mark_safe_keeps_text() {
        let mut body = Body::Html("<p>x</p>".to_owned());
        body.mark_safe();
        assert_eq!(body, Body::Safe("<p>x</p>".to_owned()));
        assert!(body.is_safe());
    }

    #[test]
    fn test_context_fields() {
        let mut doc = document(json!({"title": "Hi", "tags": ["a"]}));
        doc.raw_body = Some("# Hello".to_owned());
        doc.body = Body::Safe("<h1>Hello</h1>".to_owned());
        doc.layout_file = Some(PathBuf::from("/site/templates/default.hbs"));
        doc.modified_time = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        doc.site = json!({"name": "Docs"});
        doc.toc = vec![TocEntry {
            level: 1,
            title: "Hello".to_owned(),
            id: "hello".to_owned(),
        }];

        let context = doc.context();
        assert_eq!(context["title"], "Hi");
        assert_eq!(context["attributes"]["tags"], json!(["a"]));
        assert_eq!(context["body"], "<h1>Hello</h1>");
        assert_eq!(context["rawBody"], "# Hello");
        assert_eq!(context["markdownFile"], "/site/content/guide.md");
        assert_eq!(context["layoutFile"], "/site/templates/default.hbs");
        assert_eq!(context["outputFile"], "guide.html");
        assert_eq!(context["modifiedTime"], "2024-05-01T12:00:00.000Z");
        assert_eq!(context["createdTime"], Value::Null);
        assert_eq!(context["site"]["name"], "Docs");
        assert_eq!(
            context["toc"],
            json!([{"level": 1, "title": "Hello", "id": "hello"}])
        );
    }

    #[test]
    fn test_document_fields_override_attributes() {
        let doc = document(json!({"outputFile": "spoofed", "site": 1}));
        let context = doc.context();
        assert_eq!(context["outputFile"], "guide.html");
        assert_eq!(context["site"], Value::Null);
        assert_eq!(context["attributes"]["outputFile"], "spoofed");
    }
}
