//! Front-matter block detection and YAML parsing.

use serde_json::Value;

/// Attributes parsed from a front-matter block.
pub type Attributes = serde_json::Map<String, Value>;

/// Delimiters accepted on the first line of a document.
const OPENING_DELIMITERS: [&str; 2] = ["---", "= yaml ="];

/// Alternative closing delimiter accepted for any opening delimiter.
const DOCUMENT_END: &str = "...";

/// A document split into front-matter attributes and body.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    /// Parsed YAML mapping. Empty when the document has no front-matter.
    pub attributes: Attributes,
    /// Text following the closing delimiter line, verbatim.
    pub body: String,
    /// 1-based line number of the first body line.
    pub body_line: usize,
}

impl FrontMatter {
    fn without_attributes(text: &str) -> Self {
        Self {
            attributes: Attributes::new(),
            body: text.to_owned(),
            body_line: 1,
        }
    }
}

/// Front-matter extraction error.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    /// Opening delimiter present, closing delimiter missing.
    #[error("front-matter opened with `{delimiter}` is never closed")]
    Unclosed { delimiter: &'static str },
    /// Block is not valid YAML.
    #[error("invalid YAML in front-matter: {0}")]
    InvalidYaml(#[source] serde_yaml::Error),
    /// Block is valid YAML but not a mapping.
    #[error("front-matter must be a mapping, found {found}")]
    NotAMapping { found: &'static str },
}

/// Split `text` into front-matter attributes and body.
///
/// The first line (after an optional UTF-8 BOM) must be `---` or `= yaml =`
/// to open a block. The block ends at the next line equal to the opening
/// delimiter or to `...`. Trailing whitespace on delimiter lines is ignored
/// and both `\n` and `\r\n` line endings are accepted.
///
/// # Errors
///
/// Returns [`FrontMatterError`] if the block is unclosed, is not valid YAML,
/// or does not contain a mapping.
pub fn parse_front_matter(text: &str) -> Result<FrontMatter, FrontMatterError> {
    let content = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = content.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Ok(FrontMatter::without_attributes(text));
    };
    let Some(delimiter) = OPENING_DELIMITERS
        .into_iter()
        .find(|d| trim_line(first) == *d)
    else {
        return Ok(FrontMatter::without_attributes(text));
    };

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for (index, line) in lines.enumerate() {
        let line_end = offset + line.len();
        let trimmed = trim_line(line);
        if trimmed == delimiter || trimmed == DOCUMENT_END {
            let attributes = parse_attributes(&content[yaml_start..offset])?;
            return Ok(FrontMatter {
                attributes,
                body: content[line_end..].to_owned(),
                // Opening delimiter is line 1, `index` 0 is line 2.
                body_line: index + 3,
            });
        }
        offset = line_end;
    }

    Err(FrontMatterError::Unclosed { delimiter })
}

fn trim_line(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.trim_end_matches([' ', '\t'])
}

fn parse_attributes(yaml: &str) -> Result<Attributes, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(Attributes::new());
    }

    let value: Value = serde_yaml::from_str(yaml).map_err(FrontMatterError::InvalidYaml)?;
    match value {
        Value::Null => Ok(Attributes::new()),
        Value::Object(map) => Ok(map),
        Value::Bool(_) => Err(FrontMatterError::NotAMapping { found: "a boolean" }),
        Value::Number(_) => Err(FrontMatterError::NotAMapping { found: "a number" }),
        Value::String(_) => Err(FrontMatterError::NotAMapping { found: "a string" }),
        Value::Array(_) => Err(FrontMatterError::NotAMapping {
            found: "a sequence",
        }),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_no_front_matter_returns_whole_text() {
        let text = "# Title\n\nParagraph\n";
        let doc = parse_front_matter(text).unwrap();
        assert!(doc.attributes.is_empty());
        assert_eq!(doc.body, text);
        assert_eq!(doc.body_line, 1);
    }

    #[test]
    fn test_empty_text() {
        let doc = parse_front_matter("").unwrap();
        assert!(doc.attributes.is_empty());
        assert_eq!(doc.body, "");
        assert_eq!(doc.body_line, 1);
    }

    #[test]
    fn test_dashes_later_in_document_are_not_front_matter() {
        let text = "Intro\n---\ntitle: nope\n---\n";
        let doc = parse_front_matter(text).unwrap();
        assert!(doc.attributes.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_simple_front_matter() {
        let doc = parse_front_matter("---\ntitle: Hi\ntags: [a, b]\n---\n# Hello\n").unwrap();
        assert_eq!(doc.attributes["title"], json!("Hi"));
        assert_eq!(doc.attributes["tags"], json!(["a", "b"]));
        assert_eq!(doc.body, "# Hello\n");
        assert_eq!(doc.body_line, 5);
    }

    #[test]
    fn test_body_keeps_leading_blank_lines() {
        let doc = parse_front_matter("---\na: 1\n---\n\n\nText").unwrap();
        assert_eq!(doc.body, "\n\nText");
        assert_eq!(doc.body_line, 4);
    }

    #[test]
    fn test_closing_delimiter_at_end_of_input() {
        let doc = parse_front_matter("---\nlayout: blog\n---").unwrap();
        assert_eq!(doc.attributes["layout"], json!("blog"));
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = parse_front_matter("---\r\ntitle: Hi\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(doc.attributes["title"], json!("Hi"));
        assert_eq!(doc.body, "Body\r\n");
    }

    #[test]
    fn test_bom_and_trailing_spaces_on_delimiters() {
        let doc = parse_front_matter("\u{feff}---  \ntitle: Hi\n--- \nBody").unwrap();
        assert_eq!(doc.attributes["title"], json!("Hi"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_dots_close_block() {
        let doc = parse_front_matter("---\ntitle: Hi\n...\nBody").unwrap();
        assert_eq!(doc.attributes["title"], json!("Hi"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_yaml_equals_delimiter() {
        let doc = parse_front_matter("= yaml =\ntitle: Hi\n= yaml =\nBody").unwrap();
        assert_eq!(doc.attributes["title"], json!("Hi"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_empty_block_yields_empty_attributes() {
        let doc = parse_front_matter("---\n---\nBody").unwrap();
        assert!(doc.attributes.is_empty());
        assert_eq!(doc.body, "Body");
        assert_eq!(doc.body_line, 3);

        let doc = parse_front_matter("---\n~\n---\nBody").unwrap();
        assert!(doc.attributes.is_empty());
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse_front_matter("---\ntitle: Hi\n# Body\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unclosed { delimiter: "---" }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse_front_matter("---\ntitle: [unterminated\n---\nBody").unwrap_err();
        assert!(matches!(err, FrontMatterError::InvalidYaml(_)));
    }

    #[test]
    fn test_sequence_is_not_a_mapping() {
        let err = parse_front_matter("---\n- a\n- b\n---\nBody").unwrap_err();
        assert!(matches!(
            err,
            FrontMatterError::NotAMapping { found: "a sequence" }
        ));
        assert_eq!(err.to_string(), "front-matter must be a mapping, found a sequence");
    }

    #[test]
    fn test_nested_attributes() {
        let doc =
            parse_front_matter("---\nauthor:\n  name: Ada\n  year: 1843\ndraft: false\n---\n")
                .unwrap();
        assert_eq!(doc.attributes["author"], json!({"name": "Ada", "year": 1843}));
        assert_eq!(doc.attributes["draft"], json!(false));
    }
}
