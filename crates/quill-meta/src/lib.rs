//! Front-matter extraction for Quill documents.
//!
//! A document may start with a YAML block fenced by `---` lines. The block is
//! parsed into [`Attributes`] and the rest of the file is returned verbatim as
//! the body:
//!
//! ```
//! use quill_meta::parse_front_matter;
//!
//! let doc = parse_front_matter("---\ntitle: Hello\n---\n# Body\n").unwrap();
//! assert_eq!(doc.attributes["title"], "Hello");
//! assert_eq!(doc.body, "# Body\n");
//! assert_eq!(doc.body_line, 4);
//! ```
//!
//! Text without a leading delimiter has no front-matter: the attributes are
//! empty and the body is the whole input.

mod front_matter;

pub use front_matter::{Attributes, FrontMatter, FrontMatterError, parse_front_matter};
