//! Typographic replacements applied to text outside code and links.
//!
//! Runs on text segments after bare links have been split out, so URLs are
//! never rewritten.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static REPLACEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\((?:c|r|tm)\)|\+-|\?{4,}|!{4,}|,{2,}").unwrap());

/// Apply smart punctuation and symbol replacements.
///
/// `prev` is the character emitted just before `text` in the same block,
/// used to decide whether a quote opens or closes.
pub(crate) fn typeset(text: &str, prev: Option<char>) -> String {
    let punctuated = smart_punctuation(text, prev);
    replace_symbols(&punctuated).into_owned()
}

/// Apply symbol replacements to plain text.
pub(crate) fn replace_symbols(text: &str) -> Cow<'_, str> {
    REPLACEMENTS.replace_all(text, |caps: &Captures<'_>| {
        let matched = &caps[0];
        match matched.to_ascii_lowercase().as_str() {
            "(c)" => "©",
            "(r)" => "®",
            "(tm)" => "™",
            "+-" => "±",
            _ if matched.starts_with('?') => "???",
            _ if matched.starts_with('!') => "!!!",
            _ => ",",
        }
    })
}

/// Curly quotes, `--` / `---` dashes, and `...` ellipses.
fn smart_punctuation(text: &str, mut prev: Option<char>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '-' | '.' => {
                let mut run = 1;
                while chars.next_if_eq(&c).is_some() {
                    run += 1;
                }
                match (c, run) {
                    ('-', 2) => out.push('–'),
                    ('-', 3) => out.push('—'),
                    ('.', 3) => out.push('…'),
                    _ => out.extend(std::iter::repeat_n(c, run)),
                }
            }
            '"' => out.push(if opens_quote(prev) { '“' } else { '”' }),
            '\'' => out.push(if opens_quote(prev) { '‘' } else { '’' }),
            _ => out.push(c),
        }
        prev = Some(c);
    }
    out
}

fn opens_quote(prev: Option<char>) -> bool {
    prev.is_none_or(|p| p.is_whitespace() || matches!(p, '(' | '[' | '{' | '-' | '–' | '—'))
}
