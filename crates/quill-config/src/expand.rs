//! Environment variable expansion for configuration strings.
//!
//! - `${VAR}` expands to the value of VAR and errors if it is unset
//! - `${VAR:-default}` expands to VAR if set, otherwise to `default`
//!
//! Any `$` not followed by `{` is kept literally, so bare `$VAR` is left alone
//! even when a `${...}` reference in the same string is expanded.

use crate::ConfigError;

struct LookupError {
    var_name: String,
}

/// Expand `${VAR}` references in `value`, naming `field` in errors.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let escaped = escape_bare_dollars(value);
    shellexpand::env_with_context(&escaped, |var| -> Result<Option<String>, LookupError> {
        std::env::var(var).map(Some).map_err(|_| LookupError {
            var_name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.var_name),
    })
}

/// Double every `$` outside `${...}`; shellexpand reads `$$` as a literal `$`.
fn escape_bare_dollars(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c != '$' {
            continue;
        }
        if chars.peek() == Some(&'{') {
            // Reference bodies, defaults included, are copied as is.
            for inner in chars.by_ref() {
                out.push(inner);
                if inner == '}' {
                    break;
                }
            }
        } else {
            out.push('$');
        }
    }
    out
}
