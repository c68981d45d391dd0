use std::env::VarError;

use anyhow::{Result, bail};
use pct_str::{InvalidPctString, PctStr};


/// Get an env var as a String; decoding failures are reported as
/// errors. If the variable isn't set, `fallbackvalue` is returned if
/// given, otherwise an error is reported.
pub fn getenv_or(name: &str, fallbackvalue: Option<&str>) -> Result<String> {
    match std::env::var(name) {
        Ok(s) => Ok(s),
        Err(e) => match e {
            VarError::NotPresent =>
                match fallbackvalue {
                    Some(v) => Ok(v.to_string()),
                    None => bail!("{name:?} env var is missing and \
                                   no default provided"),
                },
            VarError::NotUnicode(_) => bail!("{name:?} env var is not unicode"),
        }
    }
}

/// Owns the offending text, so that it can travel in `anyhow::Error`
/// past the request's lifetime.
#[derive(Debug, thiserror::Error)]
#[error("url decoding error: {0}")]
pub struct UrlDecodingError(Box<String>);

impl From<InvalidPctString<&str>> for UrlDecodingError {
    fn from(e: InvalidPctString<&str>) -> Self {
        Self(Box::new(format!("{}", e)))
    }
}

/// Decode one name or value of a query string (`+` is a space).
pub fn query_decode(s: &str) -> Result<String, UrlDecodingError> {
    let spaced = s.replace('+', " ");
    let p = PctStr::new(spaced.as_str())?;
    Ok(p.decode())
}


/// Resolve `.`, `..` and empty segments. Returns None if `..` would
/// leave the base.
pub fn canonicalize_path<'s>(path: &'s str) -> Option<Vec<&'s str>> {
    let mut out = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." => (),
            ".." =>
                if out.pop().is_none() {
                    return None
                },
            // multiple slashes count as one
            "" => (),
            _ => out.push(segment)
        }
    }
    Some(out)
}

/// Parent directories of a slash separated name, deepest first:
/// `"a/b/c"` gives `["a/b", "a"]`.
pub fn parent_dirs(name: &str) -> Vec<&str> {
    let mut dirs = Vec::new();
    let mut rest = name;
    while let Some(pos) = rest.rfind('/') {
        rest = &rest[..pos];
        if !rest.is_empty() {
            dirs.push(rest);
        }
    }
    dirs
}

/// Escape text for inclusion in HTML element content or quoted
/// attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c)
        }
    }
    out
}
