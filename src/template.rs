//! Template texts and their (small) syntax: `{{insert:name}}` places
//! the attribute `name`, `{{model:key}}` the HTML-escaped model value
//! `key`. Everything else is copied through.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Result, Context, anyhow};
use kstring::KString;

use crate::error::ViewError;
use crate::util::canonicalize_path;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'t> {
    Text(&'t str),
    Insert(&'t str),
    Model(&'t str),
}

pub fn parse_template<'t>(path: &str, text: &'t str) -> Result<Vec<Piece<'t>>> {
    let syntax_error = |message: String| -> anyhow::Error {
        ViewError::TemplateSyntax {
            path: KString::from_ref(path),
            message
        }.into()
    };
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            pieces.push(Piece::Text(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(
            || syntax_error(format!("unterminated '{{{{' at byte {}",
                                    text.len() - rest.len() + start)))?;
        let directive = after[..end].trim();
        let piece =
            if let Some(name) = directive.strip_prefix("insert:") {
                Piece::Insert(name.trim())
            } else if let Some(key) = directive.strip_prefix("model:") {
                Piece::Model(key.trim())
            } else {
                return Err(syntax_error(format!("unknown directive {directive:?}")))
            };
        pieces.push(piece);
        rest = &after[end + 2..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }
    Ok(pieces)
}


/// Template texts by path: registered ones first, then files below
/// `template_dir` if that is set.
#[derive(Debug, Default, Clone)]
pub struct TemplateStore {
    inline: HashMap<KString, String>,
    template_dir: Option<PathBuf>,
}

impl TemplateStore {
    pub fn new(template_dir: Option<PathBuf>) -> Self {
        TemplateStore {
            inline: HashMap::new(),
            template_dir,
        }
    }

    pub fn add(&mut self, path: &str, text: impl Into<String>) {
        self.inline.insert(KString::from_ref(path), text.into());
    }

    pub fn contains_inline(&self, path: &str) -> bool {
        self.inline.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Result<Cow<'_, str>> {
        if let Some(text) = self.inline.get(path) {
            return Ok(Cow::Borrowed(text.as_str()))
        }
        let not_found = || -> anyhow::Error {
            ViewError::TemplateNotFound { path: KString::from_ref(path) }.into()
        };
        let dir = self.template_dir.as_ref().ok_or_else(not_found)?;
        let segments = canonicalize_path(path).ok_or_else(not_found)?;
        if segments.is_empty() {
            return Err(not_found())
        }
        let full_path = dir.join(segments.join("/"));
        match std::fs::read_to_string(&full_path) {
            Ok(s) => Ok(Cow::Owned(s)),
            Err(e) =>
                match e.kind() {
                    ErrorKind::NotFound => Err(not_found()),
                    _ => Err(e).with_context(
                        || anyhow!("can't read template file {:?}", full_path))
                }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_parse_template() -> Result<()> {
        assert!(parse_template("/t", "")?.is_empty());
        assert_eq!(parse_template("/t", "<p>hi</p>")?, [Piece::Text("<p>hi</p>")]);
        assert_eq!(
            parse_template("/t", "<h1>{{model:title}}</h1>{{ insert: body }}\n")?,
            [Piece::Text("<h1>"),
             Piece::Model("title"),
             Piece::Text("</h1>"),
             Piece::Insert("body"),
             Piece::Text("\n")]);
        assert_eq!(parse_template("/t", "{{insert:a}}{{insert:b}}")?,
                   [Piece::Insert("a"), Piece::Insert("b")]);
        Ok(())
    }

    #[test]
    fn t_parse_template_errors() {
        let e = parse_template("/t", "<p>{{insert:body</p>").unwrap_err();
        assert!(matches!(e.downcast_ref::<ViewError>(),
                         Some(ViewError::TemplateSyntax { .. })));
        let e = parse_template("/t", "{{include:x}}").unwrap_err();
        assert_eq!(e.to_string(), "template \"/t\": unknown directive \"include:x\"");
    }

    #[test]
    fn t_store() -> Result<()> {
        let mut store = TemplateStore::new(None);
        store.add("/a.html", "A");
        assert_eq!(store.get("/a.html")?, "A");
        let e = store.get("/b.html").unwrap_err();
        assert_eq!(e.downcast_ref::<ViewError>(),
                   Some(&ViewError::TemplateNotFound { path: KString::from_static("/b.html") }));
        Ok(())
    }

    #[test]
    fn t_store_template_dir() -> Result<()> {
        let dir = std::env::temp_dir().join(
            format!("ajaxtiles-t_store_template_dir-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("parts"))?;
        std::fs::write(dir.join("parts/menu.html"), "<ul></ul>")?;
        let store = TemplateStore::new(Some(dir.clone()));
        assert_eq!(store.get("/parts/menu.html")?, "<ul></ul>");
        assert_eq!(store.get("parts/./menu.html")?, "<ul></ul>");
        assert!(store.get("/parts/none.html").is_err());
        assert!(store.get("/../parts/menu.html").is_err());
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
