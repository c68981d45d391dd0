use kstring::KString;

/// Default name of the query parameter listing the fragments to render.
pub const FRAGMENTS_PARAM: &str = "fragments";

/// Split the fragments parameter value into the names to render:
/// comma separated, each trimmed, in the given order. Duplicates are
/// kept (and rendered twice). Empty elements are kept too, they will
/// simply not be found. A missing or blank value gives no names.
pub fn parse_fragments(raw: Option<&str>) -> Vec<KString> {
    match raw {
        None => vec![],
        Some(s) if s.trim().is_empty() => vec![],
        Some(s) => s.split(',').map(|name| KString::from_ref(name.trim())).collect()
    }
}
