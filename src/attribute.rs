use std::fmt::Display;

use kstring::KString;


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Untyped value: if it happens to be the name of a definition,
    /// it stands for that definition, otherwise it's literal text.
    String(KString),
    /// Name of a definition that has to exist.
    Definition(KString),
    /// Path of a template in the `TemplateStore`.
    Template(KString),
}

impl AttributeValue {
    pub fn as_str(&self) -> &str {
        match self {
            AttributeValue::String(s) => s.as_str(),
            AttributeValue::Definition(s) => s.as_str(),
            AttributeValue::Template(s) => s.as_str(),
        }
    }

    pub fn type_str(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Definition(_) => "definition",
            AttributeValue::Template(_) => "template",
        }
    }
}

/// One slot of a `Definition`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    value: AttributeValue,
}

impl Attribute {
    pub fn new(value: AttributeValue) -> Self {
        Attribute { value }
    }
    pub fn string(s: &str) -> Self {
        Self::new(AttributeValue::String(KString::from_ref(s)))
    }
    pub fn definition(name: &str) -> Self {
        Self::new(AttributeValue::Definition(KString::from_ref(name)))
    }
    pub fn template(path: &str) -> Self {
        Self::new(AttributeValue::Template(KString::from_ref(path)))
    }

    /// Build from the type names used in configuration files.
    pub fn from_type_and_value(typ: &str, value: &str) -> Option<Self> {
        match typ {
            "string" => Some(Self::string(value)),
            "definition" => Some(Self::definition(value)),
            "template" => Some(Self::template(value)),
            _ => None
        }
    }

    pub fn value(&self) -> &AttributeValue { &self.value }
    pub fn value_str(&self) -> &str { self.value.as_str() }

    /// The definition name this attribute might refer to, and whether
    /// that definition must exist.
    pub fn definition_reference(&self) -> Option<(&str, bool)> {
        match &self.value {
            AttributeValue::String(s) => Some((s.as_str(), false)),
            AttributeValue::Definition(s) => Some((s.as_str(), true)),
            AttributeValue::Template(_) => None,
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.value.type_str(), self.value.as_str())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_from_type_and_value() {
        assert_eq!(Attribute::from_type_and_value("template", "/a.html"),
                   Some(Attribute::template("/a.html")));
        assert_eq!(Attribute::from_type_and_value("definition", "home"),
                   Some(Attribute::definition("home")));
        assert_eq!(Attribute::from_type_and_value("jsp", "x"), None);
    }

    #[test]
    fn t_definition_reference() {
        assert_eq!(Attribute::string("body").definition_reference(),
                   Some(("body", false)));
        assert_eq!(Attribute::definition("body").definition_reference(),
                   Some(("body", true)));
        assert_eq!(Attribute::template("/body.html").definition_reference(),
                   None);
        assert_eq!(Attribute::template("/body.html").to_string(),
                   "template:/body.html");
    }
}
