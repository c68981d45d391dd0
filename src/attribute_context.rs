use kstring::KString;

use crate::attribute::Attribute;


/// Anything that can hand out the attributes added to the rendering
/// context at request time (outside the static definition tree).
pub trait AttributeSource {
    fn attributes(&self) -> Vec<(KString, Attribute)>;
}

/// Request-scoped attributes, in insertion order; `put` replaces an
/// existing entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeContext {
    attributes: Vec<(KString, Attribute)>,
}

impl AttributeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, name: &str, attribute: Attribute) {
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| n.as_str() == name) {
            slot.1 = attribute;
        } else {
            self.attributes.push((KString::from_ref(name), attribute));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|(n, _)| n.as_str() == name).map(|(_, a)| a)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize { self.attributes.len() }
    pub fn is_empty(&self) -> bool { self.attributes.is_empty() }
}

impl AttributeSource for AttributeContext {
    fn attributes(&self) -> Vec<(KString, Attribute)> {
        self.attributes.clone()
    }
}
