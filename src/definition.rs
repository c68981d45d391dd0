use std::sync::Arc;

use anyhow::Result;
use kstring::KString;

use crate::attribute::Attribute;
use crate::tiles_context::TilesRequestContext;


/// A named, composed page: a template plus the attributes filling its
/// slots. Attribute order is declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    name: KString,
    template: Option<KString>,
    extends: Option<KString>,
    attributes: Vec<(KString, Attribute)>,
}

impl Definition {
    pub fn new(name: &str) -> Self {
        Definition {
            name: KString::from_ref(name),
            template: None,
            extends: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_template(mut self, path: &str) -> Self {
        self.template = Some(KString::from_ref(path));
        self
    }

    pub fn with_extends(mut self, parent: &str) -> Self {
        self.extends = Some(KString::from_ref(parent));
        self
    }

    /// Chaining variant of `put_attribute`.
    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.put_attribute(name, attribute);
        self
    }

    /// Replaces the attribute in place if the name is already
    /// present, appends it otherwise.
    pub fn put_attribute(&mut self, name: &str, attribute: Attribute) {
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| n.as_str() == name) {
            slot.1 = attribute;
        } else {
            self.attributes.push((KString::from_ref(name), attribute));
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn template(&self) -> Option<&str> { self.template.as_deref() }
    pub fn extends(&self) -> Option<&str> { self.extends.as_deref() }

    pub fn attributes(&self) -> impl Iterator<Item = (&KString, &Attribute)> {
        self.attributes.iter().map(|(n, a)| (n, a))
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|(n, _)| n.as_str() == name).map(|(_, a)| a)
    }

    /// Fill in what `self` leaves open from `parent`: the template if
    /// none is set, and all of the parent's attributes that `self`
    /// doesn't override. Parent attributes come first, in the
    /// parent's order. The `extends` link is kept for reference.
    pub fn inherit_from(&mut self, parent: &Definition) {
        if self.template.is_none() {
            self.template = parent.template.clone();
        }
        let mut attributes: Vec<(KString, Attribute)> = parent.attributes.iter()
            .filter(|(n, _)| self.get_attribute(n).is_none())
            .cloned()
            .collect();
        attributes.append(&mut self.attributes);
        self.attributes = attributes;
    }
}


/// Lookup of definitions by name, for the duration of one request.
pub trait DefinitionResolver {
    /// `Ok(None)` means there is no definition of that name; `Err` is
    /// reserved for lookups that failed.
    fn get_definition(
        &self,
        name: &str,
        context: &TilesRequestContext,
    ) -> Result<Option<Arc<Definition>>>;

    fn is_valid_definition(&self, name: &str, context: &TilesRequestContext) -> Result<bool> {
        Ok(self.get_definition(name, context)?.is_some())
    }
}
