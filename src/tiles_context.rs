use std::collections::HashMap;
use std::sync::Arc;

use kstring::KString;

use crate::attribute::Attribute;
use crate::attribute_context::AttributeContext;
use crate::definition::Definition;
use crate::request::{Model, ViewRequest};


/// Everything tiles-related that lives only for one request: the
/// stack of attribute contexts and definitions registered for this
/// request alone. Nothing in here is shared between requests.
pub struct TilesRequestContext<'r> {
    request: &'r dyn ViewRequest,
    model: &'r Model,
    // Holds the model's attributes, and is never popped.
    bottom: AttributeContext,
    pushed: Vec<AttributeContext>,
    definitions: HashMap<KString, Arc<Definition>>,
}

impl<'r> TilesRequestContext<'r> {
    pub fn new(request: &'r dyn ViewRequest, model: &'r Model) -> Self {
        TilesRequestContext {
            request,
            model,
            bottom: model.attributes().clone(),
            pushed: Vec::new(),
            definitions: HashMap::new(),
        }
    }

    pub fn request(&self) -> &'r dyn ViewRequest { self.request }
    pub fn model(&self) -> &'r Model { self.model }

    /// The attribute context currently in effect.
    pub fn attribute_context(&self) -> &AttributeContext {
        self.pushed.last().unwrap_or(&self.bottom)
    }

    pub fn put_attribute(&mut self, name: &str, attribute: Attribute) {
        match self.pushed.last_mut() {
            Some(context) => context.put(name, attribute),
            None => self.bottom.put(name, attribute),
        }
    }

    /// Push a new attribute context, starting out with the attributes
    /// of the current one.
    pub fn start_context(&mut self) {
        let inherited = self.attribute_context().clone();
        self.pushed.push(inherited);
    }

    /// Returns false, and leaves the bottom context in place, if
    /// there was no matching `start_context`.
    pub fn end_context(&mut self) -> bool {
        self.pushed.pop().is_some()
    }

    pub fn context_depth(&self) -> usize {
        self.pushed.len() + 1
    }

    /// Make `definition` visible under its name for the rest of this
    /// request, shadowing a stored one of the same name.
    pub fn register_definition(&mut self, definition: Definition) {
        let name = KString::from_ref(definition.name());
        self.definitions.insert(name, Arc::new(definition));
    }

    pub fn registered_definition(&self, name: &str) -> Option<&Arc<Definition>> {
        self.definitions.get(name)
    }
}
