//! Views that have no tiles definition of their own get one derived
//! from their name: the closest `<dir>.mainTemplate` layout (or
//! `mainTemplate` itself), with the view's url as the body.

use anyhow::Result;
use kstring::KString;
use log::debug;

use crate::attribute::Attribute;
use crate::definition::DefinitionResolver;
use crate::tiles_context::TilesRequestContext;
use crate::util::parent_dirs;


pub const DEFAULT_LAYOUT_DEFINITION: &str = "mainTemplate";
pub const DEFAULT_BODY_ATTRIBUTE: &str = "content";
pub const DEFAULT_DEFINITION_DELIMITER: &str = ".";

#[derive(Debug, Clone)]
pub struct DynamicTilesProcessor {
    pub layout_definition: KString,
    pub body_attribute: KString,
    pub delimiter: KString,
}

impl Default for DynamicTilesProcessor {
    fn default() -> Self {
        DynamicTilesProcessor {
            layout_definition: KString::from_static(DEFAULT_LAYOUT_DEFINITION),
            body_attribute: KString::from_static(DEFAULT_BODY_ATTRIBUTE),
            delimiter: KString::from_static(DEFAULT_DEFINITION_DELIMITER),
        }
    }
}

impl DynamicTilesProcessor {
    /// The definition to render for `view_name`: the view's own if
    /// there is one, otherwise the closest layout definition. Falls
    /// back to the plain layout name even if that doesn't exist (the
    /// lookup afterwards reports it).
    pub fn definition_name<R: DefinitionResolver + ?Sized>(
        &self,
        view_name: &str,
        resolver: &R,
        context: &TilesRequestContext,
    ) -> Result<KString> {
        if resolver.is_valid_definition(view_name, context)? {
            return Ok(KString::from_ref(view_name))
        }
        for dir in parent_dirs(view_name) {
            let candidate = format!("{dir}{}{}", self.delimiter, self.layout_definition);
            if resolver.is_valid_definition(&candidate, context)? {
                return Ok(KString::from_string(candidate))
            }
        }
        Ok(self.layout_definition.clone())
    }

    /// Start rendering `view_name`. When a layout is used in place of
    /// the view's own definition, a new attribute context is started
    /// with `url` as the body attribute; `end` closes it again.
    pub fn begin<R: DefinitionResolver + ?Sized>(
        &self,
        view_name: &str,
        url: &str,
        resolver: &R,
        context: &mut TilesRequestContext,
    ) -> Result<KString> {
        let definition_name = self.definition_name(view_name, resolver, context)?;
        if definition_name.as_str() != view_name {
            context.start_context();
            context.put_attribute(&self.body_attribute, Attribute::template(url));
            debug!("view {view_name:?}: using layout {:?} with {:?} = {url:?}",
                   definition_name.as_str(), self.body_attribute.as_str());
        }
        Ok(definition_name)
    }

    pub fn end(
        &self,
        definition_name: &str,
        view_name: &str,
        context: &mut TilesRequestContext,
    ) {
        if definition_name != view_name {
            context.end_context();
        }
    }
}
