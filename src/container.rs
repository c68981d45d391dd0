use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use kstring::KString;

use crate::attribute::{Attribute, AttributeValue};
use crate::definition::{Definition, DefinitionResolver};
use crate::error::ViewError;
use crate::template::{TemplateStore, Piece, parse_template};
use crate::tiles_context::TilesRequestContext;
use crate::util::html_escape;


/// Writes rendered output for attributes and whole definitions.
pub trait RenderingEngine {
    fn render_attribute(
        &self,
        attribute: &Attribute,
        out: &mut dyn Write,
        context: &TilesRequestContext,
    ) -> Result<()>;

    fn render_definition(
        &self,
        definition: &Definition,
        out: &mut dyn Write,
        context: &TilesRequestContext,
    ) -> Result<()>;

    /// Render `attribute` as if inserted inside `enclosing`
    /// (outermost first), so that its own inserts see the same
    /// attributes as in the full page.
    fn render_attribute_within(
        &self,
        attribute: &Attribute,
        enclosing: &[Arc<Definition>],
        out: &mut dyn Write,
        context: &TilesRequestContext,
    ) -> Result<()>;
}

/// What a view needs from the template engine.
pub trait Container: DefinitionResolver + RenderingEngine + Send + Sync {}

impl<T: DefinitionResolver + RenderingEngine + Send + Sync> Container for T {}


/// Inserts nested deeper than this fail (mutually recursive
/// definitions would otherwise never finish).
pub const MAX_INSERT_DEPTH: usize = 32;

// Where `{{insert:..}}` looks for attributes: the definition being
// rendered, then the enclosing ones.
struct Scope<'p> {
    definition: Option<&'p Definition>,
    parent: Option<&'p Scope<'p>>,
    depth: usize,
}

impl<'p> Scope<'p> {
    fn nested(&'p self, definition: Option<&'p Definition>) -> Result<Scope<'p>> {
        let depth = self.depth + 1;
        if depth > MAX_INSERT_DEPTH {
            return Err(ViewError::InsertTooDeep { limit: MAX_INSERT_DEPTH }.into())
        }
        Ok(Scope { definition, parent: Some(self), depth })
    }

    fn lookup(&self, name: &str) -> Option<&'p Attribute> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let Some(a) = s.definition.and_then(|d| d.get_attribute(name)) {
                return Some(a)
            }
            scope = s.parent;
        }
        None
    }
}

const TOP: Scope<'static> = Scope { definition: None, parent: None, depth: 0 };


/// The definitions and templates of a site, and the renderer for
/// them. Immutable once set up, shared between requests.
#[derive(Debug, Default)]
pub struct TilesContainer {
    definitions: HashMap<KString, Arc<Definition>>,
    templates: TemplateStore,
}

impl TilesContainer {
    pub fn new(templates: TemplateStore) -> Self {
        TilesContainer {
            definitions: HashMap::new(),
            templates,
        }
    }

    pub fn templates(&self) -> &TemplateStore { &self.templates }
    pub fn templates_mut(&mut self) -> &mut TemplateStore { &mut self.templates }

    /// Add a definition; an `extends` parent has to be present
    /// already and is merged in right away.
    pub fn add_definition(&mut self, mut definition: Definition) -> Result<()> {
        if let Some(parent_name) = definition.extends() {
            let parent = self.definitions.get(parent_name).ok_or_else(
                || ViewError::DefinitionNotFound { name: KString::from_ref(parent_name) })?
                .clone();
            definition.inherit_from(&parent);
        }
        let name = KString::from_ref(definition.name());
        if self.definitions.contains_key(&name) {
            bail!("duplicate definition {:?}", name.as_str())
        }
        self.definitions.insert(name, Arc::new(definition));
        Ok(())
    }

    /// Add definitions in any order, parents before children.
    pub fn add_definitions(&mut self, definitions: Vec<Definition>) -> Result<()> {
        let mut pending = definitions;
        while !pending.is_empty() {
            let (ready, waiting): (Vec<Definition>, Vec<Definition>) =
                pending.into_iter().partition(|d| match d.extends() {
                    None => true,
                    Some(parent) => self.definitions.contains_key(parent),
                });
            if ready.is_empty() {
                let names: Vec<String> = waiting.iter()
                    .map(|d| format!("{} extends {}", d.name(),
                                     d.extends().unwrap_or("?")))
                    .collect();
                bail!("definitions with missing or circular parents: {}",
                      names.join(", "))
            }
            for d in ready {
                self.add_definition(d)?;
            }
            pending = waiting;
        }
        Ok(())
    }

    pub fn definition_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }

    fn render_definition_in(
        &self,
        definition: &Definition,
        out: &mut dyn Write,
        context: &TilesRequestContext,
        parent: &Scope,
    ) -> Result<()> {
        let template = definition.template().ok_or_else(
            || anyhow!("definition {:?} has no template", definition.name()))?;
        let scope = parent.nested(Some(definition))?;
        self.render_template_in(template, out, context, &scope)
    }

    fn render_template_in(
        &self,
        path: &str,
        out: &mut dyn Write,
        context: &TilesRequestContext,
        scope: &Scope,
    ) -> Result<()> {
        let text = self.templates.get(path)?;
        for piece in parse_template(path, &text)? {
            match piece {
                Piece::Text(s) => out.write_all(s.as_bytes())?,
                Piece::Insert(name) => {
                    let attribute = context.attribute_context().get(name)
                        .or_else(|| scope.lookup(name))
                        .ok_or_else(|| ViewError::AttributeNotFound {
                            name: KString::from_ref(name),
                            template: KString::from_ref(path),
                        })?;
                    self.render_attribute_in(attribute, out, context, scope)?
                }
                Piece::Model(key) => {
                    let value = context.model().value(key).unwrap_or("");
                    out.write_all(html_escape(value).as_bytes())?
                }
            }
        }
        Ok(())
    }

    fn render_attribute_within_in(
        &self,
        attribute: &Attribute,
        enclosing: &[Arc<Definition>],
        out: &mut dyn Write,
        context: &TilesRequestContext,
        scope: &Scope,
    ) -> Result<()> {
        match enclosing.split_first() {
            None => self.render_attribute_in(attribute, out, context, scope),
            Some((outer, inner)) => {
                let nested = scope.nested(Some(outer.as_ref()))?;
                self.render_attribute_within_in(attribute, inner, out, context, &nested)
            }
        }
    }

    fn render_attribute_in(
        &self,
        attribute: &Attribute,
        out: &mut dyn Write,
        context: &TilesRequestContext,
        scope: &Scope,
    ) -> Result<()> {
        match attribute.value() {
            AttributeValue::String(s) =>
                match self.get_definition(s, context)? {
                    Some(definition) =>
                        self.render_definition_in(&definition, out, context, scope),
                    None => {
                        out.write_all(s.as_bytes())?;
                        Ok(())
                    }
                },
            AttributeValue::Definition(name) => {
                let definition = self.get_definition(name, context)?.ok_or_else(
                    || ViewError::DefinitionNotFound { name: name.clone() })?;
                self.render_definition_in(&definition, out, context, scope)
            }
            AttributeValue::Template(path) => {
                let inner = scope.nested(None)?;
                self.render_template_in(path, out, context, &inner)
            }
        }
    }
}

impl DefinitionResolver for TilesContainer {
    fn get_definition(
        &self,
        name: &str,
        context: &TilesRequestContext,
    ) -> Result<Option<Arc<Definition>>> {
        if let Some(d) = context.registered_definition(name) {
            return Ok(Some(d.clone()))
        }
        Ok(self.definitions.get(name).cloned())
    }
}

impl RenderingEngine for TilesContainer {
    fn render_attribute(
        &self,
        attribute: &Attribute,
        out: &mut dyn Write,
        context: &TilesRequestContext,
    ) -> Result<()> {
        self.render_attribute_in(attribute, out, context, &TOP)
    }

    fn render_definition(
        &self,
        definition: &Definition,
        out: &mut dyn Write,
        context: &TilesRequestContext,
    ) -> Result<()> {
        self.render_definition_in(definition, out, context, &TOP)
    }

    fn render_attribute_within(
        &self,
        attribute: &Attribute,
        enclosing: &[Arc<Definition>],
        out: &mut dyn Write,
        context: &TilesRequestContext,
    ) -> Result<()> {
        self.render_attribute_within_in(attribute, enclosing, out, context, &TOP)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Model;
    use crate::testing::TestRequest;

    fn site() -> TilesContainer {
        let mut c = TilesContainer::default();
        c.templates_mut().add(
            "/layouts/main.html",
            "<title>{{insert:title}}</title><main>{{insert:body}}</main>");
        c.templates_mut().add("/home.html", "<p>Hello {{model:user}}</p>{{insert:sidebar}}");
        c.templates_mut().add("/sidebar.html", "<aside>{{insert:title}}</aside>");
        c.add_definitions(vec![
            Definition::new("home")
                .with_extends("mainTemplate")
                .with_attribute("title", Attribute::string("Home"))
                .with_attribute("body", Attribute::template("/home.html")),
            Definition::new("mainTemplate")
                .with_template("/layouts/main.html")
                .with_attribute("title", Attribute::string("Site"))
                .with_attribute("sidebar", Attribute::template("/sidebar.html")),
        ]).unwrap();
        c
    }

    fn render(c: &TilesContainer, name: &str, model: &Model) -> Result<String> {
        let request = TestRequest::new("/");
        let ctx = TilesRequestContext::new(&request, model);
        let d = c.get_definition(name, &ctx)?.unwrap();
        let mut out = Vec::new();
        c.render_definition(&d, &mut out, &ctx)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn t_add_definitions_any_order() {
        let c = site();
        assert_eq!(c.definition_names(), ["home", "mainTemplate"]);
    }

    #[test]
    fn t_add_definitions_missing_parent() {
        let mut c = TilesContainer::default();
        let e = c.add_definitions(vec![
            Definition::new("a").with_extends("b"),
            Definition::new("b").with_extends("a"),
        ]).unwrap_err();
        assert!(e.to_string().starts_with("definitions with missing or circular parents"));
    }

    #[test]
    fn t_duplicate_definition() {
        let mut c = site();
        assert!(c.add_definition(Definition::new("home")).is_err());
    }

    #[test]
    fn t_render_definition() -> Result<()> {
        let mut model = Model::new();
        model.put_value("user", "<anna>");
        assert_eq!(render(&site(), "home", &model)?,
                   "<title>Home</title><main><p>Hello &lt;anna&gt;</p>\
                    <aside>Home</aside></main>");
        Ok(())
    }

    #[test]
    fn t_dynamic_attribute_overrides() -> Result<()> {
        let mut model = Model::new();
        model.put_attribute("title", Attribute::string("Dynamic"));
        assert_eq!(render(&site(), "home", &model)?,
                   "<title>Dynamic</title><main><p>Hello </p>\
                    <aside>Dynamic</aside></main>");
        Ok(())
    }

    #[test]
    fn t_missing_insert() {
        let mut c = site();
        c.templates_mut().add("/broken.html", "{{insert:nothing}}");
        c.add_definition(Definition::new("broken").with_template("/broken.html")).unwrap();
        let e = render(&c, "broken", &Model::new()).unwrap_err();
        assert_eq!(e.downcast_ref::<ViewError>(),
                   Some(&ViewError::AttributeNotFound {
                       name: KString::from_static("nothing"),
                       template: KString::from_static("/broken.html"),
                   }));
    }

    #[test]
    fn t_recursive_insert_fails() {
        let mut c = TilesContainer::default();
        c.templates_mut().add("/loop.html", "x{{insert:me}}");
        c.add_definition(Definition::new("loop")
                         .with_template("/loop.html")
                         .with_attribute("me", Attribute::definition("loop"))).unwrap();
        let e = render(&c, "loop", &Model::new()).unwrap_err();
        assert_eq!(e.downcast_ref::<ViewError>(),
                   Some(&ViewError::InsertTooDeep { limit: MAX_INSERT_DEPTH }));
    }

    #[test]
    fn t_render_attribute() -> Result<()> {
        let c = site();
        let request = TestRequest::new("/");
        let model = Model::new();
        let ctx = TilesRequestContext::new(&request, &model);
        let mut out = Vec::new();
        c.render_attribute(&Attribute::string("plain <b>text</b>"), &mut out, &ctx)?;
        assert_eq!(out, b"plain <b>text</b>");
        Ok(())
    }

    #[test]
    fn t_render_attribute_within() -> Result<()> {
        let mut c = site();
        c.templates_mut().add("/box.html", "<h2>{{insert:title}}</h2>");
        c.add_definition(Definition::new("box")
                         .with_template("/box.html")
                         .with_attribute("title", Attribute::string("Box"))).unwrap();
        let request = TestRequest::new("/");
        let model = Model::new();
        let ctx = TilesRequestContext::new(&request, &model);
        let home = c.get_definition("home", &ctx)?.unwrap();
        let boxdef = c.get_definition("box", &ctx)?.unwrap();

        let sidebar = Attribute::template("/sidebar.html");
        let mut out = Vec::new();
        c.render_attribute_within(&sidebar, &[home.clone()], &mut out, &ctx)?;
        assert_eq!(out, b"<aside>Home</aside>");

        // the innermost definition's attributes come first
        let mut out = Vec::new();
        c.render_attribute_within(&Attribute::template("/box.html"),
                                  &[home.clone(), boxdef], &mut out, &ctx)?;
        assert_eq!(out, b"<h2>Box</h2>");

        // without the enclosing definitions the insert can't be resolved
        let e = c.render_attribute_within(&sidebar, &[], &mut Vec::<u8>::new(), &ctx)
            .unwrap_err();
        assert!(matches!(e.downcast_ref::<ViewError>(),
                         Some(ViewError::AttributeNotFound { .. })));
        Ok(())
    }
}
