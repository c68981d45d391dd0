//! Site configuration: definitions, templates and the views served,
//! read from a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, Context, anyhow};
use kstring::KString;
use serde::Deserialize;

use crate::ajax_view::AjaxTilesView;
use crate::attribute::Attribute;
use crate::container::TilesContainer;
use crate::definition::Definition;
use crate::dynamic_tiles::{DynamicTilesProcessor, DEFAULT_LAYOUT_DEFINITION,
                           DEFAULT_BODY_ATTRIBUTE, DEFAULT_DEFINITION_DELIMITER};
use crate::fragments::FRAGMENTS_PARAM;
use crate::template::TemplateStore;


#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeConfig {
    pub name: String,
    #[serde(rename = "type", default = "default_attribute_type")]
    pub typ: String,
    pub value: String,
}

fn default_attribute_type() -> String { "string".into() }

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionConfig {
    pub name: String,
    pub template: Option<String>,
    pub extends: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    /// Request path the view is served at.
    pub path: String,
    pub view_name: String,
    /// Body template if the view gets a derived layout definition.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default)]
    pub definitions: Vec<DefinitionConfig>,
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    /// Relative paths are taken relative to the config file.
    pub template_dir: Option<PathBuf>,
    #[serde(default)]
    pub views: Vec<ViewConfig>,
    pub fragments_param: Option<String>,
    pub layout_definition: Option<String>,
    pub body_attribute: Option<String>,
    pub definition_delimiter: Option<String>,
}

impl SiteConfig {
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(
            || anyhow!("can't read config file {:?}", path))?;
        let mut config = Self::from_str(&s).with_context(
            || anyhow!("parsing config file {:?}", path))?;
        if let Some(dir) = &config.template_dir {
            if dir.is_relative() {
                if let Some(base) = path.parent() {
                    config.template_dir = Some(base.join(dir));
                }
            }
        }
        Ok(config)
    }

    pub fn container(&self) -> Result<TilesContainer> {
        let mut templates = TemplateStore::new(self.template_dir.clone());
        for (path, text) in &self.templates {
            templates.add(path, text.as_str());
        }
        let mut container = TilesContainer::new(templates);
        let definitions = self.definitions.iter()
            .map(DefinitionConfig::to_definition)
            .collect::<Result<Vec<_>>>()?;
        container.add_definitions(definitions)?;
        Ok(container)
    }

    pub fn processor(&self) -> DynamicTilesProcessor {
        let kstr = |v: &Option<String>, default: &'static str| {
            v.as_deref().map_or(KString::from_static(default), KString::from_ref)
        };
        DynamicTilesProcessor {
            layout_definition: kstr(&self.layout_definition, DEFAULT_LAYOUT_DEFINITION),
            body_attribute: kstr(&self.body_attribute, DEFAULT_BODY_ATTRIBUTE),
            delimiter: kstr(&self.definition_delimiter, DEFAULT_DEFINITION_DELIMITER),
        }
    }

    pub fn fragments_param(&self) -> &str {
        self.fragments_param.as_deref().unwrap_or(FRAGMENTS_PARAM)
    }

    /// The configured views by request path, all sharing `container`.
    pub fn views(
        &self,
        container: Arc<TilesContainer>,
    ) -> BTreeMap<String, AjaxTilesView> {
        self.views.iter().map(|v| {
            let view = AjaxTilesView::new(&v.view_name, &v.url)
                .with_container(container.clone())
                .with_processor(self.processor())
                .with_fragments_param(self.fragments_param());
            (v.path.clone(), view)
        }).collect()
    }
}

impl DefinitionConfig {
    pub fn to_definition(&self) -> Result<Definition> {
        let mut d = Definition::new(&self.name);
        if let Some(t) = &self.template {
            d = d.with_template(t);
        }
        if let Some(e) = &self.extends {
            d = d.with_extends(e);
        }
        for a in &self.attributes {
            let attribute = Attribute::from_type_and_value(&a.typ, &a.value).ok_or_else(
                || anyhow!("definition {:?}, attribute {:?}: unknown type {:?}",
                           self.name, a.name, a.typ))?;
            d.put_attribute(&a.name, attribute);
        }
        Ok(d)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::ajax_view::RenderOutcome;
    use crate::request::{BufferedResponse, Model};
    use crate::testing::TestRequest;

    const SITE: &str = r#"{
        "definitions": [
            { "name": "home", "extends": "mainTemplate",
              "attributes": [
                  { "name": "title", "value": "Home" },
                  { "name": "body", "type": "template", "value": "/home.html" }
              ] },
            { "name": "mainTemplate", "template": "/layouts/main.html",
              "attributes": [ { "name": "title", "value": "Site" } ] }
        ],
        "templates": {
            "/layouts/main.html": "<h1>{{insert:title}}</h1>{{insert:body}}",
            "/home.html": "<p>welcome</p>",
            "/about.html": "<p>about</p>"
        },
        "views": [
            { "path": "/", "view_name": "home" },
            { "path": "/about", "view_name": "about", "url": "/about.html" }
        ],
        "body_attribute": "body",
        "fragments_param": "parts"
    }"#;

    #[test]
    fn t_site_config() -> Result<()> {
        let config = SiteConfig::from_str(SITE)?;
        let container = Arc::new(config.container()?);
        assert_eq!(container.definition_names(), ["home", "mainTemplate"]);
        let views = config.views(container);
        assert_eq!(views.keys().collect::<Vec<_>>(), ["/", "/about"]);

        let mut response = BufferedResponse::new();
        views["/about"].render(&Model::new(), &TestRequest::new("/about"), &mut response)?;
        assert_eq!(response.body_string()?, "<h1>Site</h1><p>about</p>");

        let request = TestRequest::new("/")
            .with_param("ajaxSource", "x")
            .with_param("parts", "body");
        let mut response = BufferedResponse::new();
        let outcome = views["/"].render(&Model::new(), &request, &mut response)?;
        assert_eq!(outcome, RenderOutcome::Fragments(vec![KString::from_static("body")]));
        assert_eq!(response.body_string()?, "<p>welcome</p>");
        Ok(())
    }

    #[test]
    fn t_bad_attribute_type() {
        let config = SiteConfig::from_str(r#"{
            "definitions": [ { "name": "x", "template": "/x.html",
                "attributes": [ { "name": "a", "type": "jsp", "value": "/a.jsp" } ] } ]
        }"#).unwrap();
        let e = config.container().unwrap_err();
        assert!(e.to_string().contains("unknown type \"jsp\""));
    }

    #[test]
    fn t_unknown_field() {
        assert!(SiteConfig::from_str(r#"{ "definitons": [] }"#).is_err());
    }
}
