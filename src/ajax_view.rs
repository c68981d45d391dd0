//! A tiles view that can also answer Ajax requests, by rendering
//! only the attributes ("fragments") the client asked for.

use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;
use kstring::KString;

use crate::classifier::{RequestClassifier, AjaxHandler};
use crate::container::Container;
use crate::definition::Definition;
use crate::dynamic_tiles::DynamicTilesProcessor;
use crate::error::ViewError;
use crate::flatten::flatten;
use crate::fragments::{parse_fragments, FRAGMENTS_PARAM};
use crate::request::{Model, ViewRequest, ViewResponse};
use crate::tiles_context::TilesRequestContext;
use crate::warn;


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Normal request, the whole page was rendered.
    FullPage,
    /// Ajax request without any fragments named; the whole page was
    /// rendered instead.
    FallbackFullPage,
    /// These fragments were rendered, in this order.
    Fragments(Vec<KString>),
}

pub struct AjaxTilesView {
    view_name: KString,
    url: KString,
    container: Option<Arc<dyn Container>>,
    classifier: Box<dyn RequestClassifier + Send + Sync>,
    processor: DynamicTilesProcessor,
    fragments_param: KString,
}

impl Debug for AjaxTilesView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("AjaxTilesView({:?}, {:?}, fragments param {:?})",
                                 self.view_name.as_str(), self.url.as_str(),
                                 self.fragments_param.as_str()))
    }
}

impl AjaxTilesView {
    /// `view_name` is the definition to render if there is one of
    /// that name; `url` the template used as the page body otherwise.
    pub fn new(view_name: &str, url: &str) -> Self {
        AjaxTilesView {
            view_name: KString::from_ref(view_name),
            url: KString::from_ref(url),
            container: None,
            classifier: Box::new(AjaxHandler),
            processor: DynamicTilesProcessor::default(),
            fragments_param: KString::from_static(FRAGMENTS_PARAM),
        }
    }

    pub fn with_container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_classifier(
        mut self,
        classifier: impl RequestClassifier + Send + Sync + 'static
    ) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_processor(mut self, processor: DynamicTilesProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn with_fragments_param(mut self, name: &str) -> Self {
        self.fragments_param = KString::from_ref(name);
        self
    }

    pub fn view_name(&self) -> &str { &self.view_name }
    pub fn url(&self) -> &str { &self.url }

    /// Render the page, or on an Ajax request just the requested
    /// fragments. Errors after the response was committed leave a
    /// partially written response behind.
    pub fn render(
        &self,
        model: &Model,
        request: &dyn ViewRequest,
        response: &mut dyn ViewResponse,
    ) -> Result<RenderOutcome> {
        let mut context = TilesRequestContext::new(request, model);
        self.render_with_context(&mut context, response)
    }

    /// `render` with a request context set up by the caller, e.g. one
    /// with definitions registered for this request. On success, the
    /// context is left at the depth it was passed in with.
    pub fn render_with_context(
        &self,
        context: &mut TilesRequestContext,
        response: &mut dyn ViewResponse,
    ) -> Result<RenderOutcome> {
        let container = self.container.as_deref().ok_or_else(
            || ViewError::ContainerNotInitialized { view: self.view_name.clone() })?;
        if self.classifier.is_ajax_request(context.request()) {
            self.render_fragments(container, context, response)
        } else {
            let definition_name = self.processor.begin(
                &self.view_name, &self.url, container, context)?;
            self.render_page(container, &definition_name, context, response)?;
            self.processor.end(&definition_name, &self.view_name, context);
            Ok(RenderOutcome::FullPage)
        }
    }

    fn resolve(
        &self,
        container: &dyn Container,
        definition_name: &str,
        context: &TilesRequestContext,
    ) -> Result<Arc<Definition>> {
        Ok(container.get_definition(definition_name, context)?.ok_or_else(
            || ViewError::DefinitionNotFound { name: KString::from_ref(definition_name) })?)
    }

    fn render_page(
        &self,
        container: &dyn Container,
        definition_name: &str,
        context: &TilesRequestContext,
        response: &mut dyn ViewResponse,
    ) -> Result<()> {
        let definition = self.resolve(container, definition_name, context)?;
        container.render_definition(&definition, response.writer(), context)
    }

    fn render_fragments(
        &self,
        container: &dyn Container,
        context: &mut TilesRequestContext,
        response: &mut dyn ViewResponse,
    ) -> Result<RenderOutcome> {
        let definition_name = self.processor.begin(
            &self.view_name, &self.url, container, context)?;

        let fragments = parse_fragments(
            context.request().param(&self.fragments_param).as_deref());
        if fragments.is_empty() {
            warn!("An Ajax request was detected for view '{}', but no fragments \
                   were specified to be re-rendered. Falling back to full page render.",
                  self.view_name);
            self.render_page(container, &definition_name, context, response)?;
            self.processor.end(&definition_name, &self.view_name, context);
            return Ok(RenderOutcome::FallbackFullPage)
        }

        let definition = self.resolve(container, &definition_name, context)?;
        let flattened = flatten(&definition, container, context, context.attribute_context())?;

        // Views may need the session and it can't be created once the
        // response is committed.
        context.request().init_session()?;
        response.flush_buffer()?;

        for name in &fragments {
            let entry = flattened.entry(name).ok_or_else(
                || ViewError::FragmentNotFound {
                    fragment: name.clone(),
                    view: self.view_name.clone(),
                })?;
            // Rendered where it was declared, as in the full page.
            container.render_attribute_within(
                &entry.attribute, &entry.enclosing, response.writer(), context)?;
        }

        self.processor.end(&definition_name, &self.view_name, context);
        Ok(RenderOutcome::Fragments(fragments))
    }
}
