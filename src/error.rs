use kstring::KString;
use thiserror::Error;

/// The failures the view layer distinguishes. They travel inside
/// `anyhow::Error`; use `err.downcast_ref::<ViewError>()` to tell
/// them apart.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ViewError {
    #[error("Tiles container is not initialized for view '{view}'. \
             Has a TilesContainer been configured for it?")]
    ContainerNotInitialized { view: KString },

    #[error("no tiles attribute with a name of '{fragment}' could be found \
             for the current view: {view}")]
    FragmentNotFound { fragment: KString, view: KString },

    #[error("no definition named {:?}", .name.as_str())]
    DefinitionNotFound { name: KString },

    #[error("no template at {:?}", .path.as_str())]
    TemplateNotFound { path: KString },

    #[error("template {:?}: {message}", .path.as_str())]
    TemplateSyntax { path: KString, message: String },

    #[error("template {:?} inserts attribute {:?} which is not defined",
            .template.as_str(), .name.as_str())]
    AttributeNotFound { name: KString, template: KString },

    #[error("inserts nested deeper than {limit} levels (recursive definitions?)")]
    InsertTooDeep { limit: usize },
}
