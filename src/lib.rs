//! Tiles-style page composition (definitions made of named attribute
//! slots) with partial rendering: on an Ajax request, only the
//! attributes named in the `fragments` parameter are rendered, found
//! anywhere in the page's definition tree.

pub mod warn;
pub mod error;
pub mod util;
pub mod attribute;
pub mod attribute_context;
pub mod definition;
pub mod request;
pub mod tiles_context;
pub mod fragments;
pub mod flatten;
pub mod template;
pub mod container;
pub mod classifier;
pub mod dynamic_tiles;
pub mod ajax_view;
pub mod config;
pub mod rouille_view;

#[cfg(test)]
pub mod testing;
