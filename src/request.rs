//! What the view layer needs from the hosting server.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use kstring::KString;

use crate::attribute::Attribute;
use crate::attribute_context::AttributeContext;


pub trait ViewRequest {
    /// Only query parameters.
    fn param(&self, name: &str) -> Option<String>;
    fn header(&self, name: &str) -> Option<&str>;
    /// Path part of the request URL.
    fn path(&self) -> &str;
    /// Make sure a session exists, so that anything rendered after
    /// the response is committed can rely on it.
    fn init_session(&self) -> Result<()>;
}

pub trait ViewResponse {
    fn writer(&mut self) -> &mut dyn Write;
    /// Send what's been written so far. Commits the response: the
    /// status and headers can't be changed afterwards.
    fn flush_buffer(&mut self) -> Result<()>;
    fn is_committed(&self) -> bool;
}


/// A `ViewResponse` that keeps the whole body in memory; the host
/// sends it once the view has finished.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    body: Vec<u8>,
    committed: bool,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> &[u8] { &self.body }

    pub fn into_body(self) -> Vec<u8> { self.body }

    pub fn body_string(&self) -> Result<&str> {
        Ok(std::str::from_utf8(&self.body)?)
    }
}

impl ViewResponse for BufferedResponse {
    fn writer(&mut self) -> &mut dyn Write {
        &mut self.body
    }

    fn flush_buffer(&mut self) -> Result<()> {
        self.committed = true;
        Ok(())
    }

    fn is_committed(&self) -> bool { self.committed }
}


/// What a controller hands to a view: plain values for the templates
/// (HTML-escaped on output), and tiles attributes to add to the
/// rendering context for this request.
#[derive(Debug, Clone, Default)]
pub struct Model {
    values: BTreeMap<KString, String>,
    attributes: AttributeContext,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_value(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(KString::from_ref(key), value.into());
        self
    }

    pub fn put_attribute(&mut self, name: &str, attribute: Attribute) -> &mut Self {
        self.attributes.put(name, attribute);
        self
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn attributes(&self) -> &AttributeContext { &self.attributes }
}
