//! Request and response fakes for the unit tests. Both can share an
//! event log, to check what happened in which order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use anyhow::Result;

use crate::request::{ViewRequest, ViewResponse};

pub type Events = Rc<RefCell<Vec<String>>>;

pub struct TestRequest {
    path: String,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    events: Events,
}

impl TestRequest {
    pub fn new(path: &str) -> Self {
        TestRequest {
            path: path.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            events: Events::default(),
        }
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn events(&self) -> Events {
        self.events.clone()
    }
}

impl ViewRequest for TestRequest {
    fn param(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }
    fn path(&self) -> &str { &self.path }
    fn init_session(&self) -> Result<()> {
        self.events.borrow_mut().push("session".into());
        Ok(())
    }
}


/// Records "flush" and every write ("write <text>") in the event log.
pub struct TestResponse {
    events: Events,
    body: Vec<u8>,
    committed: bool,
}

impl TestResponse {
    pub fn new(events: Events) -> Self {
        TestResponse { events, body: Vec::new(), committed: false }
    }

    pub fn body(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl Write for TestResponse {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.events.borrow_mut().push(
            format!("write {}", String::from_utf8_lossy(buf)));
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl ViewResponse for TestResponse {
    fn writer(&mut self) -> &mut dyn Write { self }
    fn flush_buffer(&mut self) -> Result<()> {
        self.events.borrow_mut().push("flush".into());
        self.committed = true;
        Ok(())
    }
    fn is_committed(&self) -> bool { self.committed }
}
