//! Serving `AjaxTilesView`s with rouille.

use std::collections::BTreeMap;

use anyhow::{Result, Error};
use rouille::{Request, Response, session::Session};

use crate::ajax_view::AjaxTilesView;
use crate::error::ViewError;
use crate::request::{BufferedResponse, Model, ViewRequest};
use crate::util::query_decode;
use crate::warn;


pub struct RouilleViewRequest<'r, 's> {
    request: &'r Request,
    session: &'r Session<'s>,
    path: String,
}

impl<'r, 's> RouilleViewRequest<'r, 's> {
    pub fn new(request: &'r Request, session: &'r Session<'s>) -> Self {
        RouilleViewRequest {
            request,
            session,
            path: request.url(), // path only
        }
    }

    pub fn request(&self) -> &Request { self.request }

    /// The query parameters as model values, except `skip`; names
    /// and values decoded. The first of repeated names wins, parts
    /// that don't decode are left out.
    pub fn model_from_query(&self, skip: &str) -> Model {
        let mut model = Model::new();
        for part in self.request.raw_query_string().split('&') {
            let (raw_name, raw_value) = part.split_once('=').unwrap_or((part, ""));
            let decoded = query_decode(raw_name).and_then(
                |name| Ok((name, query_decode(raw_value)?)));
            let (name, value) = match decoded {
                Ok(nv) => nv,
                Err(e) => {
                    warn!("ignoring query parameter {part:?}: {e}");
                    continue
                }
            };
            if name.is_empty() || name == skip || model.value(&name).is_some() {
                continue
            }
            model.put_value(&name, value);
        }
        model
    }
}

impl<'r, 's> ViewRequest for RouilleViewRequest<'r, 's> {
    fn param(&self, name: &str) -> Option<String> {
        self.request.get_param(name)
    }
    fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }
    fn path(&self) -> &str { &self.path }
    fn init_session(&self) -> Result<()> {
        // Retrieving the id is what makes rouille send the cookie.
        let _ = self.session.id();
        Ok(())
    }
}


pub fn html_response(body: BufferedResponse) -> Response {
    Response::from_data("text/html; charset=utf-8", body.into_body())
}

pub fn errorpage(status_code: u16, title: &str, explanation: &str) -> Response {
    let resp = format!("<html><head><title>{title}</title></head><body><h1>{title}</h1>\
                        <p>{explanation}</p></body></html>\n");
    Response::html(resp).with_status_code(status_code)
}

pub fn errorpage_from_error(err: Error) -> Response {
    warn!("ERROR in page (return 500): {err:#}");
    let explanation = match err.downcast_ref::<ViewError>() {
        Some(ViewError::FragmentNotFound { .. }) =>
            "A requested page fragment does not exist.",
        _ => "The page could not be rendered."
    };
    errorpage(500, "Internal Server Error", explanation)
}

/// Answer `request` with the view registered for its path, or a 404
/// page.
pub fn serve_view(
    views: &BTreeMap<String, AjaxTilesView>,
    fragments_param: &str,
    request: &Request,
    session: &Session,
) -> Response {
    let view_request = RouilleViewRequest::new(request, session);
    let view = match views.get(view_request.path()) {
        Some(v) => v,
        None => return errorpage(404, "Not Found",
                                 "The requested page does not exist.")
    };
    let model = view_request.model_from_query(fragments_param);
    let mut body = BufferedResponse::new();
    match view.render(&model, &view_request, &mut body) {
        Ok(_outcome) => html_response(body),
        Err(e) => errorpage_from_error(e),
    }
}
