use crate::request::ViewRequest;


/// Decides whether a request asks for a partial (Ajax) render.
pub trait RequestClassifier {
    fn is_ajax_request(&self, request: &dyn ViewRequest) -> bool;
}

impl<F: Fn(&dyn ViewRequest) -> bool> RequestClassifier for F {
    fn is_ajax_request(&self, request: &dyn ViewRequest) -> bool {
        self(request)
    }
}


/// Accept header value sent by the Spring JavaScript client for
/// partial updates.
pub const AJAX_ACCEPT_CONTENT_TYPE: &str = "text/html;type=ajax";
/// Parameter the client adds to identify the element that started
/// the request.
pub const AJAX_SOURCE_PARAM: &str = "ajaxSource";

/// Recognizes the requests of the Spring JavaScript client: the
/// `Accept` header contains `text/html;type=ajax`, or an `ajaxSource`
/// parameter is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct AjaxHandler;

impl RequestClassifier for AjaxHandler {
    fn is_ajax_request(&self, request: &dyn ViewRequest) -> bool {
        let accept_says_ajax = request.header("Accept")
            .map_or(false, |accept| accept.contains(AJAX_ACCEPT_CONTENT_TYPE));
        accept_says_ajax || request.param(AJAX_SOURCE_PARAM).is_some()
    }
}
