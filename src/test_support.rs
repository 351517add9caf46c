//! In-memory fakes shared by the unit tests.

use std::cell::RefCell;

use fontpeek_http::{Body, CancelToken, Request, Response, Transport, TransportError};
use ureq::http;

/// One canned reply, chosen by URL prefix.
pub struct Route {
    pub prefix: String,
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Answers from a route table and records every URL it was asked for.
/// Unknown URLs get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<Route>,
    pub requests: RefCell<Vec<Request>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: &str, status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push(Route {
            prefix: prefix.to_string(),
            status,
            content_type,
            body: body.into(),
        });
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|request| request.uri().to_string())
            .collect()
    }
}

impl Transport for FakeTransport {
    fn execute(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        cancel.check()?;
        let mut copy = http::Request::builder()
            .method(request.method().clone())
            .uri(request.uri().clone());
        for (name, value) in request.headers() {
            copy = copy.header(name, value);
        }
        if let Ok(copy) = copy.body(()) {
            self.requests.borrow_mut().push(copy);
        }

        let url = request.uri().to_string();
        let reply = self.routes.iter().find(|route| url.starts_with(&route.prefix));
        let (status, content_type, body) = match reply {
            Some(route) => (route.status, route.content_type, route.body.clone()),
            None => (404, "text/html; charset=UTF-8", b"<html>404</html>".to_vec()),
        };
        Ok(http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(Body::from_bytes(body))
            .expect("static response parts are valid"))
    }
}
