//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use appdist_transport::{
    BoxFuture, FailureKind, HttpRequest, HttpResponse, Method, Transport, TransportError,
};

use crate::types::{ApiToken, ReleaseConfiguration};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16, String),
    Fail(FailureKind),
}

impl Reply {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Self::Status(200, body.into())
    }
}

struct Route {
    method: Method,
    fragment: String,
    replies: VecDeque<Reply>,
}

/// Answers requests from per-route scripts and records every request.
///
/// A route matches on method and a URL substring; the first match wins.
/// Each route's last reply repeats once its script runs out.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, method: Method, fragment: &str, replies: Vec<Reply>) -> Self {
        self.routes.lock().unwrap().push(Route {
            method,
            fragment: fragment.into(),
            replies: replies.into(),
        });
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: Method, fragment: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.contains(fragment))
            .count()
    }

    fn next_reply(&self, request: &HttpRequest) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|r| r.method == request.method && request.url.contains(&r.fragment))?;
        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        self.log.lock().unwrap().push(request.clone());
        let reply = self.next_reply(request);
        Box::pin(async move {
            match reply {
                Some(Reply::Status(status, body)) => {
                    Ok(HttpResponse::new(status, request.url.clone(), body))
                }
                Some(Reply::Fail(kind)) => {
                    Err(TransportError::request(kind, &request.url, "scripted failure"))
                }
                None => Ok(HttpResponse::new(404, request.url.clone(), "no route")),
            }
        })
    }
}

pub(crate) const BASE: &str = "https://api.test/v0.1/apps";
pub(crate) const UPLOAD_DOMAIN: &str = "https://upload.test";

pub(crate) fn config() -> ReleaseConfiguration {
    ReleaseConfiguration {
        owner: "acme".into(),
        app_name: "shop".into(),
        api_token: ApiToken::new("api-secret"),
        distribution_targets: vec!["qa".into(), "beta".into()],
        notify_testers: true,
        release_notes: None,
        max_retries: 3,
    }
}

pub(crate) fn prepare_body() -> String {
    format!(
        r#"{{"id":"up-1","upload_domain":"{UPLOAD_DOMAIN}","token":"tok","url_encoded_token":"tok","package_asset_id":"asset-1"}}"#
    )
}
