//! In-process `Network` with scripted responses, for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shellcache_core::{Error, Request, Response};

use super::Network;

/// Answers from a fixed route table and records every call.
///
/// Unknown URLs answer 404. Offline mode, or a URL marked as failing,
/// rejects with `NetworkUnavailable`.
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ScriptedNetwork::route`] with a text body.
    pub fn with_route(self, url: &str, status: u16, body: &str) -> Self {
        self.route(url, Response::new(status, body.to_string()));
        self
    }

    pub fn route(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    /// Make requests for this URL reject.
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Calls made so far, formatted as `METHOD url`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(format!("{} {}", request.method, url));

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&url) {
            return Err(Error::NetworkUnavailable(format!("{url}: offline")));
        }

        let response = self
            .routes
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found"));

        Ok(response.with_url(request.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[tokio::test]
    async fn test_scripted_routes_and_records() {
        let net = ScriptedNetwork::new().with_route("https://door.local/door.html", 200, "door");
        let hit = net
            .fetch(&Request::get(Url::parse("https://door.local/door.html").unwrap()))
            .await
            .unwrap();
        let miss = net
            .fetch(&Request::get(Url::parse("https://door.local/nope").unwrap()))
            .await
            .unwrap();

        assert_eq!(&hit.body[..], b"door");
        assert_eq!(miss.status, 404);
        assert_eq!(net.calls(), vec!["GET https://door.local/door.html", "GET https://door.local/nope"]);
    }

    #[tokio::test]
    async fn test_scripted_offline() {
        let net = ScriptedNetwork::new().with_route("https://door.local/", 200, "root");
        net.set_offline(true);
        let err = net
            .fetch(&Request::get(Url::parse("https://door.local/").unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NetworkUnavailable(_)));
    }
}
