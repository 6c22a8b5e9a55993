use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiResponse, RestTransport};
use crate::auth::AuthError;
use crate::session::Session;

type Scripted = Result<ApiResponse, AuthError>;

/// In-memory transport replaying queued responses per `METHOD url`.
///
/// The last queued response for a route repeats once the queue drains.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, method: &str, url: &str, status: u16, body: Value) -> Self {
        self.push(method, url, Ok(ApiResponse { status, body }))
    }

    pub(crate) fn on_error(self, method: &str, url: &str, error: AuthError) -> Self {
        self.push(method, url, Err(error))
    }

    fn push(self, method: &str, url: &str, response: Scripted) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(format!("{method} {url}"))
            .or_default()
            .push_back(response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: &str, url: &str) -> usize {
        let key = format!("{method} {url}");
        self.calls.lock().unwrap().iter().filter(|c| **c == key).count()
    }

    pub(crate) fn posted_bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    fn respond(&self, key: String) -> Scripted {
        self.calls.lock().unwrap().push(key.clone());
        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(&key) else {
            return Err(AuthError::Network(format!("no scripted response for {key}")));
        };
        if queue.len() > 1 {
            return queue.pop_front().unwrap();
        }
        match queue.front() {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(err)) => Err(AuthError::Network(err.to_string())),
            None => Err(AuthError::Network(format!("no scripted response for {key}"))),
        }
    }
}

#[async_trait]
impl RestTransport for ScriptedTransport {
    async fn get(&self, url: &str, _session: Option<&Session>) -> Result<ApiResponse, AuthError> {
        self.respond(format!("GET {url}"))
    }

    async fn post(
        &self,
        url: &str,
        body: &Value,
        _session: Option<&Session>,
    ) -> Result<ApiResponse, AuthError> {
        self.bodies.lock().unwrap().push(body.clone());
        self.respond(format!("POST {url}"))
    }
}
