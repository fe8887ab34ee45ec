use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use greeter::GreeterApi;
use hostkit::{HostError, NamespaceRegistry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    /// Modules activated before this one, in activation order.
    pub modules_before: Vec<String>,
    /// Namespace bindings as `key -> path`.
    pub namespaces: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

#[derive(Clone)]
pub(crate) struct StatusState {
    pub(crate) namespaces: Arc<NamespaceRegistry>,
    pub(crate) modules_before: Vec<String>,
    pub(crate) greeter: Option<Arc<dyn GreeterApi>>,
    pub(crate) failure_message: String,
}

pub(crate) fn router(state: StatusState, failure_route: bool) -> Router {
    let mut router = Router::new().route("/status", get(report));
    if failure_route {
        router = router.route("/status/fail", get(fail));
    }
    router.with_state(state)
}

async fn report(State(state): State<StatusState>) -> Json<StatusReport> {
    let namespaces = state
        .namespaces
        .bindings()
        .into_iter()
        .map(|(key, path)| (key, path.display().to_string()))
        .collect();

    Json(StatusReport {
        status: "ok".to_owned(),
        modules_before: state.modules_before.clone(),
        namespaces,
        greeting: state.greeter.as_ref().map(|g| g.greet("status")),
    })
}

async fn fail(State(state): State<StatusState>) -> HostError {
    HostError::service_unavailable(state.failure_message.clone())
}
