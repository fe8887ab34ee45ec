use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};
use hostkit::{HostError, TemplateContext, TemplateEngine};

use crate::contract::GreeterApi;
use crate::domain::GreeterService;

#[derive(Clone)]
pub(crate) struct GreeterState {
    pub(crate) service: Arc<dyn GreeterApi>,
    pub(crate) templates: TemplateEngine,
    pub(crate) template: String,
}

pub(crate) fn router(state: GreeterState) -> Router {
    Router::new()
        .route("/greeter/{name}", get(greet_page))
        .with_state(state)
}

async fn greet_page(
    State(state): State<GreeterState>,
    Path(name): Path<String>,
) -> Result<Html<String>, HostError> {
    let name = GreeterService::validate_name(&name).map_err(HostError::bad_request)?;

    let mut ctx = TemplateContext::new();
    ctx.insert("salutation", state.service.salutation());
    ctx.insert("name", name);
    ctx.insert("greeting", &state.service.greet(name));

    let page = state.templates.render(&state.template, &ctx)?;
    Ok(Html(page))
}
