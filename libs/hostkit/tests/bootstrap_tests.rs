#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Host startup from configuration through to a serving router.

mod common;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use common::{recording_catalog, write_entry};
use hostkit::{AppConfig, HostApp, HostError, HostModule, ModuleCatalog, ModuleCtx, TemplateContext};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Binds namespace `pages` to its own `templates/` dir and serves `/page`.
struct Pages;

impl HostModule for Pages {
    fn register(&self, ctx: &mut ModuleCtx<'_>) -> anyhow::Result<()> {
        ctx.register_namespace("pages", ctx.module_dir().join("templates"));
        let templates = ctx.templates().clone();
        ctx.route(
            "/page",
            get(move || {
                let templates = templates.clone();
                async move {
                    let mut tctx = TemplateContext::new();
                    tctx.insert("who", "<world>");
                    templates
                        .render("@pages/index.html", &tctx)
                        .map(axum::response::Html)
                        .map_err(HostError::from)
                }
            }),
        )?;
        Ok(())
    }
}

/// Rebinds namespace `pages` to its own `templates/` dir.
struct Theme;

impl HostModule for Theme {
    fn register(&self, ctx: &mut ModuleCtx<'_>) -> anyhow::Result<()> {
        ctx.register_namespace("pages", ctx.module_dir().join("templates"));
        Ok(())
    }
}

fn write_template(module_dir: &Path, body: &str) {
    let dir = module_dir.join("templates");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("index.html"), body).unwrap();
}

fn config_for(root: &Path) -> AppConfig {
    AppConfig::from_yaml(&format!("modules:\n  path: {}\n", root.display())).unwrap()
}

fn catalog() -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    catalog.register("pages", || Box::new(Pages)).unwrap();
    catalog.register("theme", || Box::new(Theme)).unwrap();
    catalog
}

async fn get_body(router: axum::Router, uri: &str, accept: &str) -> (StatusCode, String) {
    let resp = router
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::ACCEPT, accept)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn modules_are_activated_and_served() {
    let tmp = TempDir::new().unwrap();
    let pages = tmp.path().join("pages");
    write_entry(&pages, "pages");
    write_template(&pages, "Hello {{ who }}");

    let app = HostApp::bootstrap(&config_for(tmp.path()), catalog()).unwrap();
    assert_eq!(app.host().activated_modules().len(), 1);
    assert_eq!(app.bind_addr(), "127.0.0.1:8087");

    let (status, body) = get_body(app.into_router(), "/page", "text/html").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello &lt;world&gt;");
}

#[tokio::test]
async fn later_module_rebinding_a_namespace_wins() {
    // `theme` owns the root directory, so it activates after `pages` below it.
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("site");
    let pages = root.join("pages");
    write_entry(&pages, "pages");
    write_template(&pages, "from pages");
    write_entry(&root, "theme");
    write_template(&root, "from theme");

    let app = HostApp::bootstrap(&config_for(&root), catalog()).unwrap();
    let names: Vec<_> = app
        .host()
        .activated_modules()
        .iter()
        .map(|m| m.name.clone())
        .collect();
    assert_eq!(names, vec!["pages", "theme"]);

    let (status, body) = get_body(app.into_router(), "/page", "text/html").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "from theme");
}

#[tokio::test]
async fn missing_template_is_a_negotiated_failure() {
    let tmp = TempDir::new().unwrap();
    write_entry(&tmp.path().join("pages"), "pages");

    let app = HostApp::bootstrap(&config_for(tmp.path()), catalog()).unwrap();
    let (status, body) = get_body(app.into_router(), "/page", "application/json").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "error");
    assert!(!body["message"].as_str().unwrap().contains('"'));
}

#[test]
fn absent_module_path_skips_loading() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let app = HostApp::bootstrap(&AppConfig::default(), recording_catalog(&["a"], &[], &log))
        .unwrap();
    assert!(app.host().activated_modules().is_empty());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn activation_failure_aborts_bootstrap() {
    let tmp = TempDir::new().unwrap();
    write_entry(&tmp.path().join("a"), "a");
    write_entry(&tmp.path().join("b"), "b");
    write_entry(&tmp.path().join("c"), "c");

    let log = Arc::new(Mutex::new(Vec::new()));
    let err = HostApp::bootstrap(
        &config_for(tmp.path()),
        recording_catalog(&["a", "b", "c"], &["b"], &log),
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("b refused to register"));
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
}

#[tokio::test]
async fn serve_stops_on_cancellation() {
    let app = HostApp::bootstrap(&AppConfig::default(), ModuleCatalog::new()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let cancel = CancellationToken::new();

    let server = tokio::spawn(app.serve_with_listener(listener, cancel.clone()));
    cancel.cancel();

    tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}
