use crate::notify::{ContactMessage, ContactNotifier};
use anyhow::{Context, Result};
use artemisia_catalog::Category;
use artemisia_context::manifest::{category_page, contact_page, FixedPage, PageSpec};
use artemisia_context::project::SiteProject;
use artemisia_template::{escape_html, RenderError};
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::path::{Component, Path as FsPath};
use std::sync::Arc;

/// What a visitor sees when their message could not be sent.
pub const SEND_FAILED_MESSAGE: &str = "Failed to send message. Please try again later.";

/// Old spelling of the coated pellets slug, still linked from outside.
const LEGACY_COATED_SLUG: &str = "dr-ec-pellets";

#[derive(Clone)]
pub struct AppState {
    project: SiteProject,
    notifier: Arc<dyn ContactNotifier>,
}

impl AppState {
    pub fn new(project: SiteProject, notifier: Arc<dyn ContactNotifier>) -> Self {
        Self { project, notifier }
    }
}

/// Routes of the live site. Views and product data are re-read on every
/// request.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/contact", get(contact_handler).post(contact_submit_handler))
        .route("/products/{slug}", get(category_handler))
        .route("/products/{slug}/", get(category_handler))
        .fallback(page_handler)
        .with_state(state)
}

pub async fn run(state: AppState, port: u16) -> Result<()> {
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    eprintln!("  Server running at http://localhost:{port}");
    eprintln!();

    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<AppState>) -> Response {
    render_page(&state, &FixedPage::Home.page(&state.project.config))
}

async fn contact_handler(State(state): State<AppState>) -> Response {
    render_page(&state, &FixedPage::Contact.page(&state.project.config))
}

async fn contact_submit_handler(
    State(state): State<AppState>,
    form: Result<Form<ContactMessage>, FormRejection>,
) -> Response {
    let config = &state.project.config;
    let Ok(Form(message)) = form.inspect_err(|e| log::warn!("Rejected contact form: {e}")) else {
        return render_page(&state, &contact_page(config, false, Some(SEND_FAILED_MESSAGE)));
    };
    let page = match state.notifier.send(&message).await {
        Ok(id) => {
            log::info!("Email sent: {id}");
            contact_page(config, true, None)
        }
        Err(e) => {
            log::error!("Email error: {e}");
            contact_page(config, false, Some(SEND_FAILED_MESSAGE))
        }
    };
    render_page(&state, &page)
}

async fn category_handler(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    if slug == LEGACY_COATED_SLUG {
        let target = Category::EcDrPellets.route();
        return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, target)]).into_response();
    }
    match Category::from_key(&slug) {
        Some(category) => {
            let products = state.project.loader().load(category);
            render_page(&state, &category_page(category, products, &state.project.config))
        }
        None => {
            log::warn!("Unknown product category: {slug}");
            not_found(&state)
        }
    }
}

/// Fixed pages by route (tolerating a trailing slash), then files under
/// `public/`, then the 404 page.
async fn page_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    if let Some(page) = FixedPage::from_route(path) {
        return render_page(&state, &page.page(&state.project.config));
    }
    if let Some(response) = serve_public(&state.project.public_dir(), path) {
        return response;
    }
    not_found(&state)
}

fn render_page(state: &AppState, page: &PageSpec) -> Response {
    render_with_status(state, page, StatusCode::OK)
}

fn not_found(state: &AppState) -> Response {
    let page = FixedPage::NotFound.page(&state.project.config);
    render_with_status(state, &page, StatusCode::NOT_FOUND)
}

fn render_with_status(state: &AppState, page: &PageSpec, status: StatusCode) -> Response {
    let templates = match state.project.templates() {
        Ok(t) => t,
        Err(e) => return error_response(&format!("Failed to collect views: {e:#}")),
    };

    match templates.render(&page.template_id, &page.data) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(RenderError::TemplateNotFound(_)) if page.template_id == FixedPage::NotFound.template_id() => {
            (StatusCode::NOT_FOUND, Html(not_found_html(&page.route))).into_response()
        }
        Err(RenderError::TemplateNotFound(id)) => {
            log::warn!("Missing view: {id}");
            not_found(state)
        }
        Err(e) => {
            log::error!("Failed to render {}: {e}", page.template_id);
            error_response(&e.to_string())
        }
    }
}

/// A file under `public/` for a request path, if one exists. Paths that
/// try to leave the directory are never served.
fn serve_public(public_dir: &FsPath, request_path: &str) -> Option<Response> {
    let rel = FsPath::new(request_path.trim_start_matches('/'));
    if rel.as_os_str().is_empty()
        || rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let file_path = public_dir.join(rel);
    if !file_path.is_file() {
        return None;
    }
    match std::fs::read(&file_path) {
        Ok(bytes) => Some(
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type(&file_path))],
                bytes,
            )
                .into_response(),
        ),
        Err(e) => {
            log::error!("Failed to read {}: {e}", file_path.display());
            None
        }
    }
}

fn content_type(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn not_found_html(path: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body>
        <h1>404 - Page not found</h1>
        <p>Nothing here at <code>{}</code></p>
        </body></html>"#,
        escape_html(path)
    )
}

fn error_response(message: &str) -> Response {
    let html = format!(
        r#"<!DOCTYPE html><html><body>
        <h1>Render Error</h1>
        <pre>{}</pre>
        </body></html>"#,
        escape_html(message)
    );
    (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
}
