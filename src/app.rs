//! HTTP surface: serves rendered views through the i18n middleware.

use crate::error::Error;
use crate::i18n::{I18n, Translator};
use crate::render::Renderer;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared application state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub i18n: Arc<I18n>,
    pub renderer: Arc<Renderer>,
}

impl AppState {
    pub fn new(i18n: I18n, renderer: Renderer) -> Self {
        Self {
            i18n: Arc::new(i18n),
            renderer: Arc::new(renderer),
        }
    }
}

/// Build the application router.
///
/// `GET /` renders `index.html`; `GET /<page>` renders `<page>.html`.
pub fn router(state: AppState) -> Router {
    let i18n = Arc::clone(&state.i18n);
    let routes = Router::new()
        .route("/", get(index))
        .route("/*page", get(page))
        .with_state(state);

    i18n.wrap(routes).layer(TraceLayer::new_for_http())
}

async fn index(
    State(state): State<AppState>,
    uri: Uri,
    translator: Translator,
) -> Result<Html<String>, Error> {
    render_view(state, "index.html".to_string(), &uri, translator).await
}

async fn page(
    State(state): State<AppState>,
    Path(page): Path<String>,
    uri: Uri,
    translator: Translator,
) -> Result<Html<String>, Error> {
    let name = if page.ends_with(".html") {
        page
    } else {
        format!("{}.html", page.trim_end_matches('/'))
    };
    render_view(state, name, &uri, translator).await
}

/// Render on the blocking pool; stores may hit the filesystem.
async fn render_view(
    state: AppState,
    name: String,
    uri: &Uri,
    translator: Translator,
) -> Result<Html<String>, Error> {
    let mut data = Map::new();
    data.insert(
        "locale".to_string(),
        Value::String(translator.current_locale().to_string()),
    );
    data.insert("path".to_string(), Value::String(uri.path().to_string()));

    tokio::task::spawn_blocking(move || {
        state
            .renderer
            .render_view(&state.i18n, &name, &data, &translator)
    })
    .await
    .map_err(|e| Error::Render(format!("render task failed: {}", e)))?
    .map(Html)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            Error::Store { .. } if self.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Request failed with {}: {}", status, self);
        (status, self.to_string()).into_response()
    }
}
