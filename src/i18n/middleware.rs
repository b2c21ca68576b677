//! Per-request i18n glue for axum.
//!
//! [`negotiate`] reads `Accept-Language`, picks a locale and stores a fresh
//! [`Translator`] in the request extensions, which act as the request-scoped
//! context: the `Translator` type itself is the well-known key. Handlers take
//! it back out with the `Translator` extractor.

use crate::error::Result;
use crate::i18n::{Locale, LocaleCatalog, LocaleMatcher, PluralRules, Translator};
use crate::store::ContentStore;
use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use tracing::debug;

/// Shared, read-only i18n state: the catalog, plural rules and view options.
#[derive(Debug, Clone)]
pub struct I18n {
    catalog: Arc<LocaleCatalog>,
    plural_rules: Arc<PluralRules>,
    localized_views: bool,
}

impl I18n {
    pub fn new(catalog: LocaleCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            plural_rules: Arc::new(PluralRules::default()),
            localized_views: false,
        }
    }

    /// Load the catalog from a store of locale files.
    ///
    /// # Errors
    /// Propagates `CatalogLoad` and `Config` errors from [`LocaleCatalog::load`].
    pub fn load(store: &dyn ContentStore, default_locale: &str) -> Result<Self> {
        Ok(Self::new(LocaleCatalog::load(store, default_locale)?))
    }

    pub fn with_plural_rules(mut self, rules: PluralRules) -> Self {
        self.plural_rules = Arc::new(rules);
        self
    }

    /// Enable locale-qualified template names (`index.fr.html`).
    pub fn with_localized_views(mut self, enabled: bool) -> Self {
        self.localized_views = enabled;
        self
    }

    pub fn localized_views(&self) -> bool {
        self.localized_views
    }

    pub fn catalog(&self) -> &LocaleCatalog {
        &self.catalog
    }

    /// Build a translator bound to `locale`.
    pub fn translator(&self, locale: Locale) -> Translator {
        Translator::new(
            locale,
            Arc::clone(&self.catalog),
            Arc::clone(&self.plural_rules),
        )
    }

    /// Negotiate a locale from a raw preference header and bind a translator.
    pub fn translator_for(&self, accept_language: Option<&str>) -> Translator {
        let locale = match accept_language {
            Some(header) => LocaleMatcher::negotiate_header(header, &self.catalog),
            None => self.catalog.default_locale().clone(),
        };
        self.translator(locale)
    }

    /// Propose a locale-qualified variant of a template name.
    ///
    /// Returns `None` when localized views are off. The variant may not exist;
    /// the template resolver falls back to the plain name.
    pub fn resolve_localized_view(&self, name: &str, locale: &Locale) -> Option<String> {
        self.localized_views.then(|| localized_name(name, locale))
    }

    /// Template names to try, most specific first.
    pub fn view_candidates(&self, name: &str, locale: &Locale) -> Vec<String> {
        match self.resolve_localized_view(name, locale) {
            Some(localized) => vec![localized, name.to_string()],
            None => vec![name.to_string()],
        }
    }

    /// Install [`negotiate`] on every route of `router`.
    pub fn wrap<S>(self: &Arc<Self>, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(Arc::clone(self), negotiate))
    }
}

/// Insert the locale tag before the file extension: `index.html` + `fr`
/// becomes `index.fr.html`, `index` becomes `index.fr`.
pub fn localized_name(name: &str, locale: &Locale) -> String {
    let (dir, file) = match name.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, name),
    };
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}.{}.{}", stem, locale, ext),
        _ => format!("{}.{}", file, locale),
    };
    match dir {
        Some(dir) => format!("{}/{}", dir, file),
        None => file,
    }
}

/// Axum middleware: negotiate the request's locale and publish a translator.
pub async fn negotiate(State(i18n): State<Arc<I18n>>, mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let translator = i18n.translator_for(header);

    debug!(
        "Accept-Language {:?} negotiated to {}",
        header,
        translator.current_locale()
    );

    request.extensions_mut().insert(translator);
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for Translator
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        parts.extensions.get::<Translator>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "i18n middleware is not installed",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Vars;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn locale(tag: &str) -> Locale {
        Locale::parse(tag).unwrap()
    }

    fn test_i18n() -> Arc<I18n> {
        let store = MemoryStore::new()
            .with_file("en-US.json", r#"{"greeting": "Hello, World!"}"#)
            .with_file("fr.json", r#"{"greeting": "Bonjour à tous !"}"#);
        Arc::new(I18n::load(&store, "en-US").expect("Should load"))
    }

    fn app(i18n: &Arc<I18n>) -> Router {
        let router = Router::new()
            .route(
                "/",
                get(|translator: Translator| async move {
                    translator.translate("greeting", &Vars::new())
                }),
            )
            .route(
                "/locale",
                get(|translator: Translator| async move {
                    translator.current_locale().to_string()
                }),
            );
        i18n.wrap(router)
    }

    async fn get_body(router: Router, uri: &str, accept_language: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(value) = accept_language {
            builder = builder.header(ACCEPT_LANGUAGE, value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    // ==================== Localized Name Tests ====================

    #[test]
    fn test_localized_name_with_extension() {
        assert_eq!(localized_name("index.html", &locale("fr")), "index.fr.html");
        assert_eq!(
            localized_name("users/show.html", &locale("en-US")),
            "users/show.en-US.html"
        );
    }

    #[test]
    fn test_localized_name_without_extension() {
        assert_eq!(localized_name("index", &locale("fr")), "index.fr");
        assert_eq!(localized_name("v1.2/page", &locale("fr")), "v1.2/page.fr");
    }

    #[test]
    fn test_resolve_localized_view_disabled() {
        let i18n = test_i18n();
        assert_eq!(i18n.resolve_localized_view("index.html", &locale("fr")), None);
        assert_eq!(
            i18n.view_candidates("index.html", &locale("fr")),
            vec!["index.html"]
        );
    }

    #[test]
    fn test_view_candidates_enabled() {
        let i18n = (*test_i18n()).clone().with_localized_views(true);
        assert_eq!(
            i18n.view_candidates("index.html", &locale("fr")),
            vec!["index.fr.html", "index.html"]
        );
    }

    // ==================== Translator Construction Tests ====================

    #[test]
    fn test_translator_for_missing_header_uses_default() {
        let i18n = test_i18n();
        assert_eq!(i18n.translator_for(None).current_locale(), &locale("en-US"));
    }

    #[test]
    fn test_translator_for_header() {
        let i18n = test_i18n();
        assert_eq!(
            i18n.translator_for(Some("fr-fr")).current_locale(),
            &locale("fr")
        );
    }

    // ==================== Middleware Tests ====================

    #[tokio::test]
    async fn test_middleware_default_locale() {
        let (status, body) = get_body(app(&test_i18n()), "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hello, World!");
    }

    #[tokio::test]
    async fn test_middleware_negotiates_french() {
        let (_, body) = get_body(app(&test_i18n()), "/", Some("fr-fr")).await;
        assert_eq!(body, "Bonjour à tous !");
    }

    #[tokio::test]
    async fn test_middleware_exposes_current_locale() {
        let i18n = test_i18n();
        let (_, body) = get_body(app(&i18n), "/locale", Some("ru")).await;
        assert_eq!(body, "en-US");

        let (_, body) = get_body(app(&i18n), "/locale", Some("fr,en")).await;
        assert_eq!(body, "fr");
    }

    #[tokio::test]
    async fn test_middleware_tolerates_garbage_header() {
        let (status, body) = get_body(app(&test_i18n()), "/", Some(";;q=nope,,")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hello, World!");
    }

    #[tokio::test]
    async fn test_extractor_without_middleware_is_rejected() {
        let router = Router::new().route(
            "/",
            get(|translator: Translator| async move { translator.current_locale().to_string() }),
        );
        let (status, _) = get_body(router, "/", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
