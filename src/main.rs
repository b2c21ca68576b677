use anyhow::{Context, Result};
use polyglot_views::app::{self, AppState};
use polyglot_views::config::Config;
use polyglot_views::i18n::I18n;
use polyglot_views::render::{AssetManifest, Renderer, TemplateResolver};
use polyglot_views::store::DirStore;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polyglot_views=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    // Locales are loaded eagerly; a broken locale file stops startup
    let i18n = I18n::load(&DirStore::new(config.locales_dir.clone()), &config.default_locale)
        .with_context(|| format!("Failed to load locales from {}", config.locales_dir.display()))?
        .with_localized_views(config.localized_views);
    info!(
        "Serving locales {:?} (default {})",
        i18n.catalog()
            .locales()
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>(),
        i18n.catalog().default_locale()
    );

    // The manifest itself is read lazily on the first assetPath lookup
    let manifest = match &config.asset_manifest {
        Some(file) => AssetManifest::new(Arc::new(DirStore::new(config.assets_dir.clone())), file.as_str()),
        None => AssetManifest::disabled(),
    }
    .with_prefix(config.asset_prefix.clone());

    let renderer = Renderer::new(
        TemplateResolver::new(Arc::new(DirStore::new(config.templates_dir.clone()))),
        Arc::new(manifest),
    );

    let router = app::router(AppState::new(i18n, renderer));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
