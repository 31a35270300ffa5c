use std::sync::Arc;

use log::{error, info};

use recipe_keeper::config::AppConfig;
use recipe_keeper::extract::RecipeExtractor;
use recipe_keeper::images::ImageDiscovery;
use recipe_keeper::providers::GoogleProvider;
use recipe_keeper::store::RecipeStore;
use recipe_keeper::web::{self, AppState};
use recipe_keeper::KeeperError;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(err) = run().await {
        error!("startup failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), KeeperError> {
    let config = AppConfig::load()?;

    // Both secrets are required; refusing to start beats limping along.
    let provider = GoogleProvider::new(&config.gemini)?;
    let store = RecipeStore::connect(&config.database).await?;

    let extractor = RecipeExtractor::new(Box::new(provider), ImageDiscovery::new());
    let state = Arc::new(AppState::new(store, extractor));
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(&config.http.bind).await?;
    info!("listening on http://{}", config.http.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
