use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::initialize_app_state_with_url;
use crate::router::create_router;

/// Bring up the FlexyPay API: connect to the store, seed the bootstrap
/// admin if configured, then run the axum accept loop until shutdown.
pub async fn serve(database_url: &str, bind_address: &str) -> Result<()> {
    info!("FlexyPay starting; store at {}", database_url);

    let state = initialize_app_state_with_url(database_url)
        .await
        .context("failed to initialize application state")?;

    let app = create_router(state);

    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!("FlexyPay API listening on http://{}", bind_address);
    info!("Swagger UI at http://{}/swagger-ui", bind_address);

    axum::serve(listener, app).await.context("server error")?;

    info!("Server shutdown gracefully");
    Ok(())
}
