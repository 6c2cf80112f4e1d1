use anyhow::Context;
use mongodb::{bson::doc, options::ClientOptions, Client};
use shuttle_runtime::{SecretStore, Secrets};
use std::sync::Arc;

use cinema_booking_api::{
    app,
    auth::JwtAuthenticator,
    catalog::TmdbClient,
    config::Config,
    notify::{EventNotifier, InngestNotifier, LogNotifier},
    state::AppState,
    store::MongoStore,
};

#[shuttle_runtime::main]
async fn main(#[Secrets] secret_store: SecretStore) -> shuttle_axum::ShuttleAxum {
    // secrets come from `Secrets.toml` locally and from the shuttle project when deployed
    let config = Config::from_secrets(&secret_store)?;

    let client_options = ClientOptions::parse(&config.mongodb_uri)
        .await
        .context("failed to parse MongoDB connection string")?;
    let client = Client::with_options(client_options).context("failed to initialize MongoDB client")?;

    let db = client.database(&config.database);
    db.run_command(doc! {"ping": 1}, None)
        .await
        .context("failed to reach MongoDB")?;
    tracing::info!(database = %config.database, "connected to MongoDB");

    let store = MongoStore::new(db);
    store.ensure_indexes().await?;

    let catalog = TmdbClient::new(&config.tmdb_base_url, &config.tmdb_api_key)?;

    let notifier: Arc<dyn EventNotifier> = match &config.inngest_event_key {
        Some(key) => Arc::new(InngestNotifier::new(key)?),
        None => {
            tracing::info!("INNGEST_EVENT_KEY not set, events will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState::new(
        Arc::new(store),
        Arc::new(catalog),
        Arc::new(JwtAuthenticator::new(&config.jwt_secret)),
        notifier,
    )
    .with_webhook_secret(config.stripe_webhook_secret)
    .with_currency(config.currency)
    .with_app_url(config.app_url);

    Ok(app(Arc::new(state)).into())
}
