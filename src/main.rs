mod config;
mod db;
mod detail;
mod entities;
mod error;
mod listing;
mod models;
mod notify;
mod pipeline;
mod source;
mod store;
mod templates;
mod window;

use std::time::Duration;

use sea_orm::ConnectOptions;

use crate::{
    config::Config,
    notify::{Notifier, OutboxNotifier, WebhookNotifier},
    pipeline::RunOptions,
    source::HttpSource,
    store::MovieStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,kinowatch=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(ConnectOptions::new(config.database_url.clone())).await?;
    let store = MovieStore::new(db);

    let source = HttpSource::from_config(&config)?;

    let notifier: Box<dyn Notifier> = match &config.webhook_url {
        Some(url) => {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()?;
            Box::new(WebhookNotifier::new(http, url.clone()))
        },
        None => Box::new(OutboxNotifier::new(config.outbox_dir.clone())),
    };

    let options = RunOptions {
        base_url: config.base_url.clone(),
        today: jiff::Zoned::now().date(),
        days: config.days_ahead,
        max_concurrent: config.max_concurrent,
        recipients: notify::load_recipients(&config.recipients_file),
    };

    tracing::info!(base_url = %config.base_url, days = config.days_ahead, "starting run");
    let outcome = pipeline::run(&source, &store, notifier.as_ref(), options).await?;

    match serde_json::to_string_pretty(&outcome.movies) {
        Ok(json) => tracing::info!(target: "kinowatch::movies", "collected movie details:\n{json}"),
        Err(err) => tracing::warn!(error = %err, "could not serialize collected movies"),
    }
    tracing::info!(report = ?outcome.report, "done");

    Ok(())
}
