//! Notification worker.
//!
//! Runs the notification service for one user key. Outbound transport
//! messages are written to stdout as JSON lines for the delivery surface
//! to consume; click/close events are read back from stdin, one JSON
//! [`TransportEvent`] per line.

use std::io::Write;
use std::sync::Arc;

use chapel_core::engagement::TransportEvent;
use chapel_events::reporting::{EngagementReporter, HttpReporter, LogReporter};
use chapel_events::store::{FilePreferenceCache, PgCounterStore, PgPreferenceMirror};
use chapel_events::{
    ChannelTransport, NotificationService, NotifyConfig, NotifyError, TransportMessage,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chapel_worker=debug,chapel_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Notification worker failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), NotifyError> {
    let config = NotifyConfig::from_env()?;
    tracing::info!(
        preferences_dir = %config.preferences_dir.display(),
        civil_offset = %config.civil_offset,
        batch_window_secs = config.batch_window.as_secs(),
        "Notification worker starting"
    );

    let (transport, outbound) = ChannelTransport::new();
    let cancel = CancellationToken::new();

    let mut builder = NotificationService::builder(Arc::new(transport))
        .with_config(&config)
        .with_local_cache(Arc::new(FilePreferenceCache::new(&config.preferences_dir)))
        .with_reporter(reporter(&config));

    if let Some(url) = &config.database_url {
        match connect(url).await {
            Ok(pool) => {
                builder = builder
                    .with_server_mirror(Arc::new(PgPreferenceMirror::new(pool.clone())))
                    .with_counter_store(Arc::new(PgCounterStore::new(pool)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Database unavailable, using local preferences only");
            }
        }
    }

    let service = Arc::new(builder.build());

    let bridge = if config.push_enabled {
        Some(tokio::spawn(forward_outbound(
            outbound,
            cancel.clone(),
            std::io::stdout(),
        )))
    } else {
        tracing::warn!("PUSH_ENABLED is off, delivery surface disabled");
        drop(outbound);
        None
    };

    if !service.initialize(&config.default_user).await {
        tracing::warn!(user = %config.default_user, "Running without notification delivery");
    }

    let events = tokio::spawn(read_events(Arc::clone(&service), cancel.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown signal received"),
        _ = cancel.cancelled() => {}
    }

    service.shutdown().await;
    cancel.cancel();
    let _ = events.await;
    if let Some(bridge) = bridge {
        let _ = bridge.await;
    }
    tracing::info!("Notification worker stopped");
    Ok(())
}

async fn connect(url: &str) -> Result<chapel_db::DbPool, NotifyError> {
    let pool = chapel_db::create_pool(url).await?;
    chapel_db::health_check(&pool).await?;
    chapel_db::run_migrations(&pool)
        .await
        .map_err(|e| NotifyError::Database(e.into()))?;
    tracing::info!("Database connected, migrations applied");
    Ok(pool)
}

fn reporter(config: &NotifyConfig) -> Arc<dyn EngagementReporter> {
    let Some(endpoint) = &config.engagement_endpoint else {
        return Arc::new(LogReporter);
    };
    match HttpReporter::new(endpoint.as_str()) {
        Ok(reporter) => Arc::new(reporter),
        Err(e) => {
            tracing::warn!(error = %e, "Engagement endpoint unusable, logging reports instead");
            Arc::new(LogReporter)
        }
    }
}

/// Write each outbound message to `out` as one JSON line.
///
/// Messages already queued when `cancel` fires are still written, so the
/// notifications flushed by `NotificationService::shutdown` reach the surface.
async fn forward_outbound<W: Write>(
    mut outbound: mpsc::UnboundedReceiver<TransportMessage>,
    cancel: CancellationToken,
    mut out: W,
) {
    loop {
        tokio::select! {
            biased;
            message = outbound.recv() => {
                let Some(message) = message else { break };
                write_line(&mut out, &message);
            }
            _ = cancel.cancelled() => {
                while let Ok(message) = outbound.try_recv() {
                    write_line(&mut out, &message);
                }
                break;
            }
        }
    }
}

fn write_line<W: Write>(out: &mut W, message: &TransportMessage) {
    let line = match serde_json::to_string(message) {
        Ok(line) => line,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode transport message");
            return;
        }
    };
    if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
        tracing::error!(error = %e, "Failed to write transport message");
    }
}

/// Feed click/close events from stdin into the service until EOF.
async fn read_events(service: Arc<NotificationService>, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read transport event");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TransportEvent>(&line) {
            Ok(event) => {
                let effect = service.handle_event(event).await;
                tracing::info!(?effect, "Transport event handled");
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed transport event"),
        }
    }
}
