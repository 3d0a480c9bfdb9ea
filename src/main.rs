//! `sheets-relay` server binary.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use sheets_relay::{
	api::{self, AppState},
	config::ServerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	// A missing .env file is the normal production case.
	let _ = dotenvy::dotenv();

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let config = ServerConfig::from_env()?;

	if config.spreadsheet_id.is_none() {
		tracing::warn!("SPREADSHEET_ID is not set; sheet routes will answer 500");
	}

	tracing::info!(
		credentials = config.credentials.kind(),
		sheets_base_url = %config.sheets_base_url,
		"starting relay"
	);

	let state = Arc::new(AppState::from_config(&config)?);
	let listener = TcpListener::bind(config.listen_addr).await?;

	tracing::info!("Server listening on {}", listener.local_addr()?);

	axum::serve(listener, api::router(state)).with_graceful_shutdown(shutdown_signal()).await?;

	tracing::info!("relay stopped");

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for ctrl-c");
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
