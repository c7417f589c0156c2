use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing. `RUST_LOG` overrides the default `keepsake=info` filter.
pub fn init_telemetry(json: bool, service_name: &str) -> anyhow::Result<()> {
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keepsake=info".into()),
        )
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!(service = %service_name, json, "Tracing initialized");
    Ok(())
}
