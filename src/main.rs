//! AWS update notifier — binary entrypoint.
//! Runs exactly one cycle (the scheduler lives outside) and prints the
//! `RunResult` JSON to stdout.

use aws_update_notifier::bootstrap::build_pipeline;
use aws_update_notifier::config::AppConfig;
use aws_update_notifier::handle_event;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// RUST_LOG controls verbosity; LOG_FORMAT=json switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aws_update_notifier=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env()?;
    let pipeline = build_pipeline(&cfg).await?;

    let result = handle_event(&pipeline, serde_json::Value::Null).await;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
