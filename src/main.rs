use chrono::{DateTime, Utc};
use clap::Parser;
use ghostpay_sync::application::synchronizer::{StatusSynchronizer, watch};
use ghostpay_sync::config::{SyncConfig, TransportKind};
use ghostpay_sync::domain::invoice::InvoiceIdentity;
use ghostpay_sync::interfaces::terminal::TerminalSink;
use miette::{IntoDiagnostic, Result};
use std::io;
use std::time::Duration;
use url::Url;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Invoice identifier to watch
    invoice_id: String,

    /// Base URL of the payment server API
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    api_base: Url,

    /// Base URL of the event stream (defaults to --api-base)
    #[arg(long)]
    stream_base: Option<Url>,

    /// How status updates are delivered
    #[arg(long, value_enum, default_value_t = TransportKind::Poll)]
    transport: TransportKind,

    /// Invoice expiry (RFC 3339), shown as a countdown next to each status
    #[arg(long)]
    expires_at: Option<DateTime<Utc>>,

    #[arg(long, default_value_t = 10)]
    initial_delay_secs: u64,

    #[arg(long, default_value_t = 10)]
    poll_interval_secs: u64,

    /// Delay before the next poll after a failed request
    #[arg(long, default_value_t = 15)]
    retry_interval_secs: u64,

    /// Delay before reopening a dropped event stream
    #[arg(long, default_value_t = 3000)]
    reconnect_delay_ms: u64,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Cli {
    fn into_config(self) -> SyncConfig {
        let mut config = SyncConfig::new(
            InvoiceIdentity::new(self.invoice_id, self.expires_at),
            self.api_base,
        );
        if let Some(stream_base) = self.stream_base {
            config.stream_base = stream_base;
        }
        config.transport = self.transport;
        config.poll.initial_delay = Duration::from_secs(self.initial_delay_secs);
        config.poll.success_delay = Duration::from_secs(self.poll_interval_secs);
        config.poll.failure_delay = Duration::from_secs(self.retry_interval_secs);
        config.reconnect_delay = Duration::from_millis(self.reconnect_delay_ms);
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = Cli::parse().into_config();
    tracing::info!(
        invoice = %config.invoice.id,
        transport = ?config.transport,
        "Watching payment status"
    );

    let mut transport = config.build_transport().into_diagnostic()?;
    let sink = TerminalSink::new(io::stdout(), config.invoice.expires_at);
    let mut synchronizer = StatusSynchronizer::new(sink);

    let last = watch(&mut transport, &mut synchronizer)
        .await
        .into_diagnostic()?;
    tracing::info!(status = %last, "Payment reached a final status");

    Ok(())
}
