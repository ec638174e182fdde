use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use fathom_bridge::{audit, config, pipedrive, server};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let crm = pipedrive::PipedriveClient::from_config(&cfg)?;
    let state = server::AppState {
        crm: Arc::new(crm),
        audit: Arc::new(audit::AuditLog::new(cfg.audit_log_path())),
        raw_log: Arc::new(audit::RawEventLog::new(cfg.raw_log_path())),
        webhook_token: cfg.server.webhook_token.clone(),
        excluded_domain: cfg.filter.excluded_domain.clone(),
    };

    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr).await?;
    info!(addr = %cfg.server.bind_addr, "starting webhook server");
    axum::serve(listener, app).await?;

    Ok(())
}
