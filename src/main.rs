use triage_board::config::AppConfig;
use triage_board::server;
use triage_board::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("triage_board starting");

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        upstream = %cfg.analytics_base_url,
        risk_bins = cfg.engine.risk_bins,
        value_bins = cfg.engine.value_bins,
        high_risk_limit = cfg.engine.high_risk_limit,
        "config loaded"
    );

    let port = cfg.server_port;
    let static_dir = cfg.static_dir.clone();
    let state = AppState::new(cfg);
    let app = server::router(state, &static_dir);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
