mod action;
mod app;
mod app_state;
mod component;
mod components;
mod stream;
mod theme;
mod upload;
mod widgets;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = lyrsync_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("tui.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("lyrsync log: {}", log_path.display());

    tracing::info!("lyrsync starting…");

    let config = lyrsync_proto::config::Config::load().unwrap_or_default();

    app::App::new(config).run().await
}
