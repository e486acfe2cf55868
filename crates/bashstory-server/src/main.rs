//! bashstory server entry point.
//!
//! Configuration comes from defaults, then an optional TOML file (path in
//! `BASHSTORY_CONFIG` or the first argument), then `BASHSTORY_PORT`/`PORT`
//! and `BASHSTORY_BIND`.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use bashstory_server::{AppState, router};
use bashstory_store::{MemoryStore, Store};
use bashstory_types::config::ServerConfig;

/// Resolved configuration plus the file it came from, if any.
///
/// `env` abstracts the process environment and `arg` is the first
/// command-line argument.
fn load_config<F>(env: F, arg: Option<String>) -> Result<(ServerConfig, Option<PathBuf>)>
where
    F: Fn(&str) -> Option<String>,
{
    let path = env("BASHSTORY_CONFIG").or(arg).map(PathBuf::from);
    let mut config = ServerConfig::load(path.as_deref())?;
    config.apply_env(env)?;
    Ok((config, path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, path) = load_config(|key| std::env::var(key).ok(), std::env::args().nth(1))?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    match &path {
        Some(p) => log::info!("Loaded server config from {}", p.display()),
        None => log::info!("Using default server config"),
    }

    let store: Box<dyn Store> = if config.seed_demo_data {
        Box::new(MemoryStore::seeded()?.with_session_ttl(config.session_max_age_secs))
    } else {
        Box::new(MemoryStore::new().with_session_ttl(config.session_max_age_secs))
    };

    let address = config.listen_address();
    let app = router(AppState::new(store, config));
    let listener = tokio::net::TcpListener::bind(&address).await?;
    log::info!("bashstory listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for shutdown signal: {e}");
        }
    })
    .await?;

    log::info!("bashstory stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn config_file_path_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 4100").unwrap();
        let arg = file.path().to_string_lossy().into_owned();

        let (config, path) = load_config(|_| None, Some(arg)).unwrap();
        assert_eq!(config.port, 4100);
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    fn env_path_wins_and_env_overrides_apply() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 4100").unwrap();
        let from_env = file.path().to_string_lossy().into_owned();
        let env = move |key: &str| match key {
            "BASHSTORY_CONFIG" => Some(from_env.clone()),
            "BASHSTORY_PORT" => Some("4200".to_string()),
            _ => None,
        };

        let (config, path) = load_config(env, Some("/nonexistent.toml".into())).unwrap();
        assert_eq!(config.port, 4200);
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    fn defaults_without_a_file() {
        let (config, path) = load_config(|_| None, None).unwrap();
        assert!(path.is_none());
        assert_eq!(config, ServerConfig::default());
    }
}
