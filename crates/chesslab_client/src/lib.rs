use chesslab_domain::{EngineSettings, parse_engine_mode, parse_positive};
use std::path::PathBuf;

pub mod live;
pub mod remote;
pub mod sync_core;
pub mod uci;

pub use live::{LiveChannel, LiveChannelError};
pub use remote::{HttpRemote, RemoteError, RemoteSource};
pub use sync_core::{SyncCore, SyncError, SyncEvent, SyncOptions};
pub use uci::{LocalEngineError, UciEngine, parse_info_line};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api/";
pub const DEFAULT_LIVE_URL: &str = "ws://127.0.0.1:5000/live";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub live_url: String,
    pub settings: EngineSettings,
    pub uci_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            live_url: DEFAULT_LIVE_URL.to_owned(),
            settings: EngineSettings::default(),
            uci_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut out = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = value("CHESSLAB_API_URL") {
            out.api_url = url;
        }
        if let Some(url) = value("CHESSLAB_LIVE_URL") {
            out.live_url = url;
        }

        let defaults = EngineSettings::default();
        out.settings = EngineSettings::new(
            value("CHESSLAB_ENGINE_MODE")
                .and_then(|v| parse_engine_mode(&v))
                .unwrap_or(defaults.mode),
            value("CHESSLAB_ENGINE_DEPTH")
                .and_then(|v| parse_positive(&v))
                .unwrap_or(defaults.depth),
            value("CHESSLAB_ENGINE_MULTIPV")
                .and_then(|v| parse_positive(&v))
                .unwrap_or(defaults.multipv),
        );

        out.uci_path = value("CHESSLAB_UCI_PATH").map(PathBuf::from);
        out
    }
}

/// Builds a sync core talking HTTP to `config.api_url`.
pub fn connect(config: &ClientConfig) -> Result<SyncCore<HttpRemote>, RemoteError> {
    let remote = HttpRemote::new(&config.api_url)?;
    Ok(SyncCore::new(
        remote,
        SyncOptions {
            settings: config.settings,
            live_url: config.live_url.clone(),
            local_engine: config.uci_path.clone().map(UciEngine::new),
        },
    ))
}
