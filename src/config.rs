use anyhow::{anyhow, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;

use crate::theme::Theme;

/// How change notifications reach the client.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source {
    /// Subscribe over WebSocket; fall back to polling if the socket cannot
    /// be established.
    Ws,
    /// Polling only.
    Poll,
}

impl std::str::FromStr for Source {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ws" | "websocket" => Ok(Source::Ws),
            "poll" | "polling" => Ok(Source::Poll),
            _ => Err(anyhow!("Invalid source '{s}'. Valid options: ws, poll")),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Ws => write!(f, "ws"),
            Source::Poll => write!(f, "poll"),
        }
    }
}

/// Broadside - microchain battleship in the terminal
///
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "broadside")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal client for microchain battleship", long_about = None)]
pub struct CliArgs {
    /// Change feed: ws (subscription with poll fallback) or poll
    #[arg(short, long, env = "SOURCE", value_parser = clap::value_parser!(Source))]
    pub source: Option<Source>,

    /// Node service URL hosting the chains
    #[arg(long, env = "NODE_URL")]
    pub node_url: Option<String>,

    /// WebSocket URL for notifications (derived from NODE_URL when unset)
    #[arg(long, env = "WS_URL")]
    pub ws_url: Option<String>,

    /// Application id of the battleship app
    #[arg(long, env = "APP_ID")]
    pub app_id: Option<String>,

    /// Chain id of the local player
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<String>,

    /// Orchestrator chain id used for quick-match (optional)
    #[arg(long, env = "MATCHMAKER_CHAIN_ID")]
    pub matchmaker_chain_id: Option<String>,

    /// Polling interval in milliseconds (100-10000)
    #[arg(long, env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Query timeout in milliseconds (1000-60000)
    #[arg(long, env = "RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    /// Target UI rendering FPS (1-120)
    #[arg(long, env = "RENDER_FPS")]
    pub render_fps: Option<u32>,

    /// Display name announced to opponents (session nickname when unset)
    #[arg(long, env = "PLAYER_NAME")]
    pub player_name: Option<String>,

    /// Path of the session file
    #[arg(long, env = "BROADSIDE_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Color theme: nord, dos-blue, amber-crt, green-phosphor
    #[arg(long, env = "THEME", value_parser = clap::value_parser!(Theme))]
    pub theme: Option<Theme>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub source: Source,
    pub node_url: String,
    pub ws_url: String,
    pub app_id: String,
    pub chain_id: String,
    pub matchmaker_chain_id: Option<String>,
    pub poll_interval_ms: u64,
    pub rpc_timeout_ms: u64,
    pub render_fps: u32,
    pub player_name: Option<String>,
    pub session_file: PathBuf,
    pub theme: Theme,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("ws://")
        || url.starts_with("wss://")
        || url.starts_with("http://")
        || url.starts_with("https://")
    {
        Ok(())
    } else {
        Err(anyhow!(
            "{name} must start with ws://, wss://, http://, or https://"
        ))
    }
}

/// Notification endpoint derived from the HTTP node URL: same host, ws
/// scheme, `/ws` path.
fn derive_ws_url(node_url: &str) -> String {
    let base = node_url.trim_end_matches('/');
    let swapped = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{swapped}/ws")
}

/// Load configuration from CLI args and environment variables
/// Priority: CLI args > Environment variables > Defaults
pub fn load() -> Result<Config> {
    let args = CliArgs::parse();
    load_from(args)
}

fn load_from(args: CliArgs) -> Result<Config> {
    let source = args.source.unwrap_or_else(|| {
        env::var("SOURCE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Source::Ws)
    });

    let node_url = args
        .node_url
        .or_else(|| env::var("NODE_URL").ok())
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    validate_url(&node_url, "NODE_URL")?;

    let ws_url = args
        .ws_url
        .or_else(|| env::var("WS_URL").ok())
        .unwrap_or_else(|| derive_ws_url(&node_url));
    validate_url(&ws_url, "WS_URL")?;

    let app_id = args
        .app_id
        .or_else(|| env::var("APP_ID").ok())
        .ok_or_else(|| anyhow!("APP_ID is required (pass --app-id or set APP_ID)"))?;

    let chain_id = args
        .chain_id
        .or_else(|| env::var("CHAIN_ID").ok())
        .ok_or_else(|| anyhow!("CHAIN_ID is required (pass --chain-id or set CHAIN_ID)"))?;

    let matchmaker_chain_id = args
        .matchmaker_chain_id
        .or_else(|| env::var("MATCHMAKER_CHAIN_ID").ok())
        .filter(|s| !s.is_empty());

    let poll_interval_ms = args
        .poll_interval_ms
        .or_else(|| {
            env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
        })
        .unwrap_or(1000);
    let poll_interval_ms = validate_in_range(poll_interval_ms, 100, 10000, "POLL_INTERVAL_MS")?;

    let rpc_timeout_ms = args
        .rpc_timeout_ms
        .or_else(|| env::var("RPC_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()))
        .unwrap_or(8000);
    let rpc_timeout_ms = validate_in_range(rpc_timeout_ms, 1000, 60000, "RPC_TIMEOUT_MS")?;

    let render_fps = args
        .render_fps
        .or_else(|| env::var("RENDER_FPS").ok().and_then(|s| s.parse().ok()))
        .unwrap_or(30);
    let render_fps = validate_in_range(render_fps, 1, 120, "RENDER_FPS")?;

    let player_name = args
        .player_name
        .or_else(|| env::var("PLAYER_NAME").ok())
        .filter(|s| !s.trim().is_empty());

    let session_file = args
        .session_file
        .or_else(|| env::var("BROADSIDE_SESSION_FILE").ok().map(PathBuf::from))
        .unwrap_or_else(crate::session::default_session_path);

    let theme = args.theme.unwrap_or_else(|| {
        env::var("THEME")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    });

    Ok(Config {
        source,
        node_url,
        ws_url,
        app_id,
        chain_id,
        matchmaker_chain_id,
        poll_interval_ms,
        rpc_timeout_ms,
        render_fps,
        player_name,
        session_file,
        theme,
    })
}

impl Config {
    /// Print current configuration to stderr (useful for debugging)
    pub fn print_summary(&self) {
        eprintln!("Broadside Configuration:");
        eprintln!("  Source: {}", self.source);
        eprintln!("  Node URL: {}", self.node_url);
        if self.source == Source::Ws {
            eprintln!("  WebSocket URL: {}", self.ws_url);
        }
        eprintln!("  App: {}", self.app_id);
        eprintln!("  Chain: {}", self.chain_id);
        match &self.matchmaker_chain_id {
            Some(id) => eprintln!("  Matchmaker: {id}"),
            None => eprintln!("  Matchmaker: (not configured)"),
        }
        eprintln!("  Poll Interval: {}ms", self.poll_interval_ms);
        eprintln!("  Query Timeout: {}ms", self.rpc_timeout_ms);
        eprintln!("  Render FPS: {}", self.render_fps);
        eprintln!("  Session File: {}", self.session_file.display());
    }
}
