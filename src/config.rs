use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND: &str = "0.0.0.0:3001";

/// Server configuration, read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket server listens on (`OM_BIND`)
    pub bind: SocketAddr,
    /// Optional JSON file overriding the built-in question bank
    /// (`OM_QUESTIONS_FILE`)
    pub questions_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind = std::env::var("OM_BIND")
            .ok()
            .and_then(|s| match s.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    tracing::warn!("Invalid OM_BIND value '{}', using default", s);
                    None
                }
            })
            .unwrap_or_else(|| DEFAULT_BIND.parse().expect("default bind address is valid"));

        let questions_file = std::env::var("OM_QUESTIONS_FILE").ok().map(PathBuf::from);

        Self {
            bind,
            questions_file,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.parse().expect("default bind address is valid"),
            questions_file: None,
        }
    }
}
