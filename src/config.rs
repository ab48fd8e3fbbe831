//! Runtime configuration: bind address and database path, env-driven with
//! a home-directory default.

use std::net::SocketAddr;
use std::path::PathBuf;

pub const APP_NAME: &str = "vetreg";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_ADDR: &str = "127.0.0.1:8600";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
}

impl Config {
    /// Read configuration from `VETREG_ADDR` and `VETREG_DB`, falling back
    /// to `127.0.0.1:8600` and `~/.vetreg/vetreg.db`.
    pub fn from_env() -> Result<Self, String> {
        let addr = std::env::var("VETREG_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| format!("Invalid VETREG_ADDR '{addr}': {e}"))?;

        let db_path = match std::env::var("VETREG_DB") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_db_path()?,
        };

        Ok(Self { addr, db_path })
    }
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info,tower_http=info")
}

/// `~/.vetreg/vetreg.db`, creating the directory if needed.
fn default_db_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Cannot determine home directory")?;
    let dir = home.join(".vetreg");
    std::fs::create_dir_all(&dir).map_err(|e| format!("Cannot create {}: {e}", dir.display()))?;
    Ok(dir.join("vetreg.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_addr_parses() {
        let addr: SocketAddr = DEFAULT_ADDR.parse().unwrap();
        assert_eq!(addr.port(), 8600);
    }

    #[test]
    fn default_db_path_under_home() {
        let path = default_db_path().unwrap();
        assert!(path.starts_with(dirs::home_dir().unwrap()));
        assert!(path.ends_with(".vetreg/vetreg.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }
}
