use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::backend::Backend;
use crate::local_backend::{self, LocalBackend};
use crate::persist::LocalStore;
use crate::remote::HttpBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Http,
    Local,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_mode: BackendMode,
    pub backend_url: String,
    pub backend_db: Option<PathBuf>,
    pub store_path: Option<PathBuf>,
    pub request_timeout: Duration,
    /// How long the live view waits for innings setup before offering
    /// manual recovery.
    pub setup_timeout: Duration,
    pub match_poll: Duration,
}

impl Config {
    /// Reads `.env.local`, then `.env`, then the process environment.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let backend_mode = match env::var("BACKEND_MODE")
            .unwrap_or_else(|_| "local".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "http" | "remote" => BackendMode::Http,
            _ => BackendMode::Local,
        };
        Self {
            backend_mode,
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:4943".to_string()),
            backend_db: opt_path_env("BACKEND_DB").or_else(local_backend::default_db_path),
            store_path: opt_path_env("STORE_PATH"),
            request_timeout: Duration::from_secs(secs_env("REQUEST_TIMEOUT_SECS", 10, 1, 120)),
            setup_timeout: Duration::from_secs(secs_env("SETUP_TIMEOUT_SECS", 10, 2, 120)),
            match_poll: Duration::from_secs(secs_env("MATCH_POLL_SECS", 15, 5, 600)),
        }
    }

    pub fn open_backend(&self) -> Result<Box<dyn Backend>> {
        match self.backend_mode {
            BackendMode::Http => Ok(Box::new(HttpBackend::new(
                &self.backend_url,
                self.request_timeout,
            )?)),
            BackendMode::Local => {
                let path = self
                    .backend_db
                    .clone()
                    .context("unable to resolve sqlite path")?;
                Ok(Box::new(LocalBackend::open(&path)?))
            }
        }
    }

    pub fn open_store(&self) -> LocalStore {
        match &self.store_path {
            Some(path) => LocalStore::at(path.clone()),
            None => LocalStore::default_location(),
        }
    }
}

fn secs_env(key: &str, default: u64, min: u64, max: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn opt_path_env(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
        .map(PathBuf::from)
}
