//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::catalog::Catalog;

/// Kiosk configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Prefix for clip references in the built-in catalog
    pub media_root: String,

    /// Optional JSON catalog replacing the built-in one
    pub catalog_path: Option<PathBuf>,

    /// Clip length used by the headless surface
    pub clip_length: Duration,

    /// Whether the session starts muted
    pub start_muted: bool,

    /// Read submissions from stdin
    pub console: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = match lookup("KIOSK_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME").context("HOME is not set")?;
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("kiosk-assistant")
            }
        };

        let socket_path = lookup("KIOSK_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("kiosk.sock"));

        let clip_secs = match lookup("KIOSK_CLIP_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("invalid KIOSK_CLIP_SECS: {raw:?}"))?,
            None => 3,
        };

        Ok(Self {
            socket_path,
            data_dir,
            media_root: lookup("KIOSK_MEDIA_ROOT").unwrap_or_else(|| "/videos".to_string()),
            catalog_path: lookup("KIOSK_CATALOG").map(PathBuf::from),
            clip_length: Duration::from_secs(clip_secs),
            start_muted: !flag(lookup("KIOSK_UNMUTED")),
            console: flag(lookup("KIOSK_CONSOLE")),
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Build the media catalog, from file if one is configured
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_file(path)
                .with_context(|| format!("failed to load catalog from {}", path.display())),
            None => Catalog::builtin(&self.media_root).context("failed to build built-in catalog"),
        }
    }
}

fn flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes")
    )
}
