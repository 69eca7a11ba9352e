//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`config.toml` in the platform config dir, or `--config`)
//! 3. Environment variables prefixed with `LINKSYNC_`
//! 4. CLI flags, applied by the caller through [`Config::apply_sync_args`]
//!    or [`Config::apply_scan_args`]

use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{ScanArgs, SyncArgs};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plan only; never write to the destination.
    pub dry_run: bool,
    /// Follow symlinks when enumerating and when checking the destination.
    pub follow_symlinks: bool,
    /// Recreate source hard links on the destination.
    pub preserve_hard_links: bool,
    /// Show a progress bar while copying.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dry_run: false,
            follow_symlinks: false,
            preserve_hard_links: true,
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from defaults, the config file and environment.
    ///
    /// `explicit` overrides the platform-specific file location. A missing
    /// default file is not an error; a missing explicit file is.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or any layer fails
    /// to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::config_path() {
                    log::debug!("Looking for config at {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        let config = figment
            .merge(Env::prefixed("LINKSYNC_").ignore(&["config"]))
            .extract()?;
        Ok(config)
    }

    /// Apply command-line overrides for a sync run.
    ///
    /// Flags only ever switch behavior on; absent flags keep the loaded value.
    pub fn apply_sync_args(&mut self, args: &SyncArgs) {
        if args.dry_run {
            self.dry_run = true;
        }
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
        if args.no_hard_links {
            self.preserve_hard_links = false;
        }
        if args.no_progress {
            self.progress = false;
        }
    }

    /// Apply command-line overrides for a scan.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "linksync", "linksync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_args() -> SyncArgs {
        SyncArgs {
            source: PathBuf::from("/src"),
            dest: PathBuf::from("/dst"),
            dry_run: false,
            no_hard_links: false,
            follow_symlinks: false,
            skip_hidden: false,
            no_progress: false,
            output: crate::cli::OutputFormat::Text,
        }
    }

    #[test]
    fn test_scan_keeps_configured_follow_symlinks() {
        let mut args = ScanArgs {
            source: PathBuf::from("/src"),
            output: crate::cli::OutputFormat::Text,
            follow_symlinks: false,
            skip_hidden: false,
        };
        let mut config = Config {
            follow_symlinks: true,
            ..Config::default()
        };
        config.apply_scan_args(&args);
        assert!(config.follow_symlinks);

        let mut config = Config::default();
        config.apply_scan_args(&args);
        assert!(!config.follow_symlinks);

        args.follow_symlinks = true;
        config.apply_scan_args(&args);
        assert!(config.follow_symlinks);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.dry_run);
        assert!(!config.follow_symlinks);
        assert!(config.preserve_hard_links);
        assert!(config.progress);
    }

    #[test]
    fn test_apply_sync_args_overrides() {
        let mut config = Config::default();
        let args = SyncArgs {
            dry_run: true,
            no_hard_links: true,
            no_progress: true,
            ..sync_args()
        };
        config.apply_sync_args(&args);

        assert!(config.dry_run);
        assert!(!config.preserve_hard_links);
        assert!(!config.progress);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_apply_sync_args_keeps_loaded_values() {
        let mut config = Config {
            dry_run: true,
            ..Config::default()
        };
        config.apply_sync_args(&sync_args());
        assert!(config.dry_run);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
