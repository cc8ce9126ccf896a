use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Database configuration, fixed once the database is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Flush automatically after mutations settle (default: true)
	pub auto_save: bool,
	/// Debounce interval before an automatic flush, in milliseconds (default: 1000)
	pub save_timeout_ms: u64,
	/// Write two-space indented JSON instead of compact JSON (default: false)
	pub pretty: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			auto_save: true,
			save_timeout_ms: 1000,
			pretty: false,
		}
	}
}

impl Config {
	pub fn save_timeout(&self) -> Duration {
		Duration::from_millis(self.save_timeout_ms)
	}

	/// Load a JSON config file. Missing fields take their defaults, and a
	/// missing file yields the default config.
	pub fn load_from_path<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
		let path = path.as_ref();
		match std::fs::read_to_string(path) {
			Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
				StoreError::Config(format!("Failed to parse {}: {}", path.display(), e))
			}),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
			Err(e) => Err(StoreError::Io(e)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_defaults() {
		let config = Config::default();
		assert!(config.auto_save);
		assert_eq!(config.save_timeout(), Duration::from_secs(1));
		assert!(!config.pretty);
	}

	#[test]
	fn test_partial_config_file() {
		let mut file = NamedTempFile::new().unwrap();
		write!(file, r#"{{"pretty": true, "save_timeout_ms": 250}}"#).unwrap();

		let config = Config::load_from_path(file.path()).unwrap();
		assert_eq!(
			config,
			Config {
				auto_save: true,
				save_timeout_ms: 250,
				pretty: true,
			}
		);
	}

	#[test]
	fn test_missing_config_file() {
		let dir = tempfile::tempdir().unwrap();
		let config = Config::load_from_path(dir.path().join("filedb.json")).unwrap();
		assert_eq!(config, Config::default());
	}

	#[test]
	fn test_invalid_config_file() {
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "auto_save = false").unwrap();

		assert!(matches!(
			Config::load_from_path(file.path()),
			Err(StoreError::Config(_))
		));
	}
}
