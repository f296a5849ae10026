mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, FeatureFlags, Loader, QUERY_BASED_DASHBOARD_CARDS, Service, Workspace};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.loader.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "loader.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for name in cfg.feature_flags.names() {
		if name.trim().is_empty() {
			return Err(Error::Validation {
				message: "feature_flags keys must be non-empty.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.service.log_level.trim();

	if trimmed.len() != cfg.service.log_level.len() {
		cfg.service.log_level = trimmed.to_string();
	}
}
