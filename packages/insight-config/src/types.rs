use std::collections::BTreeMap;

use serde::Deserialize;

pub const QUERY_BASED_DASHBOARD_CARDS: &str = "query-based-dashboard-cards";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub workspace: Workspace,
	#[serde(default)]
	pub feature_flags: FeatureFlags,
	pub loader: Loader,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

/// Workspace-wide defaults consumed by default construction and change detection.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Workspace {
	/// User-level default applied when constructing a fresh query for a kind.
	#[serde(default)]
	pub filter_test_accounts_default: bool,
	/// Team-level default applied to the baseline of a brand-new insight.
	#[serde(default)]
	pub test_account_filters_default_checked: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FeatureFlags(BTreeMap<String, bool>);
impl FeatureFlags {
	pub fn new(flags: impl IntoIterator<Item = (String, bool)>) -> Self {
		Self(flags.into_iter().collect())
	}

	pub fn is_enabled(&self, name: &str) -> bool {
		self.0.get(name).copied().unwrap_or(false)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Loader {
	pub timeout_ms: u64,
}
