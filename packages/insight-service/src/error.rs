use serde::{Deserialize, Serialize};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to decode {label}: {source}")]
	Decode { label: &'static str, source: serde_json::Error },
	#[error("Failed to encode {label}: {source}")]
	Encode { label: &'static str, source: serde_json::Error },
}

/// Failure reported by the data-loading collaborator. Retained as data in the load state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadError {
	#[error("Load timed out after {timeout_ms} ms.")]
	Timeout { timeout_ms: u64 },
	#[error("Query failed: {message}")]
	Query {
		message: String,
		#[serde(default)]
		status: Option<u16>,
	},
	#[error("Malformed response: {message}")]
	MalformedResponse { message: String },
	#[error("Transport error: {message}")]
	Transport { message: String },
}
