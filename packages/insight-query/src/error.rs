pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to decode {label}: {source}")]
	Decode { label: &'static str, source: serde_json::Error },
}
