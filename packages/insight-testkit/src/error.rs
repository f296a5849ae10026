pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Query(#[from] insight_query::Error),

	#[error(transparent)]
	Service(#[from] insight_service::Error),
}
