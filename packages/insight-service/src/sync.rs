//! Load coordination for one session.
//!
//! Every issued load carries a fresh [`QueryId`]. Only the most recently issued token may
//! change display state; anything else is dropped on arrival.

use std::{fmt, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, LoadError, Result};
use insight_query::QueryNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QueryId(Uuid);
impl QueryId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for QueryId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for QueryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// A load handed to the data-loading collaborator.
#[derive(Clone, Debug)]
pub struct LoadRequest {
	pub session_key: String,
	pub token: QueryId,
	pub query_hash: String,
	pub query: QueryNode,
}

#[derive(Clone, Debug)]
pub struct LoadOutcome {
	pub token: QueryId,
	pub result: Result<Value, LoadError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadState {
	Idle,
	Loading { token: QueryId },
	/// `token` is `None` when the result was written directly instead of loaded.
	Success { token: Option<QueryId> },
	Error { token: QueryId, error: LoadError },
}

/// A successful response body exactly as the collaborator returned it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawResponse {
	pub query_id: Option<QueryId>,
	pub body: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LoadTiming {
	#[serde(with = "crate::time_serde")]
	pub issued_at: OffsetDateTime,
	pub elapsed_ms: i64,
}

#[derive(Clone, Debug)]
struct InFlight {
	token: QueryId,
	issued_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct ResultSynchronizer {
	session_key: String,
	state: LoadState,
	in_flight: Option<InFlight>,
	last_query_hash: Option<String>,
	response: Option<Arc<RawResponse>>,
	insight_data: Option<Map<String, Value>>,
	timing: Option<LoadTiming>,
}
impl ResultSynchronizer {
	pub fn new(session_key: impl Into<String>) -> Self {
		Self {
			session_key: session_key.into(),
			state: LoadState::Idle,
			in_flight: None,
			last_query_hash: None,
			response: None,
			insight_data: None,
			timing: None,
		}
	}

	pub fn state(&self) -> &LoadState {
		&self.state
	}

	pub fn is_loading(&self) -> bool {
		self.in_flight.is_some()
	}

	pub fn latest_token(&self) -> Option<QueryId> {
		self.in_flight.as_ref().map(|in_flight| in_flight.token)
	}

	/// Last successful response, untouched by reshaping.
	pub fn response(&self) -> Option<&Arc<RawResponse>> {
		self.response.as_ref()
	}

	/// Display-ready data: the raw fields plus a derived `result`.
	pub fn insight_data(&self) -> Option<&Map<String, Value>> {
		self.insight_data.as_ref()
	}

	pub fn result(&self) -> Option<&Value> {
		self.insight_data.as_ref().and_then(|data| data.get("result")).filter(|value| !value.is_null())
	}

	pub fn hogql(&self) -> Option<&str> {
		self.insight_data.as_ref().and_then(extract_hogql)
	}

	pub fn timing(&self) -> Option<LoadTiming> {
		self.timing
	}

	/// Issues a load when `query` differs from the last issued or written one.
	pub fn on_query_changed(&mut self, query: &QueryNode) -> Option<LoadRequest> {
		let query_hash = self.hash_or_fresh(query);

		if self.last_query_hash.as_deref() == Some(query_hash.as_str()) {
			tracing::debug!(
				session = %self.session_key,
				query_hash = %query_hash,
				"Query matches the last load. Skipping."
			);

			return None;
		}

		Some(self.issue(query, query_hash))
	}

	/// Issues a load for `query` unconditionally.
	pub fn refresh(&mut self, query: &QueryNode) -> LoadRequest {
		let query_hash = self.hash_or_fresh(query);

		self.issue(query, query_hash)
	}

	/// Applies a completed load. Returns `false` when the outcome was stale and dropped.
	pub fn apply(&mut self, outcome: LoadOutcome) -> bool {
		let Some(in_flight) = self.in_flight.take_if(|in_flight| in_flight.token == outcome.token)
		else {
			tracing::debug!(
				session = %self.session_key,
				token = %outcome.token,
				"Dropped a stale load response."
			);

			return false;
		};
		let now = OffsetDateTime::now_utc();
		let elapsed_ms = i64::try_from((now - in_flight.issued_at).whole_milliseconds()).unwrap_or(i64::MAX);

		self.timing = Some(LoadTiming { issued_at: in_flight.issued_at, elapsed_ms });

		let body = match outcome.result {
			Ok(Value::Object(body)) => Ok(body),
			Ok(other) => Err(LoadError::MalformedResponse {
				message: format!("Expected a JSON object, got {}.", json_kind(&other)),
			}),
			Err(err) => Err(err),
		};

		match body {
			Ok(body) => {
				self.insight_data = Some(reshape_response(&body));
				self.response = Some(Arc::new(RawResponse { query_id: Some(outcome.token), body }));
				self.state = LoadState::Success { token: Some(outcome.token) };

				tracing::info!(
					session = %self.session_key,
					token = %outcome.token,
					elapsed_ms,
					"Applied insight load."
				);
			},
			Err(error) => {
				tracing::warn!(
					session = %self.session_key,
					token = %outcome.token,
					elapsed_ms,
					error = %error,
					"Insight load failed."
				);

				self.state = LoadState::Error { token: outcome.token, error };
			},
		}

		true
	}

	/// Writes `result` for `query` without loading. Any in-flight load is superseded.
	pub fn write_result(&mut self, query: &QueryNode, result: Value) {
		if let Some(in_flight) = self.in_flight.take() {
			tracing::debug!(
				session = %self.session_key,
				token = %in_flight.token,
				"Superseded an in-flight load with a provided result."
			);
		}

		self.last_query_hash = Some(self.hash_or_fresh(query));
		self.insight_data.get_or_insert_with(Map::new).insert("result".to_string(), result);
		self.state = LoadState::Success { token: None };
	}

	/// Blanks the displayed result while keeping the other response fields.
	pub fn clear_result(&mut self) {
		self.insight_data.get_or_insert_with(Map::new).insert("result".to_string(), Value::Null);
	}

	fn issue(&mut self, query: &QueryNode, query_hash: String) -> LoadRequest {
		let token = QueryId::new();

		if let Some(previous) = &self.in_flight {
			tracing::debug!(
				session = %self.session_key,
				previous = %previous.token,
				token = %token,
				"Superseding an in-flight load."
			);
		}

		self.in_flight = Some(InFlight { token, issued_at: OffsetDateTime::now_utc() });
		self.last_query_hash = Some(query_hash.clone());
		self.state = LoadState::Loading { token };

		tracing::info!(
			session = %self.session_key,
			token = %token,
			query_hash = %query_hash,
			kind = query.kind_name(),
			"Issued insight load."
		);

		LoadRequest { session_key: self.session_key.clone(), token, query_hash, query: query.clone() }
	}

	fn hash_or_fresh(&self, query: &QueryNode) -> String {
		query_hash(query).unwrap_or_else(|err| {
			tracing::warn!(
				session = %self.session_key,
				error = %err,
				"Failed to hash query. Treating it as new."
			);

			Uuid::new_v4().to_string()
		})
	}
}

pub fn query_hash(query: &QueryNode) -> Result<String> {
	let raw = serde_json::to_vec(query).map_err(|err| Error::Encode { label: "query", source: err })?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

/// Copies `results` into `result` unless a non-null `result` is already present.
pub fn reshape_response(body: &Map<String, Value>) -> Map<String, Value> {
	let mut data = body.clone();
	let has_result = body.get("result").is_some_and(|result| !result.is_null());

	if !has_result && let Some(results) = body.get("results") {
		data.insert("result".to_string(), results.clone());
	}

	data
}

/// Non-empty `hogql` string, if any.
pub fn extract_hogql(data: &Map<String, Value>) -> Option<&str> {
	data.get("hogql").and_then(Value::as_str).filter(|hogql| !hogql.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
