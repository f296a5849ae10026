use std::{collections::VecDeque, sync::Mutex, time::Duration};

use serde::Deserialize;
use serde_json::Value;
use tokio::time;

use insight_service::{BoxFuture, DataLoader, LoadError, LoadRequest};

/// One scripted reply, consumed in the order loads are delivered.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixtureResponse {
	Ok {
		body: Value,
		#[serde(default)]
		delay_ms: u64,
	},
	Error {
		error: LoadError,
	},
}

/// Serves scenario responses, bounded by the configured loader timeout.
pub struct FixtureLoader {
	responses: Mutex<VecDeque<FixtureResponse>>,
	timeout_ms: u64,
}
impl FixtureLoader {
	pub fn new(responses: Vec<FixtureResponse>, timeout_ms: u64) -> Self {
		Self { responses: Mutex::new(responses.into()), timeout_ms }
	}

	pub fn remaining(&self) -> usize {
		self.responses.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}
impl DataLoader for FixtureLoader {
	fn load<'a>(&'a self, request: &'a LoadRequest) -> BoxFuture<'a, Result<Value, LoadError>> {
		let next = self.responses.lock().unwrap_or_else(|err| err.into_inner()).pop_front();
		let timeout_ms = self.timeout_ms;

		Box::pin(async move {
			let Some(next) = next else {
				return Err(LoadError::Transport {
					message: format!("No scripted response left for load {}.", request.token),
				});
			};

			match next {
				FixtureResponse::Ok { body, delay_ms } => {
					let delayed = async {
						time::sleep(Duration::from_millis(delay_ms)).await;

						body
					};

					time::timeout(Duration::from_millis(timeout_ms), delayed)
						.await
						.map_err(|_| LoadError::Timeout { timeout_ms })
				},
				FixtureResponse::Error { error } => Err(error),
			}
		})
	}
}
