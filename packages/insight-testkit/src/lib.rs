pub mod fixtures;

mod error;

pub use error::{Error, Result};

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use serde_json::Value;
use tokio::time;

use insight_service::{BoxFuture, DataLoader, LoadError, LoadRequest};

struct Scripted {
	result: Result<Value, LoadError>,
	delay: Option<Duration>,
}

/// Data loader that serves queued responses in the order loads are polled.
///
/// Once the queue runs dry every load succeeds with an empty `results` list.
#[derive(Default)]
pub struct ScriptedLoader {
	responses: Mutex<VecDeque<Scripted>>,
	calls: Mutex<Vec<LoadRequest>>,
}
impl ScriptedLoader {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn respond(&self, body: Value) -> &Self {
		self.push(Scripted { result: Ok(body), delay: None })
	}

	pub fn respond_after(&self, body: Value, delay: Duration) -> &Self {
		self.push(Scripted { result: Ok(body), delay: Some(delay) })
	}

	pub fn fail(&self, error: LoadError) -> &Self {
		self.push(Scripted { result: Err(error), delay: None })
	}

	/// Requests received so far, in call order.
	pub fn calls(&self) -> Vec<LoadRequest> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	fn push(&self, scripted: Scripted) -> &Self {
		self.responses.lock().unwrap_or_else(|err| err.into_inner()).push_back(scripted);

		self
	}
}
impl DataLoader for ScriptedLoader {
	fn load<'a>(&'a self, request: &'a LoadRequest) -> BoxFuture<'a, Result<Value, LoadError>> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).push(request.clone());

		let scripted = self
			.responses
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.pop_front()
			.unwrap_or_else(|| Scripted {
				result: Ok(fixtures::results_response(Value::Array(Vec::new()))),
				delay: None,
			});

		Box::pin(async move {
			if let Some(delay) = scripted.delay {
				time::sleep(delay).await;
			}

			scripted.result
		})
	}
}
