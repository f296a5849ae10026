pub mod export;
pub mod insight;
pub mod session;
pub mod sync;

mod error;
mod time_serde;

pub use error::{Error, LoadError, Result};
pub use export::{ExportContext, ExportFormat};
pub use insight::{Insight, InsightProps};
pub use session::{InsightSession, QuerySource};
pub use sync::{
	LoadOutcome, LoadRequest, LoadState, LoadTiming, QueryId, RawResponse, ResultSynchronizer,
};

use std::{borrow::Cow, future::Future, pin::Pin, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};

use insight_config::{Config, FeatureFlags, QUERY_BASED_DASHBOARD_CARDS, Workspace};
use insight_query::QueryNode;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Executes insight queries. Timeouts and retries belong to the implementation.
pub trait DataLoader
where
	Self: Send + Sync,
{
	fn load<'a>(&'a self, request: &'a LoadRequest) -> BoxFuture<'a, Result<Value, LoadError>>;
}

/// An issued load whose outcome has not been applied yet.
pub struct PendingLoad {
	pub token: QueryId,
	future: BoxFuture<'static, LoadOutcome>,
}
impl PendingLoad {
	pub async fn complete(self) -> LoadOutcome {
		self.future.await
	}
}

impl std::fmt::Debug for PendingLoad {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PendingLoad").field("token", &self.token).finish_non_exhaustive()
	}
}

/// Serializable view of an editor's state.
#[derive(Clone, Debug, Serialize)]
pub struct EditorSnapshot {
	pub session_key: String,
	pub query_source: QuerySource,
	pub current_query: QueryNode,
	pub query_changed: bool,
	pub changed_since_saved: bool,
	pub load_state: LoadState,
	pub insight_data: Option<Map<String, Value>>,
	pub hogql: Option<String>,
	pub timing: Option<LoadTiming>,
	pub export: Option<ExportContext>,
	pub show_query_editor: bool,
	pub use_query_dashboard_cards: bool,
}

/// One mounted insight view: query state, result synchronization and the loader they drive.
///
/// Operations that may change the current query return the load they issued, if any. The caller
/// completes it and hands the outcome back through [`InsightEditor::apply`].
pub struct InsightEditor {
	session: InsightSession,
	sync: ResultSynchronizer,
	feature_flags: FeatureFlags,
	loader: Arc<dyn DataLoader>,
	cached_query: Option<QueryNode>,
}
impl InsightEditor {
	pub fn new(
		props: &InsightProps,
		workspace: Workspace,
		feature_flags: FeatureFlags,
		loader: Arc<dyn DataLoader>,
	) -> Self {
		let key = props.session_key();

		Self {
			session: InsightSession::new(key.clone(), workspace),
			sync: ResultSynchronizer::new(key),
			feature_flags,
			loader,
			cached_query: None,
		}
	}

	pub fn from_config(config: &Config, props: &InsightProps, loader: Arc<dyn DataLoader>) -> Self {
		Self::new(props, config.workspace, config.feature_flags.clone(), loader)
	}

	/// Seeds the session from the view's props and issues the first load.
	///
	/// A cached insight that bundles its result is displayed without loading.
	pub fn mount(&mut self, props: &InsightProps) -> Option<PendingLoad> {
		let bundled = props.cached_insight.as_ref().and_then(|insight| insight.result.clone());

		self.cached_query = props.cached_query().cloned();

		if let Some(insight) = props.cached_insight.clone() {
			self.session.on_insight_loaded(insight);
		}
		if let Some(query) = props.props_query() {
			self.session.on_external_props_query_changed(Some(query.clone()));
		}

		match bundled {
			Some(result) if self.session.resolved_source() != QuerySource::Props => {
				self.write_result(result);

				None
			},
			_ => self.sync(),
		}
	}

	pub fn session(&self) -> &InsightSession {
		&self.session
	}

	pub fn synchronizer(&self) -> &ResultSynchronizer {
		&self.sync
	}

	pub fn set_query(&mut self, query: Option<QueryNode>) -> Option<PendingLoad> {
		self.session.set_query(query);

		self.sync()
	}

	/// Adopts a loaded insight. A bundled result short-circuits the load.
	pub fn on_insight_loaded(&mut self, insight: Insight) -> Option<PendingLoad> {
		let bundled = insight.result.clone();

		self.session.on_insight_loaded(insight);

		match bundled {
			Some(result) => {
				self.write_result(result);

				None
			},
			None => self.sync(),
		}
	}

	pub fn on_insight_saved(&mut self, insight: Insight) -> Option<PendingLoad> {
		self.session.on_insight_saved(insight);

		self.sync()
	}

	/// Re-synchronizes with re-rendered props.
	///
	/// The ad-hoc query goes to the props branch. A cached insight query that differs from the one
	/// last seen becomes a user edit, so later edits still take effect.
	pub fn on_props_changed(&mut self, props: &InsightProps) -> Option<PendingLoad> {
		let mut changed =
			self.session.on_external_props_query_changed(props.props_query().cloned());

		if let Some(query) = props.cached_query()
			&& self.cached_query.as_ref() != Some(query)
		{
			self.cached_query = Some(query.clone());
			changed |= self.session.set_query(Some(query.clone()));
		}
		if !changed {
			return None;
		}

		self.sync()
	}

	pub fn on_external_props_query_changed(
		&mut self,
		query: Option<QueryNode>,
	) -> Option<PendingLoad> {
		if !self.session.on_external_props_query_changed(query) {
			return None;
		}

		self.sync()
	}

	pub fn apply_insight(&mut self, insight: &Insight, override_filter: bool) -> Option<PendingLoad> {
		self.session.apply_insight(insight, override_filter);

		match insight.result.clone() {
			Some(result) => {
				self.write_result(result);

				None
			},
			None => self.sync(),
		}
	}

	/// Discards edits and restores the saved result, loading only when none was saved.
	pub fn revert(&mut self) -> Option<PendingLoad> {
		let saved_result = self.session.saved().and_then(|saved| saved.result.clone());

		self.session.revert();

		match saved_result {
			Some(result) => {
				self.write_result(result);

				None
			},
			None => {
				self.sync.clear_result();

				self.sync()
			},
		}
	}

	pub fn refresh(&mut self) -> PendingLoad {
		let request = self.sync.refresh(&self.session.current_query());

		self.dispatch(request)
	}

	pub fn toggle_query_editor(&mut self) -> bool {
		self.session.toggle_query_editor()
	}

	/// Applies a completed load. Returns `false` for stale outcomes.
	pub fn apply(&mut self, outcome: LoadOutcome) -> bool {
		self.sync.apply(outcome)
	}

	pub async fn settle(&mut self, pending: PendingLoad) -> bool {
		let outcome = pending.complete().await;

		self.apply(outcome)
	}

	pub fn current_query(&self) -> Cow<'_, QueryNode> {
		self.session.current_query()
	}

	pub fn query_changed(&self) -> bool {
		self.session.query_changed()
	}

	/// Unsaved-changes signal: the query differs from the baseline and no load is in flight.
	pub fn changed_since_saved(&self) -> bool {
		!self.sync.is_loading() && self.session.query_changed()
	}

	pub fn insight_data(&self) -> Option<&Map<String, Value>> {
		self.sync.insight_data()
	}

	pub fn result(&self) -> Option<&Value> {
		self.sync.result()
	}

	pub fn hogql(&self) -> Option<&str> {
		self.sync.hogql()
	}

	pub fn load_state(&self) -> &LoadState {
		self.sync.state()
	}

	pub fn export_context(&self) -> Option<ExportContext> {
		self.session.export_context()
	}

	pub fn show_query_editor(&self) -> bool {
		self.session.show_query_editor()
	}

	pub fn use_query_dashboard_cards(&self) -> bool {
		self.feature_flags.is_enabled(QUERY_BASED_DASHBOARD_CARDS)
	}

	pub fn snapshot(&self) -> EditorSnapshot {
		EditorSnapshot {
			session_key: self.session.key().to_string(),
			query_source: self.session.resolved_source(),
			current_query: self.current_query().into_owned(),
			query_changed: self.query_changed(),
			changed_since_saved: self.changed_since_saved(),
			load_state: self.load_state().clone(),
			insight_data: self.insight_data().cloned(),
			hogql: self.hogql().map(str::to_string),
			timing: self.sync.timing(),
			export: self.export_context(),
			show_query_editor: self.show_query_editor(),
			use_query_dashboard_cards: self.use_query_dashboard_cards(),
		}
	}

	fn sync(&mut self) -> Option<PendingLoad> {
		let request = self.sync.on_query_changed(&self.session.current_query())?;

		Some(self.dispatch(request))
	}

	fn write_result(&mut self, result: Value) {
		let query = self.session.current_query().into_owned();

		self.sync.write_result(&query, result);
	}

	fn dispatch(&self, request: LoadRequest) -> PendingLoad {
		let loader = Arc::clone(&self.loader);
		let token = request.token;
		let future = Box::pin(async move {
			let result = loader.load(&request).await;

			LoadOutcome { token, result }
		});

		PendingLoad { token, future }
	}
}
