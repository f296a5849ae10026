//! Per-view query state.
//!
//! The effective query is never stored. It is resolved on every read from four independent
//! branches in a fixed priority order, and no read combines fields from two branches.

use std::borrow::Cow;

use serde::Serialize;

use crate::{
	export::{self, ExportContext},
	insight::Insight,
};
use insight_config::Workspace;
use insight_query::{QueryNode, SavedQuery};

/// Branch that produced the current query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
	Props,
	UserEdit,
	LoadedInsight,
	Default,
}

#[derive(Clone, Debug)]
pub struct InsightSession {
	key: String,
	workspace: Workspace,
	props_query: Option<QueryNode>,
	user_query: Option<QueryNode>,
	loaded_query: Option<QueryNode>,
	insight: Insight,
	saved: Option<Insight>,
	show_query_editor: bool,
}
impl InsightSession {
	pub fn new(key: impl Into<String>, workspace: Workspace) -> Self {
		Self {
			key: key.into(),
			workspace,
			props_query: None,
			user_query: None,
			loaded_query: None,
			insight: Insight::default(),
			saved: None,
			show_query_editor: false,
		}
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn workspace(&self) -> Workspace {
		self.workspace
	}

	pub fn insight(&self) -> &Insight {
		&self.insight
	}

	pub fn saved(&self) -> Option<&Insight> {
		self.saved.as_ref()
	}

	pub fn show_query_editor(&self) -> bool {
		self.show_query_editor
	}

	pub fn resolved_source(&self) -> QuerySource {
		if self.props_query.is_some() {
			QuerySource::Props
		} else if self.user_query.is_some() {
			QuerySource::UserEdit
		} else if self.loaded_query.is_some() {
			QuerySource::LoadedInsight
		} else {
			QuerySource::Default
		}
	}

	/// Effective query: props override, then the user edit, then the loaded insight's own
	/// query, then the default for the insight's kind.
	pub fn current_query(&self) -> Cow<'_, QueryNode> {
		let branch = match self.resolved_source() {
			QuerySource::Props => self.props_query.as_ref(),
			QuerySource::UserEdit => self.user_query.as_ref(),
			QuerySource::LoadedInsight => self.loaded_query.as_ref(),
			QuerySource::Default => None,
		};

		match branch {
			Some(query) => Cow::Borrowed(query),
			None => Cow::Owned(insight_query::query_from_kind(
				self.insight.default_kind(),
				self.workspace.filter_test_accounts_default,
			)),
		}
	}

	/// Replaces the user-edit branch. Returns whether the current query changed.
	pub fn set_query(&mut self, query: Option<QueryNode>) -> bool {
		self.update(|session| session.user_query = query)
	}

	/// Adopts a freshly loaded insight and makes it the saved baseline.
	pub fn on_insight_loaded(&mut self, insight: Insight) -> bool {
		self.update(|session| {
			session.loaded_query = insight.own_query();
			session.saved = Some(insight.clone());
			session.insight = insight;
		})
	}

	/// Replaces the baseline after a successful save.
	pub fn on_insight_saved(&mut self, insight: Insight) -> bool {
		self.update(|session| {
			session.saved = Some(insight.clone());
			session.insight = insight;
		})
	}

	/// Re-synchronizes the props branch. A query deeply equal to the current one is ignored.
	pub fn on_external_props_query_changed(&mut self, query: Option<QueryNode>) -> bool {
		if query.as_ref() == Some(self.current_query().as_ref()) {
			return false;
		}

		self.update(|session| session.props_query = query)
	}

	/// Applies an insight pushed into the editor.
	///
	/// With `override_filter` and no query on the insight, the cleaned filters become the user
	/// edit. Otherwise a present query does.
	pub fn apply_insight(&mut self, insight: &Insight, override_filter: bool) -> bool {
		let team_default = Some(self.workspace.test_account_filters_default_checked);

		self.update(|session| {
			if override_filter && insight.query.is_none() {
				let filters = insight.filters.clone().unwrap_or_default();
				let cleaned = insight_query::clean_filters(&filters, team_default);

				session.user_query = Some(insight_query::query_from_filters(&cleaned));
			} else if let Some(query) = &insight.query {
				session.user_query = Some(query.clone());
			}

			session.insight = Insight { result: None, ..insight.clone() };
		})
	}

	/// Resets the user edit to the saved filters' query, or clears it.
	pub fn revert(&mut self) -> bool {
		let reverted = self
			.saved
			.as_ref()
			.and_then(|saved| saved.filters.as_ref())
			.map(insight_query::query_from_filters);

		self.update(|session| session.user_query = reverted)
	}

	pub fn toggle_query_editor(&mut self) -> bool {
		self.show_query_editor = !self.show_query_editor;

		self.show_query_editor
	}

	/// Whether the current query differs materially from the saved baseline.
	pub fn query_changed(&self) -> bool {
		let current = self.current_query();
		let saved = self.saved.as_ref().and_then(|saved| match (&saved.query, &saved.filters) {
			(Some(query), _) => Some(SavedQuery::Query(query)),
			(None, Some(filters)) if !filters.is_empty() => Some(SavedQuery::Filters(filters)),
			_ => None,
		});

		insight_query::query_changed(
			Some(current.as_ref()),
			saved,
			Some(self.workspace.test_account_filters_default_checked),
		)
	}

	pub fn export_context(&self) -> Option<ExportContext> {
		export::export_context(Some(self.current_query().as_ref()), &self.insight)
	}

	fn update(&mut self, apply: impl FnOnce(&mut Self)) -> bool {
		let before = self.current_query().into_owned();

		apply(self);

		*self.current_query() != before
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		insight::Insight,
		session::{InsightSession, QuerySource},
	};
	use insight_config::Workspace;
	use insight_query::InsightNodeKind;

	#[test]
	fn toggling_the_editor_flips_state() {
		let mut session = InsightSession::new("new", Workspace::default());

		assert!(session.toggle_query_editor());
		assert!(!session.toggle_query_editor());
	}

	#[test]
	fn loaded_filters_pick_the_default_kind_when_empty() {
		let mut session = InsightSession::new("abc", Workspace::default());
		let insight = Insight::from_value(serde_json::json!({ "filters": {} }))
			.expect("insight should decode");

		assert!(!session.on_insight_loaded(insight));
		assert_eq!(session.resolved_source(), QuerySource::Default);
		assert_eq!(
			session.current_query().viz_source().and_then(|source| source.insight_kind()),
			Some(InsightNodeKind::TrendsQuery)
		);
	}

	#[test]
	fn deeply_equal_props_query_is_ignored() {
		let mut session = InsightSession::new("new-AdHoc.x", Workspace::default());
		let current = session.current_query().into_owned();

		assert!(!session.on_external_props_query_changed(Some(current)));
		assert_eq!(session.resolved_source(), QuerySource::Default);
	}
}
