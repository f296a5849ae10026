use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};
use insight_query::{FilterObject, InsightNodeKind, QueryNode};

pub const NEW_INSIGHT_KEY: &str = "new";
pub const AD_HOC_PREFIX: &str = "new-AdHoc.";

/// A persisted or ad-hoc insight as the persistence collaborator hands it over.
///
/// A JSON `null` result decodes as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insight {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub short_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub derived_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filters: Option<FilterObject>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub query: Option<QueryNode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
}
impl Insight {
	pub fn from_value(value: Value) -> Result<Self> {
		serde_json::from_value(value).map_err(|err| Error::Decode { label: "insight", source: err })
	}

	/// User name, else the generated name. Empty names count as unset.
	pub fn display_name(&self) -> Option<&str> {
		[self.name.as_deref(), self.derived_name.as_deref()]
			.into_iter()
			.flatten()
			.find(|name| !name.is_empty())
	}

	/// The insight's own query: the stored query, else its non-empty filters converted.
	pub fn own_query(&self) -> Option<QueryNode> {
		if let Some(query) = &self.query {
			return Some(query.clone());
		}

		self.filters
			.as_ref()
			.filter(|filters| !filters.is_empty())
			.map(insight_query::query_from_filters)
	}

	/// Insight kind used when no query branch is set.
	pub fn default_kind(&self) -> InsightNodeKind {
		self.filters
			.as_ref()
			.and_then(|filters| filters.insight.as_ref())
			.and_then(|insight| insight.node_kind())
			.unwrap_or(InsightNodeKind::TrendsQuery)
	}
}

/// What the owning view hands the editor.
#[derive(Clone, Debug, Default)]
pub struct InsightProps {
	pub dashboard_item_id: Option<String>,
	pub cached_insight: Option<Insight>,
	pub query: Option<QueryNode>,
}
impl InsightProps {
	pub fn session_key(&self) -> String {
		self.dashboard_item_id.clone().unwrap_or_else(|| NEW_INSIGHT_KEY.to_string())
	}

	pub fn is_ad_hoc(&self) -> bool {
		self.dashboard_item_id.as_deref().is_some_and(|id| id.starts_with(AD_HOC_PREFIX))
	}

	/// Explicit query override. Only standalone ad-hoc views carry one.
	pub fn props_query(&self) -> Option<&QueryNode> {
		if self.is_ad_hoc() { self.query.as_ref() } else { None }
	}

	pub fn cached_query(&self) -> Option<&QueryNode> {
		self.cached_insight.as_ref().and_then(|insight| insight.query.as_ref())
	}
}
