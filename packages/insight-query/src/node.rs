use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
	Error, Result,
	filter::{Breakdown, BreakdownType, BreakdownValue, InsightType, Interval, PropertyFilter},
};

/// Query kinds that render as an insight visualization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightNodeKind {
	TrendsQuery,
	FunnelsQuery,
	RetentionQuery,
	PathsQuery,
	StickinessQuery,
	LifecycleQuery,
}
impl InsightNodeKind {
	pub const ALL: [Self; 6] = [
		Self::TrendsQuery,
		Self::FunnelsQuery,
		Self::RetentionQuery,
		Self::PathsQuery,
		Self::StickinessQuery,
		Self::LifecycleQuery,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::TrendsQuery => "TrendsQuery",
			Self::FunnelsQuery => "FunnelsQuery",
			Self::RetentionQuery => "RetentionQuery",
			Self::PathsQuery => "PathsQuery",
			Self::StickinessQuery => "StickinessQuery",
			Self::LifecycleQuery => "LifecycleQuery",
		}
	}

	pub fn insight_type(self) -> InsightType {
		match self {
			Self::TrendsQuery => InsightType::Trends,
			Self::FunnelsQuery => InsightType::Funnels,
			Self::RetentionQuery => InsightType::Retention,
			Self::PathsQuery => InsightType::Paths,
			Self::StickinessQuery => InsightType::Stickiness,
			Self::LifecycleQuery => InsightType::Lifecycle,
		}
	}
}

/// Canonical tagged query tree.
///
/// Anything that does not decode as a known kind is kept verbatim in [`QueryNode::Unsupported`],
/// so it round-trips unchanged and compares structurally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum QueryNode {
	InsightVizNode(InsightVizNode),
	TrendsQuery(TrendsQuery),
	FunnelsQuery(FunnelsQuery),
	RetentionQuery(RetentionQuery),
	PathsQuery(PathsQuery),
	StickinessQuery(StickinessQuery),
	LifecycleQuery(LifecycleQuery),
	HogQLQuery(HogQLQuery),
	EventsQuery(EventsQuery),
	DataTableNode(DataTableNode),
	#[serde(untagged)]
	Unsupported(Value),
}
impl QueryNode {
	pub fn from_value(value: Value) -> Result<Self> {
		serde_json::from_value(value).map_err(|err| Error::Decode { label: "query", source: err })
	}

	pub fn viz(source: QueryNode) -> Self {
		Self::InsightVizNode(InsightVizNode {
			source: Box::new(source),
			full: None,
			embedded: None,
		})
	}

	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::InsightVizNode(_) => "InsightVizNode",
			Self::HogQLQuery(_) => "HogQLQuery",
			Self::EventsQuery(_) => "EventsQuery",
			Self::DataTableNode(_) => "DataTableNode",
			Self::Unsupported(_) => "Unsupported",
			other => other.insight_kind().map(InsightNodeKind::as_str).unwrap_or("Unsupported"),
		}
	}

	pub fn is_insight_viz(&self) -> bool {
		matches!(self, Self::InsightVizNode(_))
	}

	/// Inner `source` of a visualization node.
	pub fn viz_source(&self) -> Option<&QueryNode> {
		match self {
			Self::InsightVizNode(viz) => Some(viz.source.as_ref()),
			_ => None,
		}
	}

	pub fn insight_kind(&self) -> Option<InsightNodeKind> {
		match self {
			Self::TrendsQuery(_) => Some(InsightNodeKind::TrendsQuery),
			Self::FunnelsQuery(_) => Some(InsightNodeKind::FunnelsQuery),
			Self::RetentionQuery(_) => Some(InsightNodeKind::RetentionQuery),
			Self::PathsQuery(_) => Some(InsightNodeKind::PathsQuery),
			Self::StickinessQuery(_) => Some(InsightNodeKind::StickinessQuery),
			Self::LifecycleQuery(_) => Some(InsightNodeKind::LifecycleQuery),
			_ => None,
		}
	}

	pub fn common(&self) -> Option<&InsightCommon> {
		match self {
			Self::TrendsQuery(query) => Some(&query.common),
			Self::FunnelsQuery(query) => Some(&query.common),
			Self::RetentionQuery(query) => Some(&query.common),
			Self::PathsQuery(query) => Some(&query.common),
			Self::StickinessQuery(query) => Some(&query.common),
			Self::LifecycleQuery(query) => Some(&query.common),
			_ => None,
		}
	}

	pub fn common_mut(&mut self) -> Option<&mut InsightCommon> {
		match self {
			Self::TrendsQuery(query) => Some(&mut query.common),
			Self::FunnelsQuery(query) => Some(&mut query.common),
			Self::RetentionQuery(query) => Some(&mut query.common),
			Self::PathsQuery(query) => Some(&mut query.common),
			Self::StickinessQuery(query) => Some(&mut query.common),
			Self::LifecycleQuery(query) => Some(&mut query.common),
			_ => None,
		}
	}

	pub fn breakdown_filter(&self) -> Option<&BreakdownFilter> {
		match self {
			Self::TrendsQuery(query) => query.breakdown_filter.as_ref(),
			Self::FunnelsQuery(query) => query.breakdown_filter.as_ref(),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightVizNode {
	pub source: Box<QueryNode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub full: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedded: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTableNode {
	pub source: Box<QueryNode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub columns: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HogQLQuery {
	pub query: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub values: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventsQuery {
	pub select: Vec<String>,
	#[serde(rename = "where", skip_serializing_if = "Option::is_none")]
	pub where_clauses: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order_by: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub after: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub limit: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date_from: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date_to: Option<String>,
}

/// Fields every insight query carries, flattened into each kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InsightCommon {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date_range: Option<DateRange>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub properties: Option<Vec<PropertyFilter>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter_test_accounts: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub aggregation_group_type_index: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SeriesNode {
	EventsNode(EventsNode),
	ActionsNode(ActionsNode),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsNode {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub event: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub math: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub properties: Option<Vec<PropertyFilter>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionsNode {
	pub id: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub math: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<Vec<PropertyFilter>>,
}

/// Breakdown block of trends and funnels queries. Field names follow the legacy filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakdownFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breakdown: Option<BreakdownValue>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breakdown_type: Option<BreakdownType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breakdown_group_type_index: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breakdown_histogram_bin_count: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breakdown_normalize_url: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breakdowns: Option<Vec<Breakdown>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrendsFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub show_legend: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub compare: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub formula: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FunnelsFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnel_viz_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnel_window_interval: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnel_window_interval_unit: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnel_order_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetentionFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub retention_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub total_intervals: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub period: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathsFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub include_event_types: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub step_limit: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StickinessFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub compare: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifecycleFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub toggled_lifecycles: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrendsQuery {
	#[serde(flatten)]
	pub common: InsightCommon,
	pub series: Vec<SeriesNode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub interval: Option<Interval>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breakdown_filter: Option<BreakdownFilter>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub trends_filter: Option<TrendsFilter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FunnelsQuery {
	#[serde(flatten)]
	pub common: InsightCommon,
	pub series: Vec<SeriesNode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub interval: Option<Interval>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breakdown_filter: Option<BreakdownFilter>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnels_filter: Option<FunnelsFilter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetentionQuery {
	#[serde(flatten)]
	pub common: InsightCommon,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub retention_filter: Option<RetentionFilter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathsQuery {
	#[serde(flatten)]
	pub common: InsightCommon,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paths_filter: Option<PathsFilter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StickinessQuery {
	#[serde(flatten)]
	pub common: InsightCommon,
	pub series: Vec<SeriesNode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub interval: Option<Interval>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stickiness_filter: Option<StickinessFilter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifecycleQuery {
	#[serde(flatten)]
	pub common: InsightCommon,
	pub series: Vec<SeriesNode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub interval: Option<Interval>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub lifecycle_filter: Option<LifecycleFilter>,
}

#[cfg(test)]
mod tests {
	use crate::node::{InsightNodeKind, QueryNode};

	#[test]
	fn decodes_viz_node_with_camel_case_fields() {
		let query = QueryNode::from_value(serde_json::json!({
			"kind": "InsightVizNode",
			"source": {
				"kind": "TrendsQuery",
				"series": [{ "kind": "EventsNode", "event": "$pageview", "math": "total" }],
				"dateRange": { "date_from": "-30d" },
				"filterTestAccounts": true,
				"breakdownFilter": { "breakdown": "$pathname", "breakdown_type": "event" },
			},
		}))
		.expect("query should decode");
		let source = query.viz_source().expect("viz source");

		assert_eq!(source.insight_kind(), Some(InsightNodeKind::TrendsQuery));
		assert_eq!(source.common().and_then(|common| common.filter_test_accounts), Some(true));
		assert!(source.breakdown_filter().is_some());
	}

	#[test]
	fn unknown_kind_keeps_its_payload() {
		let raw = serde_json::json!({ "kind": "ActorsQuery", "select": ["person"], "limit": 50 });
		let query = QueryNode::from_value(raw.clone()).expect("unknown kinds still decode");
		let other = QueryNode::from_value(serde_json::json!({ "kind": "ActorsQuery", "limit": 10 }))
			.expect("unknown kinds still decode");

		assert!(matches!(&query, QueryNode::Unsupported(value) if *value == raw));
		assert_eq!(serde_json::to_value(&query).expect("query should encode"), raw);
		assert_eq!(query, query.clone());
		assert_ne!(query, other);
		assert_eq!(query.kind_name(), "Unsupported");
	}

	#[test]
	fn hogql_queries_compare_structurally() {
		let lhs = serde_json::json!({ "kind": "HogQLQuery", "query": "select 1" });
		let lhs = QueryNode::from_value(lhs).expect("query should decode");
		let rhs = QueryNode::from_value(serde_json::json!({ "kind": "HogQLQuery", "query": "select 2" }))
			.expect("query should decode");

		assert_eq!(lhs, lhs.clone());
		assert_ne!(lhs, rhs);
		assert_eq!(lhs.kind_name(), "HogQLQuery");
	}
}
