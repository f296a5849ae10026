use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, node::InsightNodeKind};

/// Legacy `insight` tag. Unknown tags are preserved so conversion can fall back instead of
/// failing to decode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InsightType {
	Trends,
	Funnels,
	Retention,
	Paths,
	Stickiness,
	Lifecycle,
	Other(String),
}
impl InsightType {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Trends => "TRENDS",
			Self::Funnels => "FUNNELS",
			Self::Retention => "RETENTION",
			Self::Paths => "PATHS",
			Self::Stickiness => "STICKINESS",
			Self::Lifecycle => "LIFECYCLE",
			Self::Other(raw) => raw.as_str(),
		}
	}

	pub fn node_kind(&self) -> Option<InsightNodeKind> {
		match self {
			Self::Trends => Some(InsightNodeKind::TrendsQuery),
			Self::Funnels => Some(InsightNodeKind::FunnelsQuery),
			Self::Retention => Some(InsightNodeKind::RetentionQuery),
			Self::Paths => Some(InsightNodeKind::PathsQuery),
			Self::Stickiness => Some(InsightNodeKind::StickinessQuery),
			Self::Lifecycle => Some(InsightNodeKind::LifecycleQuery),
			Self::Other(_) => None,
		}
	}
}

impl From<String> for InsightType {
	fn from(raw: String) -> Self {
		match raw.as_str() {
			"TRENDS" => Self::Trends,
			"FUNNELS" => Self::Funnels,
			"RETENTION" => Self::Retention,
			"PATHS" => Self::Paths,
			"STICKINESS" => Self::Stickiness,
			"LIFECYCLE" => Self::Lifecycle,
			_ => Self::Other(raw),
		}
	}
}

impl From<InsightType> for String {
	fn from(insight: InsightType) -> Self {
		match insight {
			InsightType::Other(raw) => raw,
			known => known.as_str().to_string(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
	Minute,
	Hour,
	Day,
	Week,
	Month,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownType {
	Event,
	Person,
	Cohort,
	Group,
	Session,
	Hogql,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CohortRef {
	Id(i64),
	Named(String),
}

/// The legacy `breakdown` field: a property name, a single cohort id, or a cohort list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BreakdownValue {
	Property(String),
	Cohort(i64),
	List(Vec<CohortRef>),
}

/// One entry of a multi-value breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
	pub property: String,
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub breakdown_type: Option<BreakdownType>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub group_type_index: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub normalize_url: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
	Number(i64),
	Name(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<EntityId>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub math: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub properties: Option<Vec<PropertyFilter>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
	pub key: String,
	#[serde(default)]
	pub value: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operator: Option<String>,
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub property_type: Option<String>,
}

/// Flat legacy representation of an insight's parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterObject {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub insight: Option<InsightType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date_from: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date_to: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub interval: Option<Interval>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub events: Option<Vec<EntityFilter>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub actions: Option<Vec<EntityFilter>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub properties: Option<Vec<PropertyFilter>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter_test_accounts: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub aggregation_group_type_index: Option<u32>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub display: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub show_legend: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub compare: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub formula: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnel_viz_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnel_window_interval: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnel_window_interval_unit: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub funnel_order_type: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub retention_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub total_intervals: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub period: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub include_event_types: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub step_limit: Option<u32>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub toggled_lifecycles: Option<Vec<String>>,

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
impl FilterObject {
	pub fn from_value(value: Value) -> Result<Self> {
		serde_json::from_value(value).map_err(|err| Error::Decode { label: "filters", source: err })
	}

	/// True when no field is set, i.e. the legacy `{}`.
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}

	pub fn has_breakdown(&self) -> bool {
		self.breakdown.is_some() || self.breakdowns.as_ref().is_some_and(|list| !list.is_empty())
	}
}

#[cfg(test)]
mod tests {
	use crate::filter::{BreakdownValue, CohortRef, FilterObject, InsightType};

	#[test]
	fn unknown_insight_tag_survives_decoding() {
		let filters =
			FilterObject::from_value(serde_json::json!({ "insight": "SESSIONS", "interval": "day" }))
				.expect("filters should decode");

		assert_eq!(filters.insight, Some(InsightType::Other("SESSIONS".to_string())));
		assert_eq!(
			serde_json::to_value(&filters).expect("filters should encode")["insight"],
			"SESSIONS"
		);
	}

	#[test]
	fn breakdown_value_shapes_decode() {
		let property = FilterObject::from_value(serde_json::json!({ "breakdown": "$browser" }))
			.expect("filters should decode");
		let cohort = FilterObject::from_value(serde_json::json!({ "breakdown": 7 }))
			.expect("filters should decode");
		let cohorts = FilterObject::from_value(serde_json::json!({ "breakdown": ["all", 3] }))
			.expect("filters should decode");

		assert_eq!(property.breakdown, Some(BreakdownValue::Property("$browser".to_string())));
		assert_eq!(cohort.breakdown, Some(BreakdownValue::Cohort(7)));
		assert_eq!(
			cohorts.breakdown,
			Some(BreakdownValue::List(vec![CohortRef::Named("all".to_string()), CohortRef::Id(3)]))
		);
	}

	#[test]
	fn empty_object_is_empty() {
		let filters =
			FilterObject::from_value(serde_json::json!({})).expect("filters should decode");

		assert!(filters.is_empty());
		assert!(!filters.has_breakdown());
	}
}
