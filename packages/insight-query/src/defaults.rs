use std::{collections::HashMap, sync::LazyLock};

use crate::{
	filter::{InsightType, Interval},
	node::{
		EventsNode, FunnelsFilter, FunnelsQuery, InsightNodeKind, LifecycleFilter, LifecycleQuery,
		PathsFilter, PathsQuery, QueryNode, RetentionFilter, RetentionQuery, SeriesNode,
		StickinessFilter, StickinessQuery, TrendsFilter, TrendsQuery,
	},
};

pub const DEFAULT_EVENT: &str = "$pageview";
pub const DEFAULT_MATH: &str = "total";
pub const DEFAULT_DATE_FROM: &str = "-7d";
pub const DEFAULT_INTERVAL: Interval = Interval::Day;
pub const DEFAULT_DISPLAY: &str = "ActionsLineGraph";
pub const DEFAULT_FUNNEL_VIZ_TYPE: &str = "steps";
pub const DEFAULT_FUNNEL_WINDOW_INTERVAL: u32 = 14;
pub const DEFAULT_FUNNEL_WINDOW_INTERVAL_UNIT: &str = "day";
pub const DEFAULT_FUNNEL_ORDER_TYPE: &str = "ordered";
pub const DEFAULT_RETENTION_TYPE: &str = "retention_first_time";
pub const DEFAULT_TOTAL_INTERVALS: u32 = 11;
pub const DEFAULT_RETENTION_PERIOD: &str = "Day";
pub const DEFAULT_PATHS_STEP_LIMIT: u32 = 5;

static DEFAULT_QUERIES: LazyLock<HashMap<InsightNodeKind, QueryNode>> = LazyLock::new(|| {
	InsightNodeKind::ALL.into_iter().map(|kind| (kind, build_default(kind))).collect()
});

/// Default `source` query for `kind`.
pub fn default_query_for_kind(kind: InsightNodeKind) -> &'static QueryNode {
	&DEFAULT_QUERIES[&kind]
}

/// Default `source` query for a legacy insight tag. Unknown tags resolve to trends.
pub fn default_query_for_insight(insight: &InsightType) -> &'static QueryNode {
	default_query_for_kind(insight.node_kind().unwrap_or(InsightNodeKind::TrendsQuery))
}

/// Visualization-wrapped default for `kind`, with test accounts filtered when the user default
/// asks for it.
pub fn query_from_kind(kind: InsightNodeKind, filter_test_accounts_default: bool) -> QueryNode {
	let mut source = default_query_for_kind(kind).clone();

	if filter_test_accounts_default
		&& let Some(common) = source.common_mut()
	{
		common.filter_test_accounts = Some(true);
	}

	QueryNode::viz(source)
}

pub fn default_series() -> Vec<SeriesNode> {
	vec![SeriesNode::EventsNode(EventsNode {
		event: Some(DEFAULT_EVENT.to_string()),
		name: Some(DEFAULT_EVENT.to_string()),
		math: Some(DEFAULT_MATH.to_string()),
		properties: None,
	})]
}

fn build_default(kind: InsightNodeKind) -> QueryNode {
	match kind {
		InsightNodeKind::TrendsQuery => QueryNode::TrendsQuery(TrendsQuery {
			series: default_series(),
			trends_filter: Some(TrendsFilter::default()),
			..TrendsQuery::default()
		}),
		InsightNodeKind::FunnelsQuery => QueryNode::FunnelsQuery(FunnelsQuery {
			series: default_series(),
			funnels_filter: Some(FunnelsFilter {
				funnel_viz_type: Some(DEFAULT_FUNNEL_VIZ_TYPE.to_string()),
				..FunnelsFilter::default()
			}),
			..FunnelsQuery::default()
		}),
		InsightNodeKind::RetentionQuery => QueryNode::RetentionQuery(RetentionQuery {
			retention_filter: Some(RetentionFilter {
				period: Some(DEFAULT_RETENTION_PERIOD.to_string()),
				total_intervals: Some(DEFAULT_TOTAL_INTERVALS),
				retention_type: Some(DEFAULT_RETENTION_TYPE.to_string()),
			}),
			..RetentionQuery::default()
		}),
		InsightNodeKind::PathsQuery => QueryNode::PathsQuery(PathsQuery {
			paths_filter: Some(PathsFilter {
				include_event_types: Some(vec![DEFAULT_EVENT.to_string()]),
				..PathsFilter::default()
			}),
			..PathsQuery::default()
		}),
		InsightNodeKind::StickinessQuery => QueryNode::StickinessQuery(StickinessQuery {
			series: default_series(),
			stickiness_filter: Some(StickinessFilter::default()),
			..StickinessQuery::default()
		}),
		InsightNodeKind::LifecycleQuery => QueryNode::LifecycleQuery(LifecycleQuery {
			series: default_series(),
			lifecycle_filter: Some(LifecycleFilter::default()),
			..LifecycleQuery::default()
		}),
	}
}
