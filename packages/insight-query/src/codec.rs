//! Filter to query conversion and back.
//!
//! Both directions are total: inputs this codec cannot place resolve to the trends default and
//! log a warning.

use crate::{
	breakdown::BreakdownSpec,
	defaults,
	filter::{EntityFilter, EntityId, FilterObject, InsightType},
	node::{
		ActionsNode, DateRange, EventsNode, FunnelsFilter, FunnelsQuery, InsightCommon,
		InsightNodeKind, LifecycleFilter, LifecycleQuery, PathsFilter, PathsQuery, QueryNode,
		RetentionFilter, RetentionQuery, SeriesNode, StickinessFilter, StickinessQuery,
		TrendsFilter, TrendsQuery,
	},
};

/// Converts legacy filters into an insight `source` query.
pub fn filters_to_query_node(filters: &FilterObject) -> QueryNode {
	let kind = match &filters.insight {
		None => InsightNodeKind::TrendsQuery,
		Some(insight) => match insight.node_kind() {
			Some(kind) => kind,
			None => {
				tracing::warn!(
					insight = insight.as_str(),
					"Unrecognized insight kind. Falling back to the trends default."
				);

				return defaults::default_query_for_kind(InsightNodeKind::TrendsQuery).clone();
			},
		},
	};
	let common = common_from_filters(filters);
	let breakdown_filter =
		BreakdownSpec::from_filter(filters).map(|spec| spec.to_breakdown_filter());

	match kind {
		InsightNodeKind::TrendsQuery => QueryNode::TrendsQuery(TrendsQuery {
			common,
			series: series_from_filters(filters),
			interval: filters.interval,
			breakdown_filter,
			trends_filter: Some(TrendsFilter {
				display: filters.display.clone(),
				show_legend: filters.show_legend,
				compare: filters.compare,
				formula: filters.formula.clone(),
			}),
		}),
		InsightNodeKind::FunnelsQuery => QueryNode::FunnelsQuery(FunnelsQuery {
			common,
			series: series_from_filters(filters),
			interval: filters.interval,
			breakdown_filter,
			funnels_filter: Some(FunnelsFilter {
				funnel_viz_type: filters.funnel_viz_type.clone(),
				funnel_window_interval: filters.funnel_window_interval,
				funnel_window_interval_unit: filters.funnel_window_interval_unit.clone(),
				funnel_order_type: filters.funnel_order_type.clone(),
			}),
		}),
		InsightNodeKind::RetentionQuery => QueryNode::RetentionQuery(RetentionQuery {
			common,
			retention_filter: Some(RetentionFilter {
				retention_type: filters.retention_type.clone(),
				total_intervals: filters.total_intervals,
				period: filters.period.clone(),
			}),
		}),
		InsightNodeKind::PathsQuery => QueryNode::PathsQuery(PathsQuery {
			common,
			paths_filter: Some(PathsFilter {
				include_event_types: filters.include_event_types.clone(),
				step_limit: filters.step_limit,
			}),
		}),
		InsightNodeKind::StickinessQuery => QueryNode::StickinessQuery(StickinessQuery {
			common,
			series: series_from_filters(filters),
			interval: filters.interval,
			stickiness_filter: Some(StickinessFilter {
				display: filters.display.clone(),
				compare: filters.compare,
			}),
		}),
		InsightNodeKind::LifecycleQuery => QueryNode::LifecycleQuery(LifecycleQuery {
			common,
			series: series_from_filters(filters),
			interval: filters.interval,
			lifecycle_filter: Some(LifecycleFilter {
				toggled_lifecycles: filters.toggled_lifecycles.clone(),
			}),
		}),
	}
}

/// Converts legacy filters into a full visualization query.
pub fn query_from_filters(filters: &FilterObject) -> QueryNode {
	QueryNode::viz(filters_to_query_node(filters))
}

/// Converts an insight query (bare or visualization-wrapped) into legacy filters.
///
/// Returns `None` when the query is not an insight kind.
pub fn try_query_node_to_filter(query: &QueryNode) -> Option<FilterObject> {
	let source = query.viz_source().unwrap_or(query);
	let kind = source.insight_kind()?;
	let mut filters = FilterObject {
		insight: Some(kind.insight_type()),
		..FilterObject::default()
	};

	if let Some(common) = source.common() {
		write_common(&mut filters, common);
	}

	match source {
		QueryNode::TrendsQuery(query) => {
			write_series(&mut filters, &query.series);
			filters.interval = query.interval;

			if let Some(trends) = &query.trends_filter {
				filters.display = trends.display.clone();
				filters.show_legend = trends.show_legend;
				filters.compare = trends.compare;
				filters.formula = trends.formula.clone();
			}
			if let Some(spec) =
				query.breakdown_filter.as_ref().and_then(BreakdownSpec::from_breakdown_filter)
			{
				spec.write_filter(&mut filters);
			}
		},
		QueryNode::FunnelsQuery(query) => {
			write_series(&mut filters, &query.series);
			filters.interval = query.interval;

			if let Some(funnels) = &query.funnels_filter {
				filters.funnel_viz_type = funnels.funnel_viz_type.clone();
				filters.funnel_window_interval = funnels.funnel_window_interval;
				filters.funnel_window_interval_unit = funnels.funnel_window_interval_unit.clone();
				filters.funnel_order_type = funnels.funnel_order_type.clone();
			}
			if let Some(spec) =
				query.breakdown_filter.as_ref().and_then(BreakdownSpec::from_breakdown_filter)
			{
				spec.write_filter(&mut filters);
			}
		},
		QueryNode::RetentionQuery(query) =>
			if let Some(retention) = &query.retention_filter {
				filters.retention_type = retention.retention_type.clone();
				filters.total_intervals = retention.total_intervals;
				filters.period = retention.period.clone();
			},
		QueryNode::PathsQuery(query) =>
			if let Some(paths) = &query.paths_filter {
				filters.include_event_types = paths.include_event_types.clone();
				filters.step_limit = paths.step_limit;
			},
		QueryNode::StickinessQuery(query) => {
			write_series(&mut filters, &query.series);
			filters.interval = query.interval;

			if let Some(stickiness) = &query.stickiness_filter {
				filters.display = stickiness.display.clone();
				filters.compare = stickiness.compare;
			}
		},
		QueryNode::LifecycleQuery(query) => {
			write_series(&mut filters, &query.series);
			filters.interval = query.interval;

			if let Some(lifecycle) = &query.lifecycle_filter {
				filters.toggled_lifecycles = lifecycle.toggled_lifecycles.clone();
			}
		},
		_ => return None,
	}

	Some(filters)
}

/// Total form of [`try_query_node_to_filter`]: non-insight queries resolve to the trends default.
pub fn query_node_to_filter(query: &QueryNode) -> FilterObject {
	match try_query_node_to_filter(query) {
		Some(filters) => filters,
		None => {
			tracing::warn!(
				kind = query.kind_name(),
				"Query is not an insight kind. Falling back to the trends default."
			);

			default_trends_filter()
		},
	}
}

fn default_trends_filter() -> FilterObject {
	try_query_node_to_filter(defaults::default_query_for_kind(InsightNodeKind::TrendsQuery))
		.unwrap_or_else(|| FilterObject {
			insight: Some(InsightType::Trends),
			..FilterObject::default()
		})
}

fn common_from_filters(filters: &FilterObject) -> InsightCommon {
	let date_range = (filters.date_from.is_some() || filters.date_to.is_some()).then(|| DateRange {
		date_from: filters.date_from.clone(),
		date_to: filters.date_to.clone(),
	});

	InsightCommon {
		date_range,
		properties: filters.properties.clone(),
		filter_test_accounts: filters.filter_test_accounts,
		aggregation_group_type_index: filters.aggregation_group_type_index,
	}
}

fn write_common(filters: &mut FilterObject, common: &InsightCommon) {
	if let Some(range) = &common.date_range {
		filters.date_from = range.date_from.clone();
		filters.date_to = range.date_to.clone();
	}

	filters.properties = common.properties.clone();
	filters.filter_test_accounts = common.filter_test_accounts;
	filters.aggregation_group_type_index = common.aggregation_group_type_index;
}

/// Merges `events` and `actions` into one series ordered by `order`. Entities without an order
/// keep their relative position after the ordered ones.
fn series_from_filters(filters: &FilterObject) -> Vec<SeriesNode> {
	let events = filters.events.iter().flatten().map(|entity| (entity.order, event_node(entity)));
	let actions = filters
		.actions
		.iter()
		.flatten()
		.filter_map(|entity| action_node(entity).map(|node| (entity.order, node)));
	let mut series: Vec<(Option<u32>, SeriesNode)> = events.chain(actions).collect();

	series.sort_by_key(|(order, _)| order.unwrap_or(u32::MAX));

	series.into_iter().map(|(_, node)| node).collect()
}

fn event_node(entity: &EntityFilter) -> SeriesNode {
	let event = entity.id.as_ref().map(|id| match id {
		EntityId::Name(name) => name.clone(),
		EntityId::Number(number) => number.to_string(),
	});

	SeriesNode::EventsNode(EventsNode {
		event,
		name: entity.name.clone(),
		math: entity.math.clone(),
		properties: entity.properties.clone(),
	})
}

fn action_node(entity: &EntityFilter) -> Option<SeriesNode> {
	let id = match entity.id.as_ref() {
		Some(EntityId::Number(id)) => *id,
		Some(EntityId::Name(raw)) => match raw.parse::<i64>() {
			Ok(id) => id,
			Err(_) => {
				tracing::warn!(action = %raw, "Action id is not numeric. Dropping it from the series.");

				return None;
			},
		},
		None => {
			tracing::warn!("Action entity has no id. Dropping it from the series.");

			return None;
		},
	};

	Some(SeriesNode::ActionsNode(ActionsNode {
		id,
		name: entity.name.clone(),
		math: entity.math.clone(),
		properties: entity.properties.clone(),
	}))
}

fn write_series(filters: &mut FilterObject, series: &[SeriesNode]) {
	let mut events = Vec::new();
	let mut actions = Vec::new();

	for (position, node) in series.iter().enumerate() {
		let order = u32::try_from(position).ok();

		match node {
			SeriesNode::EventsNode(node) => events.push(EntityFilter {
				id: node.event.clone().map(EntityId::Name),
				name: node.name.clone(),
				math: node.math.clone(),
				order,
				properties: node.properties.clone(),
			}),
			SeriesNode::ActionsNode(node) => actions.push(EntityFilter {
				id: Some(EntityId::Number(node.id)),
				name: node.name.clone(),
				math: node.math.clone(),
				order,
				properties: node.properties.clone(),
			}),
		}
	}

	filters.events = (!events.is_empty()).then_some(events);
	filters.actions = (!actions.is_empty()).then_some(actions);
}

#[cfg(test)]
mod tests {
	use crate::{
		codec,
		filter::{FilterObject, InsightType},
		node::{InsightNodeKind, QueryNode},
	};

	#[test]
	fn missing_insight_tag_builds_trends() {
		let query = codec::filters_to_query_node(&FilterObject::default());

		assert_eq!(query.insight_kind(), Some(InsightNodeKind::TrendsQuery));
	}

	#[test]
	fn unknown_insight_tag_falls_back_to_trends_default() {
		let filters = FilterObject {
			insight: Some(InsightType::Other("SESSIONS".to_string())),
			date_from: Some("-30d".to_string()),
			..FilterObject::default()
		};
		let query = codec::filters_to_query_node(&filters);

		assert_eq!(
			&query,
			crate::defaults::default_query_for_kind(InsightNodeKind::TrendsQuery)
		);
	}

	#[test]
	fn non_insight_queries_have_no_filter_form() {
		let query = QueryNode::from_value(serde_json::json!({ "kind": "HogQLQuery", "query": "select 1" }))
			.expect("query should decode");

		assert_eq!(codec::try_query_node_to_filter(&query), None);
		assert_eq!(codec::query_node_to_filter(&query).insight, Some(InsightType::Trends));
	}

	#[test]
	fn series_follow_entity_order() {
		let filters = FilterObject::from_value(serde_json::json!({
			"insight": "TRENDS",
			"events": [{ "id": "$pageview", "order": 1 }],
			"actions": [{ "id": 8, "order": 0 }],
		}))
		.expect("filters should decode");
		let back = codec::query_node_to_filter(&codec::query_from_filters(&filters));

		assert_eq!(back, filters);
	}
}
