//! Query equivalence.
//!
//! Saved and live representations routinely differ in fields the backend fills with defaults.
//! Comparison runs on cleaned filters so those differences never surface as unsaved changes.

use crate::{
	breakdown::{self, BreakdownSpec},
	codec, defaults,
	filter::{FilterObject, InsightType},
	node::{InsightNodeKind, QueryNode},
};

/// The saved side of a comparison.
#[derive(Clone, Copy, Debug)]
pub enum SavedQuery<'a> {
	Query(&'a QueryNode),
	Filters(&'a FilterObject),
}

/// Canonicalizes `filters` for comparison.
///
/// `test_account_filters_default_checked` is the team default used when the filter carries no
/// explicit test-account setting.
pub fn clean_filters(
	filters: &FilterObject,
	test_account_filters_default_checked: Option<bool>,
) -> FilterObject {
	let filter_test_accounts = filters
		.filter_test_accounts
		.or(test_account_filters_default_checked)
		.filter(|enabled| *enabled);
	let kind = match &filters.insight {
		None => InsightNodeKind::TrendsQuery,
		Some(insight) => match insight.node_kind() {
			Some(kind) => kind,
			None => return FilterObject { filter_test_accounts, ..filters.clone() },
		},
	};
	let mut cleaned = FilterObject {
		insight: Some(kind.insight_type()),
		date_from: Some(
			filters.date_from.clone().unwrap_or_else(|| defaults::DEFAULT_DATE_FROM.to_string()),
		),
		date_to: filters.date_to.clone(),
		properties: non_empty(&filters.properties),
		filter_test_accounts,
		aggregation_group_type_index: filters.aggregation_group_type_index,
		..FilterObject::default()
	};

	if has_series(kind) {
		cleaned.interval = Some(filters.interval.unwrap_or(defaults::DEFAULT_INTERVAL));
		cleaned.events = non_empty(&filters.events);
		cleaned.actions = non_empty(&filters.actions);
	}

	match kind {
		InsightNodeKind::TrendsQuery => {
			cleaned.display = Some(display_or_default(filters));
			cleaned.show_legend = true_or_none(filters.show_legend);
			cleaned.compare = true_or_none(filters.compare);
			cleaned.formula = filters.formula.clone().filter(|formula| !formula.is_empty());
		},
		InsightNodeKind::FunnelsQuery => {
			cleaned.funnel_viz_type =
				Some(or_default(&filters.funnel_viz_type, defaults::DEFAULT_FUNNEL_VIZ_TYPE));
			cleaned.funnel_window_interval = Some(
				filters.funnel_window_interval.unwrap_or(defaults::DEFAULT_FUNNEL_WINDOW_INTERVAL),
			);
			cleaned.funnel_window_interval_unit = Some(or_default(
				&filters.funnel_window_interval_unit,
				defaults::DEFAULT_FUNNEL_WINDOW_INTERVAL_UNIT,
			));
			cleaned.funnel_order_type =
				Some(or_default(&filters.funnel_order_type, defaults::DEFAULT_FUNNEL_ORDER_TYPE));
		},
		InsightNodeKind::RetentionQuery => {
			cleaned.retention_type =
				Some(or_default(&filters.retention_type, defaults::DEFAULT_RETENTION_TYPE));
			cleaned.total_intervals =
				Some(filters.total_intervals.unwrap_or(defaults::DEFAULT_TOTAL_INTERVALS));
			cleaned.period = Some(or_default(&filters.period, defaults::DEFAULT_RETENTION_PERIOD));
		},
		InsightNodeKind::PathsQuery => {
			cleaned.step_limit = Some(filters.step_limit.unwrap_or(defaults::DEFAULT_PATHS_STEP_LIMIT));
			cleaned.include_event_types = Some(
				non_empty(&filters.include_event_types)
					.unwrap_or_else(|| vec![defaults::DEFAULT_EVENT.to_string()]),
			);
		},
		InsightNodeKind::StickinessQuery => {
			cleaned.display = Some(display_or_default(filters));
			cleaned.compare = true_or_none(filters.compare);
		},
		InsightNodeKind::LifecycleQuery => {
			cleaned.toggled_lifecycles = non_empty(&filters.toggled_lifecycles);
		},
	}

	if has_breakdown(kind) {
		match BreakdownSpec::from_filter(filters) {
			Some(spec) => spec.with_default_type().write_filter(&mut cleaned),
			None => breakdown::clear_breakdown(&mut cleaned),
		}
	}

	cleaned
}

/// True when both filters denote the same request once cleaned.
pub fn compare_filters(
	lhs: &FilterObject,
	rhs: &FilterObject,
	test_account_filters_default_checked: Option<bool>,
) -> bool {
	clean_filters(lhs, test_account_filters_default_checked)
		== clean_filters(rhs, test_account_filters_default_checked)
}

/// Applies the team test-account default to a filter that has no explicit setting.
pub fn set_test_account_filter_for_new_insight(
	filters: &FilterObject,
	test_account_filters_default_checked: Option<bool>,
) -> FilterObject {
	let mut filters = filters.clone();

	if filters.filter_test_accounts.is_none() {
		filters.filter_test_accounts = test_account_filters_default_checked;
	}

	filters
}

/// Whether `current` differs materially from `saved`.
///
/// With nothing saved, `current` is compared against the default for its own insight kind with
/// the team test-account default applied to both sides.
pub fn query_changed(
	current: Option<&QueryNode>,
	saved: Option<SavedQuery<'_>>,
	test_account_filters_default_checked: Option<bool>,
) -> bool {
	let saved = match saved {
		Some(SavedQuery::Query(query)) if !query.is_insight_viz() =>
			return current != Some(query),
		Some(SavedQuery::Query(query)) => Some(query.clone()),
		// A kind the codec cannot place has no query form to compare against.
		Some(SavedQuery::Filters(filters))
			if filters.insight.as_ref().is_some_and(|insight| insight.node_kind().is_none()) =>
			return true,
		Some(SavedQuery::Filters(filters)) => Some(codec::query_from_filters(filters)),
		None => None,
	};
	let Some(current_source) = current.and_then(QueryNode::viz_source) else {
		return true;
	};
	let Some(current_filters) = codec::try_query_node_to_filter(current_source) else {
		return match saved.as_ref().and_then(QueryNode::viz_source) {
			Some(saved_source) => current_source != saved_source,
			None => true,
		};
	};

	match saved {
		Some(saved) => {
			let Some(saved_source) = saved.viz_source() else {
				return true;
			};

			match codec::try_query_node_to_filter(saved_source) {
				Some(saved_filters) => !compare_filters(&current_filters, &saved_filters, None),
				None => current_source != saved_source,
			}
		},
		None => {
			let insight = current_filters.insight.clone().unwrap_or(InsightType::Trends);
			let default_filters = codec::query_node_to_filter(defaults::default_query_for_insight(&insight));
			let default_filters = set_test_account_filter_for_new_insight(
				&default_filters,
				test_account_filters_default_checked,
			);

			!compare_filters(&current_filters, &default_filters, test_account_filters_default_checked)
		},
	}
}

fn has_series(kind: InsightNodeKind) -> bool {
	!matches!(kind, InsightNodeKind::RetentionQuery | InsightNodeKind::PathsQuery)
}

fn has_breakdown(kind: InsightNodeKind) -> bool {
	matches!(kind, InsightNodeKind::TrendsQuery | InsightNodeKind::FunnelsQuery)
}

fn non_empty<T: Clone>(list: &Option<Vec<T>>) -> Option<Vec<T>> {
	list.clone().filter(|list| !list.is_empty())
}

fn true_or_none(flag: Option<bool>) -> Option<bool> {
	flag.filter(|flag| *flag)
}

fn or_default(value: &Option<String>, fallback: &str) -> String {
	value.clone().unwrap_or_else(|| fallback.to_string())
}

fn display_or_default(filters: &FilterObject) -> String {
	or_default(&filters.display, defaults::DEFAULT_DISPLAY)
}

#[cfg(test)]
mod tests {
	use crate::{
		compare::{self, SavedQuery},
		defaults,
		filter::{BreakdownValue, FilterObject, InsightType, Interval},
		node::{InsightNodeKind, QueryNode},
	};

	fn trends() -> FilterObject {
		FilterObject { insight: Some(InsightType::Trends), ..FilterObject::default() }
	}

	#[test]
	fn defaults_compare_equal_to_absent_fields() {
		let explicit = FilterObject {
			interval: Some(Interval::Day),
			date_from: Some("-7d".to_string()),
			display: Some("ActionsLineGraph".to_string()),
			show_legend: Some(false),
			events: Some(Vec::new()),
			..trends()
		};

		assert!(compare::compare_filters(&explicit, &trends(), None));
	}

	#[test]
	fn fields_outside_the_kind_are_ignored() {
		let funnel_noise = FilterObject { funnel_viz_type: Some("trends".to_string()), ..trends() };

		assert!(compare::compare_filters(&funnel_noise, &trends(), None));
	}

	#[test]
	fn team_default_matches_explicit_setting() {
		let explicit = FilterObject { filter_test_accounts: Some(true), ..trends() };

		assert!(compare::compare_filters(&explicit, &trends(), Some(true)));
		assert!(!compare::compare_filters(&explicit, &trends(), Some(false)));
	}

	#[test]
	fn breakdown_type_defaults_to_event() {
		let typed = FilterObject {
			breakdown: Some(BreakdownValue::Property("$browser".to_string())),
			breakdown_type: Some(crate::filter::BreakdownType::Event),
			..trends()
		};
		let untyped = FilterObject { breakdown_type: None, ..typed.clone() };

		assert!(compare::compare_filters(&typed, &untyped, None));
	}

	#[test]
	fn new_insight_default_is_unchanged() {
		let current = defaults::query_from_kind(InsightNodeKind::TrendsQuery, false);

		assert!(!compare::query_changed(Some(&current), None, None));
	}

	#[test]
	fn new_insight_honours_team_test_account_default() {
		let current = defaults::query_from_kind(InsightNodeKind::TrendsQuery, true);

		assert!(!compare::query_changed(Some(&current), None, Some(true)));
	}

	#[test]
	fn saved_filters_compare_through_the_codec() {
		let saved = FilterObject { date_from: Some("-30d".to_string()), ..trends() };
		let current = crate::codec::query_from_filters(&saved);

		assert!(!compare::query_changed(Some(&current), Some(SavedQuery::Filters(&saved)), None));
		assert!(compare::query_changed(Some(&current), Some(SavedQuery::Filters(&trends())), None));
	}

	#[test]
	fn saved_ad_hoc_query_requires_structural_equality() {
		let saved = QueryNode::from_value(serde_json::json!({ "kind": "HogQLQuery", "query": "select 1" }))
			.expect("query should decode");

		assert!(!compare::query_changed(Some(&saved), Some(SavedQuery::Query(&saved)), None));
		assert!(compare::query_changed(None, Some(SavedQuery::Query(&saved)), None));
	}

	#[test]
	fn saved_unknown_kind_compares_by_payload() {
		let saved = QueryNode::from_value(
			serde_json::json!({ "kind": "ActorsQuery", "select": ["person"], "limit": 50 }),
		)
		.expect("query should decode");
		let edited =
			QueryNode::from_value(serde_json::json!({ "kind": "ActorsQuery", "select": ["person"] }))
				.expect("query should decode");

		assert!(!compare::query_changed(Some(&saved), Some(SavedQuery::Query(&saved)), None));
		assert!(compare::query_changed(Some(&edited), Some(SavedQuery::Query(&saved)), None));
	}
}
