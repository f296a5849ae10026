//! Query, insight and response builders shared by integration tests.

use serde_json::{Value, json};

use crate::Result;
use insight_query::QueryNode;
use insight_service::Insight;

/// Default trends query broken down by `property`.
pub fn trends_with_breakdown(property: &str) -> Result<QueryNode> {
	let query = QueryNode::from_value(json!({
		"kind": "InsightVizNode",
		"source": {
			"kind": "TrendsQuery",
			"series": [{ "kind": "EventsNode", "event": "$pageview", "name": "$pageview", "math": "total" }],
			"trendsFilter": {},
			"breakdownFilter": { "breakdown": property, "breakdown_type": "event" },
		},
	}))?;

	Ok(query)
}

pub fn hogql_query(sql: &str) -> Result<QueryNode> {
	Ok(QueryNode::from_value(json!({ "kind": "HogQLQuery", "query": sql }))?)
}

/// A saved trends insight over the last `days` days.
pub fn saved_trends_insight(short_id: &str, days: u32, result: Option<Value>) -> Result<Insight> {
	let mut insight = Insight::from_value(json!({
		"short_id": short_id,
		"name": "Pageviews",
		"filters": {
			"insight": "TRENDS",
			"date_from": format!("-{days}d"),
			"events": [{ "id": "$pageview", "name": "$pageview", "math": "total", "order": 0 }],
		},
	}))?;

	insight.result = result;

	Ok(insight)
}

/// Response body in the collaborator's shape: results under `results`.
pub fn results_response(results: Value) -> Value {
	json!({ "results": results })
}

pub fn hogql_response(results: Value, hogql: &str) -> Value {
	json!({ "results": results, "hogql": hogql })
}
