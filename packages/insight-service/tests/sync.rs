use serde_json::json;

use insight_query::{InsightNodeKind, QueryNode};
use insight_service::{LoadError, LoadOutcome, LoadState, ResultSynchronizer};

fn kind_query(kind: InsightNodeKind) -> QueryNode {
	insight_query::query_from_kind(kind, false)
}

#[test]
fn only_the_latest_token_is_applied() {
	let mut sync = ResultSynchronizer::new("abc123");
	let first = sync.on_query_changed(&kind_query(InsightNodeKind::TrendsQuery)).expect("first load");
	let second =
		sync.on_query_changed(&kind_query(InsightNodeKind::FunnelsQuery)).expect("second load");

	assert_ne!(first.token, second.token);
	assert!(!sync.apply(LoadOutcome { token: first.token, result: Ok(json!({ "results": [1] })) }));
	assert_eq!(sync.state(), &LoadState::Loading { token: second.token });
	assert_eq!(sync.insight_data(), None);

	assert!(sync.apply(LoadOutcome { token: second.token, result: Ok(json!({ "results": [2] })) }));
	assert_eq!(sync.result(), Some(&json!([2])));
	assert_eq!(sync.state(), &LoadState::Success { token: Some(second.token) });
	assert!(sync.timing().is_some());
}

#[test]
fn late_response_after_success_is_dropped() {
	let mut sync = ResultSynchronizer::new("abc123");
	let first = sync.on_query_changed(&kind_query(InsightNodeKind::TrendsQuery)).expect("first load");
	let second =
		sync.on_query_changed(&kind_query(InsightNodeKind::FunnelsQuery)).expect("second load");

	assert!(sync.apply(LoadOutcome { token: second.token, result: Ok(json!({ "results": [2] })) }));
	assert!(!sync.apply(LoadOutcome { token: first.token, result: Ok(json!({ "results": [1] })) }));
	assert_eq!(sync.result(), Some(&json!([2])));
}

#[test]
fn unchanged_query_is_not_reloaded() {
	let mut sync = ResultSynchronizer::new("abc123");
	let query = kind_query(InsightNodeKind::TrendsQuery);

	assert!(sync.on_query_changed(&query).is_some());
	assert!(sync.on_query_changed(&query.clone()).is_none());

	let forced = sync.refresh(&query);

	assert_eq!(sync.latest_token(), Some(forced.token));
	assert_eq!(forced.query, query);
}

#[test]
fn failure_keeps_the_last_good_result() {
	let mut sync = ResultSynchronizer::new("abc123");
	let first = sync.on_query_changed(&kind_query(InsightNodeKind::TrendsQuery)).expect("first load");

	sync.apply(LoadOutcome { token: first.token, result: Ok(json!({ "results": [[1, 2, 3]] })) });

	let second =
		sync.on_query_changed(&kind_query(InsightNodeKind::FunnelsQuery)).expect("second load");
	let error = LoadError::Query { message: "Timeout in ClickHouse.".to_string(), status: Some(504) };

	assert!(sync.apply(LoadOutcome { token: second.token, result: Err(error.clone()) }));
	assert_eq!(sync.state(), &LoadState::Error { token: second.token, error });
	assert_eq!(sync.result(), Some(&json!([[1, 2, 3]])));
	assert!(!sync.is_loading());
}

#[test]
fn non_object_body_is_malformed() {
	let mut sync = ResultSynchronizer::new("abc123");
	let request = sync.on_query_changed(&kind_query(InsightNodeKind::TrendsQuery)).expect("load");

	sync.apply(LoadOutcome { token: request.token, result: Ok(json!([1, 2])) });

	assert!(matches!(
		sync.state(),
		LoadState::Error { error: LoadError::MalformedResponse { .. }, .. }
	));
}

#[test]
fn raw_response_is_not_reshaped() {
	let mut sync = ResultSynchronizer::new("abc123");
	let request = sync.on_query_changed(&kind_query(InsightNodeKind::TrendsQuery)).expect("load");

	sync.apply(LoadOutcome {
		token: request.token,
		result: Ok(json!({ "results": [4], "hogql": "" })),
	});

	let raw = sync.response().expect("raw response");

	assert_eq!(raw.query_id, Some(request.token));
	assert!(!raw.body.contains_key("result"));
	assert_eq!(sync.insight_data().and_then(|data| data.get("results")), Some(&json!([4])));
	assert_eq!(sync.result(), Some(&json!([4])));
	assert_eq!(sync.hogql(), None);
}

#[test]
fn written_result_supersedes_the_in_flight_load() {
	let mut sync = ResultSynchronizer::new("abc123");
	let query = kind_query(InsightNodeKind::TrendsQuery);
	let request = sync.on_query_changed(&query).expect("load");

	sync.write_result(&query, json!([9]));

	assert!(!sync.is_loading());
	assert_eq!(sync.state(), &LoadState::Success { token: None });
	assert!(!sync.apply(LoadOutcome { token: request.token, result: Ok(json!({ "results": [1] })) }));
	assert_eq!(sync.result(), Some(&json!([9])));
	assert!(sync.on_query_changed(&query).is_none());
}

#[test]
fn cleared_result_reads_as_absent() {
	let mut sync = ResultSynchronizer::new("abc123");

	sync.write_result(&kind_query(InsightNodeKind::TrendsQuery), json!([1]));
	sync.clear_result();

	assert_eq!(sync.result(), None);
	assert_eq!(sync.insight_data().and_then(|data| data.get("result")), Some(&json!(null)));
}
