use std::{path::PathBuf, sync::Arc};

use serde_json::json;

use insight_config::{FeatureFlags, Workspace};
use insight_replay::{
	loader::{FixtureLoader, FixtureResponse},
	scenario::{self, Scenario},
};
use insight_service::{InsightEditor, LoadError, LoadState, QuerySource};

fn scenario_path(name: &str) -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(name)
}

async fn replay_file(name: &str) -> (insight_service::EditorSnapshot, Arc<FixtureLoader>) {
	let scenario = Scenario::load(&scenario_path(name)).expect("scenario should load");
	let props = scenario.props.clone().into_props();
	let loader = Arc::new(FixtureLoader::new(scenario.responses, 30_000));
	let mut editor =
		InsightEditor::new(&props, Workspace::default(), FeatureFlags::default(), loader.clone());
	let snapshot = scenario::replay(&mut editor, &props, scenario.steps).await;

	(snapshot, loader)
}

#[tokio::test]
async fn pathname_breakdown_scenario_shows_the_reshaped_result() {
	let (snapshot, loader) = replay_file("pathname_breakdown.json").await;
	let data = snapshot.insight_data.expect("insight data");

	assert_eq!(data["result"], json!([[{ "label": "/home", "count": 12 }]]));
	assert_eq!(snapshot.hogql, None);
	assert!(snapshot.query_changed);
	assert!(snapshot.changed_since_saved);
	assert_eq!(loader.remaining(), 0);
}

#[tokio::test]
async fn reverse_delivery_keeps_the_latest_issued_result() {
	let (snapshot, _) = replay_file("stale_response.json").await;

	assert_eq!(snapshot.insight_data.expect("insight data")["result"], json!(["funnels"]));
	assert_eq!(snapshot.hogql.as_deref(), Some("select 'funnels'"));
	assert!(matches!(snapshot.load_state, LoadState::Success { token: Some(_) }));
}

#[tokio::test]
async fn revert_scenario_restores_the_saved_result() {
	let (snapshot, _) = replay_file("revert.json").await;

	assert_eq!(snapshot.session_key, "Xy12abCd");
	assert_eq!(snapshot.query_source, QuerySource::UserEdit);
	assert!(!snapshot.query_changed);
	assert!(snapshot.show_query_editor);
	assert_eq!(snapshot.insight_data.expect("insight data")["result"], json!([[3, 5, 8]]));
	assert_eq!(snapshot.export.expect("export context").filename, "export-Weekly signups");
}

#[tokio::test]
async fn slow_response_times_out() {
	let scenario: Scenario = serde_json::from_value(json!({
		"responses": [{ "type": "ok", "body": { "results": [] }, "delay_ms": 200 }],
		"steps": [{ "op": "deliver" }],
	}))
	.expect("scenario should decode");
	let props = scenario.props.clone().into_props();
	let loader = Arc::new(FixtureLoader::new(scenario.responses, 10));
	let mut editor = InsightEditor::new(&props, Workspace::default(), FeatureFlags::default(), loader);
	let snapshot = scenario::replay(&mut editor, &props, scenario.steps).await;

	assert!(matches!(
		snapshot.load_state,
		LoadState::Error { error: LoadError::Timeout { timeout_ms: 10 }, .. }
	));
}

#[test]
fn error_responses_decode_from_the_load_error_shape() {
	let response: FixtureResponse = serde_json::from_value(json!({
		"type": "error",
		"error": { "kind": "query", "message": "Syntax error.", "status": 400 },
	}))
	.expect("response should decode");

	assert!(matches!(
		response,
		FixtureResponse::Error { error: LoadError::Query { status: Some(400), .. } }
	));
}
