use std::{fs, path::Path};

use color_eyre::eyre::WrapErr;
use serde::Deserialize;

use crate::loader::FixtureResponse;
use insight_query::QueryNode;
use insight_service::{EditorSnapshot, Insight, InsightEditor, InsightProps, PendingLoad};

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
	#[serde(default)]
	pub props: ScenarioProps,
	#[serde(default)]
	pub responses: Vec<FixtureResponse>,
	pub steps: Vec<Step>,
}
impl Scenario {
	pub fn load(path: &Path) -> color_eyre::Result<Self> {
		let raw = fs::read_to_string(path)
			.wrap_err_with(|| format!("Failed to read scenario {}.", path.display()))?;

		serde_json::from_str(&raw)
			.wrap_err_with(|| format!("Failed to parse scenario {}.", path.display()))
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioProps {
	pub dashboard_item_id: Option<String>,
	pub cached_insight: Option<Insight>,
	pub query: Option<QueryNode>,
}
impl ScenarioProps {
	pub fn into_props(self) -> InsightProps {
		InsightProps {
			dashboard_item_id: self.dashboard_item_id,
			cached_insight: self.cached_insight,
			query: self.query,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOrder {
	#[default]
	Issued,
	Reverse,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
	SetQuery {
		query: Option<QueryNode>,
	},
	LoadInsight {
		insight: Insight,
	},
	ApplyInsight {
		insight: Insight,
		#[serde(default)]
		override_filter: bool,
	},
	PropsQuery {
		query: Option<QueryNode>,
	},
	Revert,
	Refresh,
	ToggleQueryEditor,
	Deliver {
		#[serde(default)]
		order: DeliveryOrder,
	},
}

/// Mounts the editor, runs every step and delivers whatever is still pending in issue order.
pub async fn replay(editor: &mut InsightEditor, props: &InsightProps, steps: Vec<Step>) -> EditorSnapshot {
	let mut pending: Vec<PendingLoad> = editor.mount(props).into_iter().collect();

	for step in steps {
		let issued = match step {
			Step::SetQuery { query } => editor.set_query(query),
			Step::LoadInsight { insight } => editor.on_insight_loaded(insight),
			Step::ApplyInsight { insight, override_filter } =>
				editor.apply_insight(&insight, override_filter),
			Step::PropsQuery { query } => editor.on_external_props_query_changed(query),
			Step::Revert => editor.revert(),
			Step::Refresh => Some(editor.refresh()),
			Step::ToggleQueryEditor => {
				editor.toggle_query_editor();

				None
			},
			Step::Deliver { order } => {
				deliver(editor, &mut pending, order).await;

				None
			},
		};

		pending.extend(issued);
	}

	deliver(editor, &mut pending, DeliveryOrder::Issued).await;

	editor.snapshot()
}

async fn deliver(editor: &mut InsightEditor, pending: &mut Vec<PendingLoad>, order: DeliveryOrder) {
	let mut batch = std::mem::take(pending);

	if order == DeliveryOrder::Reverse {
		batch.reverse();
	}

	for load in batch {
		let token = load.token;

		if !editor.settle(load).await {
			tracing::debug!(token = %token, "Delivered load was stale.");
		}
	}
}
