use serde::Serialize;

use crate::insight::Insight;
use insight_query::QueryNode;

pub const EXPORT_FILENAME_PREFIX: &str = "export";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
	#[default]
	Csv,
	Xlsx,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportContext {
	pub format: ExportFormat,
	pub filename: String,
	pub source: QueryNode,
}
impl ExportContext {
	pub fn with_format(mut self, format: ExportFormat) -> Self {
		self.format = format;

		self
	}
}

/// Export descriptor for `query`. `None` means exporting does not apply.
pub fn export_context(query: Option<&QueryNode>, insight: &Insight) -> Option<ExportContext> {
	let query = query?;
	let filename = format!("{EXPORT_FILENAME_PREFIX}-{}", insight.display_name().unwrap_or_default());
	let source = query.viz_source().unwrap_or(query).clone();

	Some(ExportContext { format: ExportFormat::default(), filename, source })
}
