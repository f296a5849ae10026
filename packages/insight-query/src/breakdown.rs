//! Breakdown classification and editing.
//!
//! The legacy filter spreads one breakdown over several loosely-related fields. [`BreakdownSpec`]
//! is the closed form both codec directions go through, so the derived fields (`normalize_url`,
//! histogram bins) are recomputed from the shape instead of being copied.

use crate::{
	filter::{Breakdown, BreakdownType, BreakdownValue, CohortRef, FilterObject},
	node::BreakdownFilter,
};

pub const URL_NORMALIZEABLE_PROPERTIES: [&str; 2] = ["$current_url", "$pathname"];
pub const DEFAULT_HISTOGRAM_BIN_COUNT: u32 = 10;
pub const ALL_USERS_COHORT: &str = "all";

pub fn is_url_normalizeable(property: &str) -> bool {
	URL_NORMALIZEABLE_PROPERTIES.contains(&property)
}

pub fn is_all_cohort(value: &CohortRef) -> bool {
	matches!(value, CohortRef::Named(name) if name == ALL_USERS_COHORT)
}

pub fn is_cohort(value: &CohortRef) -> bool {
	matches!(value, CohortRef::Id(_))
}

pub fn is_cohort_breakdown(value: &CohortRef) -> bool {
	is_all_cohort(value) || is_cohort(value)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BreakdownKey {
	Property(String),
	Cohort(CohortRef),
}
impl BreakdownKey {
	fn to_value(&self) -> BreakdownValue {
		match self {
			Self::Property(name) => BreakdownValue::Property(name.clone()),
			Self::Cohort(CohortRef::Id(id)) => BreakdownValue::Cohort(*id),
			Self::Cohort(CohortRef::Named(name)) => BreakdownValue::Property(name.clone()),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BreakdownSpec {
	Single {
		key: BreakdownKey,
		breakdown_type: Option<BreakdownType>,
		group_type_index: Option<u32>,
		histogram_bin_count: Option<u32>,
	},
	Multi {
		breakdowns: Vec<Breakdown>,
		breakdown_type: Option<BreakdownType>,
		group_type_index: Option<u32>,
	},
	Cohorts {
		cohorts: Vec<CohortRef>,
		breakdown_type: Option<BreakdownType>,
	},
}
impl BreakdownSpec {
	pub fn from_filter(filters: &FilterObject) -> Option<Self> {
		Self::classify(BreakdownParts {
			breakdown: filters.breakdown.as_ref(),
			breakdown_type: filters.breakdown_type,
			group_type_index: filters.breakdown_group_type_index,
			histogram_bin_count: filters.breakdown_histogram_bin_count,
			breakdowns: filters.breakdowns.as_deref(),
		})
	}

	pub fn from_breakdown_filter(filter: &BreakdownFilter) -> Option<Self> {
		Self::classify(BreakdownParts {
			breakdown: filter.breakdown.as_ref(),
			breakdown_type: filter.breakdown_type,
			group_type_index: filter.breakdown_group_type_index,
			histogram_bin_count: filter.breakdown_histogram_bin_count,
			breakdowns: filter.breakdowns.as_deref(),
		})
	}

	fn classify(parts: BreakdownParts<'_>) -> Option<Self> {
		if let Some(breakdowns) = parts.breakdowns.filter(|list| !list.is_empty()) {
			let breakdowns = breakdowns
				.iter()
				.map(|entry| Breakdown {
					normalize_url: Some(is_url_normalizeable(&entry.property)),
					..entry.clone()
				})
				.collect();

			return Some(Self::Multi {
				breakdowns,
				breakdown_type: parts.breakdown_type,
				group_type_index: parts.group_type_index,
			});
		}

		let key = match parts.breakdown? {
			BreakdownValue::List(cohorts) => {
				return Some(Self::Cohorts {
					cohorts: cohorts.clone(),
					breakdown_type: parts.breakdown_type,
				});
			},
			BreakdownValue::Cohort(id) => BreakdownKey::Cohort(CohortRef::Id(*id)),
			BreakdownValue::Property(name) if parts.breakdown_type == Some(BreakdownType::Cohort) =>
				BreakdownKey::Cohort(CohortRef::Named(name.clone())),
			BreakdownValue::Property(name) => BreakdownKey::Property(name.clone()),
		};
		let histogram_bin_count = match key {
			BreakdownKey::Property(_) => parts.histogram_bin_count,
			BreakdownKey::Cohort(_) => None,
		};

		Some(Self::Single {
			key,
			breakdown_type: parts.breakdown_type,
			group_type_index: parts.group_type_index,
			histogram_bin_count,
		})
	}

	pub fn breakdown_type(&self) -> Option<BreakdownType> {
		match self {
			Self::Single { breakdown_type, .. }
			| Self::Multi { breakdown_type, .. }
			| Self::Cohorts { breakdown_type, .. } => *breakdown_type,
		}
	}

	/// Fills an absent breakdown type: `cohort` for cohort shapes, `event` otherwise.
	pub fn with_default_type(mut self) -> Self {
		let fallback = match &self {
			Self::Single { key: BreakdownKey::Cohort(_), .. } | Self::Cohorts { .. } =>
				BreakdownType::Cohort,
			_ => BreakdownType::Event,
		};

		match &mut self {
			Self::Single { breakdown_type, .. }
			| Self::Multi { breakdown_type, .. }
			| Self::Cohorts { breakdown_type, .. } => {
				breakdown_type.get_or_insert(fallback);
			},
		}

		self
	}

	pub fn normalize_url(&self) -> Option<bool> {
		match self {
			Self::Single { key: BreakdownKey::Property(name), .. } => Some(is_url_normalizeable(name)),
			_ => None,
		}
	}

	pub fn to_breakdown_filter(&self) -> BreakdownFilter {
		let normalize_url = self.normalize_url();

		match self {
			Self::Single { key, breakdown_type, group_type_index, histogram_bin_count } =>
				BreakdownFilter {
					breakdown: Some(key.to_value()),
					breakdown_type: *breakdown_type,
					breakdown_group_type_index: *group_type_index,
					breakdown_histogram_bin_count: *histogram_bin_count,
					breakdown_normalize_url: normalize_url,
					breakdowns: None,
				},
			Self::Multi { breakdowns, breakdown_type, group_type_index } => BreakdownFilter {
				breakdown_type: *breakdown_type,
				breakdown_group_type_index: *group_type_index,
				breakdowns: Some(breakdowns.clone()),
				..BreakdownFilter::default()
			},
			Self::Cohorts { cohorts, breakdown_type } => BreakdownFilter {
				breakdown: Some(BreakdownValue::List(cohorts.clone())),
				breakdown_type: *breakdown_type,
				..BreakdownFilter::default()
			},
		}
	}

	/// Overwrites every breakdown field of `filters`, clearing those this shape does not use.
	pub fn write_filter(&self, filters: &mut FilterObject) {
		write_breakdown_filter(filters, self.to_breakdown_filter());
	}
}

struct BreakdownParts<'a> {
	breakdown: Option<&'a BreakdownValue>,
	breakdown_type: Option<BreakdownType>,
	group_type_index: Option<u32>,
	histogram_bin_count: Option<u32>,
	breakdowns: Option<&'a [Breakdown]>,
}

pub fn write_breakdown_filter(filters: &mut FilterObject, breakdown: BreakdownFilter) {
	filters.breakdown = breakdown.breakdown;
	filters.breakdown_type = breakdown.breakdown_type;
	filters.breakdown_group_type_index = breakdown.breakdown_group_type_index;
	filters.breakdown_histogram_bin_count = breakdown.breakdown_histogram_bin_count;
	filters.breakdown_normalize_url = breakdown.breakdown_normalize_url;
	filters.breakdowns = breakdown.breakdowns;
}

pub fn clear_breakdown(filters: &mut FilterObject) {
	write_breakdown_filter(filters, BreakdownFilter::default());
}

/// A breakdown picked in the editor.
#[derive(Clone, Debug)]
pub struct AddBreakdown {
	pub value: CohortRef,
	pub breakdown_type: BreakdownType,
	pub group_type_index: Option<u32>,
	/// Whether the property definition is numeric. Ignored in multi mode.
	pub is_numeric: bool,
	pub multi: bool,
}

/// Adds `add` to the breakdown already present in `filters`.
///
/// Multi mode appends to `breakdowns`. A cohort pick accumulates a cohort list. Any other pick
/// replaces the single breakdown.
pub fn add_breakdown(filters: &FilterObject, add: &AddBreakdown) -> FilterObject {
	let mut next = filters.clone();
	let mut parts = breakdown_parts(filters);

	parts.push(add.value.clone());
	parts.retain(|part| match part {
		CohortRef::Id(id) => *id != 0,
		CohortRef::Named(name) => !name.is_empty(),
	});

	let histogram_bin_count =
		(!add.multi && add.is_numeric).then_some(DEFAULT_HISTOGRAM_BIN_COUNT);
	let normalize_url = match &add.value {
		CohortRef::Named(name) => is_url_normalizeable(name),
		CohortRef::Id(_) => false,
	};

	next.breakdown_type = Some(add.breakdown_type);
	next.breakdown_group_type_index = add.group_type_index;
	next.breakdown_histogram_bin_count = histogram_bin_count;
	next.breakdown_normalize_url = Some(normalize_url);

	if add.multi {
		next.breakdowns = Some(
			parts
				.into_iter()
				.map(|part| {
					let property = cohort_ref_name(&part);

					Breakdown {
						normalize_url: Some(is_url_normalizeable(&property)),
						property,
						breakdown_type: Some(add.breakdown_type),
						group_type_index: None,
					}
				})
				.collect(),
		);
	} else if add.breakdown_type == BreakdownType::Cohort {
		next.breakdown = Some(BreakdownValue::List(parts));
	} else {
		next.breakdown = Some(match &add.value {
			CohortRef::Id(id) => BreakdownValue::Cohort(*id),
			CohortRef::Named(name) => BreakdownValue::Property(name.clone()),
		});
	}

	next
}

fn breakdown_parts(filters: &FilterObject) -> Vec<CohortRef> {
	if let Some(breakdowns) = filters.breakdowns.as_ref().filter(|list| !list.is_empty()) {
		return breakdowns.iter().map(|entry| CohortRef::Named(entry.property.clone())).collect();
	}

	match &filters.breakdown {
		Some(BreakdownValue::List(cohorts)) => cohorts.clone(),
		Some(BreakdownValue::Cohort(id)) => vec![CohortRef::Id(*id)],
		Some(BreakdownValue::Property(name)) => vec![CohortRef::Named(name.clone())],
		None => Vec::new(),
	}
}

fn cohort_ref_name(value: &CohortRef) -> String {
	match value {
		CohortRef::Id(id) => id.to_string(),
		CohortRef::Named(name) => name.clone(),
	}
}
