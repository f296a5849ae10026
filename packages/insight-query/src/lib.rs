pub mod breakdown;
pub mod codec;
pub mod compare;
pub mod defaults;
pub mod filter;
pub mod node;

mod error;

pub use breakdown::{AddBreakdown, BreakdownKey, BreakdownSpec};
pub use codec::{
	filters_to_query_node, query_from_filters, query_node_to_filter, try_query_node_to_filter,
};
pub use compare::{
	SavedQuery, clean_filters, compare_filters, query_changed, set_test_account_filter_for_new_insight,
};
pub use defaults::query_from_kind;
pub use error::{Error, Result};
pub use filter::{FilterObject, InsightType};
pub use node::{InsightNodeKind, QueryNode};
