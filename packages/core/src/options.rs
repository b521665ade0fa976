//! Graph configuration.

use serde::{Deserialize, Serialize};

/// Options fixed when a [`Graph`](crate::Graph) is created.
///
/// Deserializable so hosts can keep them next to their own settings:
///
/// ```rust
/// use objgraph_core::GraphOptions;
///
/// let options: GraphOptions = serde_json::from_str(r#"{ "load_on_demand": false }"#).unwrap();
/// assert!(options.deliver_by_default);
/// assert!(!options.load_on_demand);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// Initial delivery flag of every new instance.
    pub deliver_by_default: bool,
    /// Whether proxy resolution may ask the loader for resources that are
    /// not in the graph yet.
    pub load_on_demand: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            deliver_by_default: true,
            load_on_demand: true,
        }
    }
}
