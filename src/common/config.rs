use serde::{Deserialize, Serialize};

use crate::chooser::error::ChooserError;

/// Behavioral knobs for the chooser engine.
///
/// All fields have defaults so a host can configure only what it cares
/// about, e.g. from an embedded TOML fragment:
///
/// ```toml
/// multi_select = true
/// insert_after_threshold = 0.4
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChooserSettings {
    /// Allow ctrl/cmd-click to accumulate a multi selection.
    #[serde(default = "yes")]
    pub multi_select: bool,
    /// Allow shift-click range selection from the last anchor.
    #[serde(default = "yes")]
    pub range_select: bool,
    /// Seed the selected list with `visible_by_default` columns at init.
    #[serde(default = "yes")]
    pub seed_visible_columns: bool,
    /// Start with canonical groups expanded.
    #[serde(default = "yes")]
    pub expand_groups_on_init: bool,
    /// Value stamped onto every projected leaf column's `sortable`.
    #[serde(default = "yes")]
    pub sortable_columns: bool,
    /// Value stamped onto every projected leaf column's `filter`.
    #[serde(default = "yes")]
    pub filterable_columns: bool,
    /// Fraction of a row's height below which a drop counts as
    /// "insert after" that row.
    #[serde(default = "default_insert_after_threshold")]
    pub insert_after_threshold: f64,
}

fn yes() -> bool {
    true
}

fn default_insert_after_threshold() -> f64 {
    0.5
}

impl Default for ChooserSettings {
    fn default() -> Self {
        Self {
            multi_select: true,
            range_select: true,
            seed_visible_columns: true,
            expand_groups_on_init: true,
            sortable_columns: true,
            filterable_columns: true,
            insert_after_threshold: default_insert_after_threshold(),
        }
    }
}

impl ChooserSettings {
    pub fn from_toml(raw: &str) -> Result<Self, ChooserError> {
        let settings: ChooserSettings = toml::from_str(raw)?;
        Ok(settings)
    }
}
