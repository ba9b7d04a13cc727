use crate::state::CoordinateState;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ADVERT: &str = "([[User:Chlod/Scripts/Coordinator|Coordinator]])";

/// Canonical titles of the templates the editor works with. Titles keep the `Template:` prefix;
/// the wiki localizes the namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateNames {
    pub coord: String,
    pub coord_missing: String,
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            coord: "Template:Coord".to_string(),
            coord_missing: "Template:Coord missing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditSummaries {
    /// Used when a `{{Coord missing}}` placeholder is replaced.
    pub add: String,
    pub modify: String,
}

impl Default for EditSummaries {
    fn default() -> Self {
        Self {
            add: format!("Adding page coordinates {ADVERT}"),
            modify: format!("Adding page coordinates {ADVERT}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoordinatorConfig {
    pub templates: TemplateNames,
    pub summaries: EditSummaries,
    /// Whether a fresh editing session starts in DMS mode.
    pub default_dms: bool,
    /// Fractional digits of decimal coordinates written to the template.
    pub decimal_precision: usize,
    /// Fractional digits shown in the decimal text fields.
    pub display_precision: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            templates: TemplateNames::default(),
            summaries: EditSummaries::default(),
            default_dms: false,
            decimal_precision: crate::params::DECIMAL_PRECISION,
            display_precision: 4,
        }
    }
}

impl CoordinatorConfig {
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::default().with_overrides(value)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|err| Error::InvalidConfig {
            message: err.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Deep-merges a (partial) JSON object onto this config.
    pub fn with_overrides(self, overrides: &Value) -> Result<Self> {
        if !overrides.is_object() {
            return Err(Error::InvalidConfig {
                message: "configuration overrides must be a JSON object".to_string(),
            });
        }
        let mut base = serde_json::to_value(&self).map_err(|err| Error::InvalidConfig {
            message: err.to_string(),
        })?;
        deep_merge_value(&mut base, overrides);
        serde_json::from_value(base).map_err(|err| Error::InvalidConfig {
            message: err.to_string(),
        })
    }

    pub fn summary_for(&self, state: &CoordinateState) -> &str {
        if state.from_missing_template {
            &self.summaries.add
        } else {
            &self.summaries.modify
        }
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
