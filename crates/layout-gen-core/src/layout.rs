//! Assembled layout document and the assembler.
//!
//! Assembly is a pure function of already-resolved inputs: no clock, no I/O,
//! no randomness. Two calls with the same inputs serialize to the same bytes.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Config, InspectionConfig, StepConfig};
use crate::errors::{LayoutError, LayoutResult};
use crate::keys::{KeyId, PublicKey, ResolvedKeys};
use crate::tokens::{tokenize, tokenize_rules};

pub const LAYOUT_TYPE: &str = "layout";
pub const STEP_TYPE: &str = "step";
pub const INSPECTION_TYPE: &str = "inspection";

/// A step in the assembled layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "_type")]
    pub type_: String,
    pub name: String,
    pub threshold: u64,
    pub expected_materials: Vec<Vec<String>>,
    pub expected_products: Vec<Vec<String>>,
    pub pubkeys: Vec<KeyId>,
    /// Empty when the step places no constraint on its command.
    pub expected_command: Vec<String>,
}

/// An inspection in the assembled layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    #[serde(rename = "_type")]
    pub type_: String,
    pub name: String,
    pub expected_materials: Vec<Vec<String>>,
    pub expected_products: Vec<Vec<String>>,
    pub run: Vec<String>,
}

/// The assembled, unsigned layout.
///
/// Absent optional fields are omitted from the serialized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(rename = "_type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    pub keys: BTreeMap<KeyId, PublicKey>,
    pub steps: Vec<Step>,
    pub inspect: Vec<Inspection>,
}

/// Assemble a layout from a config and its resolved parts.
pub fn assemble(
    config: &Config,
    expires: Option<String>,
    keys: &ResolvedKeys,
) -> LayoutResult<Layout> {
    check_unique_names(config)?;

    let steps = config
        .steps
        .iter()
        .map(|step| assemble_step(step, keys))
        .collect::<LayoutResult<Vec<_>>>()?;
    let inspect = config.inspect.iter().map(assemble_inspection).collect();

    let layout = Layout {
        type_: LAYOUT_TYPE.to_string(),
        expires,
        readme: config.readme.clone(),
        keys: keys.table().clone(),
        steps,
        inspect,
    };

    info!(
        steps = layout.steps.len(),
        inspections = layout.inspect.len(),
        keys = layout.keys.len(),
        expires = layout.expires.as_deref().unwrap_or("never"),
        "assembled layout"
    );
    Ok(layout)
}

fn check_unique_names(config: &Config) -> LayoutResult<()> {
    let mut seen = HashSet::new();
    let names = config
        .steps
        .iter()
        .map(|s| s.name.as_str())
        .chain(config.inspect.iter().map(|i| i.name.as_str()));

    for name in names {
        if !seen.insert(name) {
            return Err(LayoutError::DuplicateName {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn assemble_step(step: &StepConfig, keys: &ResolvedKeys) -> LayoutResult<Step> {
    let threshold = u64::try_from(step.threshold)
        .ok()
        .filter(|t| *t >= 1)
        .ok_or_else(|| LayoutError::InvalidThreshold {
            step: step.name.clone(),
            threshold: step.threshold,
        })?;

    let expected_command = if step.expected_command.is_empty() {
        Vec::new()
    } else {
        tokenize(&step.expected_command)
    };

    Ok(Step {
        type_: STEP_TYPE.to_string(),
        name: step.name.clone(),
        threshold,
        expected_materials: tokenize_rules(&step.expected_materials),
        expected_products: tokenize_rules(&step.expected_products),
        pubkeys: keys.rewrite(&step.name, &step.pubkeys)?,
        expected_command,
    })
}

fn assemble_inspection(inspection: &InspectionConfig) -> Inspection {
    Inspection {
        type_: INSPECTION_TYPE.to_string(),
        name: inspection.name.clone(),
        expected_materials: tokenize_rules(&inspection.expected_materials),
        expected_products: tokenize_rules(&inspection.expected_products),
        run: tokenize(&inspection.run),
    }
}
