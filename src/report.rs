//! Reporting of stack analyses
//!
//! - [`JsonReport`]: machine-readable form of an [`Analysis`] (`--format json`)
//! - [`failure_summary`]: the short lines a test harness logs when an
//!   assertion fails

use crate::analysis::{Analysis, Transition};
use crate::analyzer;
use crate::frame::Frame;
use crate::zone::Zone;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTransition {
    /// Calling frame (absent below the oldest observed frame)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoker: Option<Frame>,
    /// Called frame (absent past the most recent observed frame)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoked: Option<Frame>,
    /// Names of the zones entered here
    pub entered_zones: Vec<String>,
    /// True when execution left every tracked zone
    pub exit: bool,
    /// Rendered line, as printed in text mode
    pub line: String,
}

impl From<&Transition> for JsonTransition {
    fn from(transition: &Transition) -> Self {
        Self {
            invoker: transition.invoker.clone(),
            invoked: transition.invoked.clone(),
            entered_zones: transition
                .entered_zones
                .iter()
                .map(|zone| zone.name().to_string())
                .collect(),
            exit: transition.is_exit(),
            line: transition.to_string(),
        }
    }
}

/// Complete analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    /// Transitions in chronological order
    pub transitions: Vec<JsonTransition>,
    /// Zone name → index of its entry transition (null if never entered)
    pub entry_points: BTreeMap<String, Option<usize>>,
    /// Index of the last transition (null if there are none)
    pub exit_point: Option<usize>,
}

impl JsonReport {
    /// Build a report for `analysis`, listing entry points of `zones`
    pub fn new(analysis: &Analysis, zones: &[Zone]) -> Self {
        let entry_points = zones
            .iter()
            .map(|zone| (zone.name().to_string(), analysis.entry_index(zone)))
            .collect();

        Self {
            transitions: analysis.transitions().iter().map(JsonTransition::from).collect(),
            entry_points,
            exit_point: analysis.len().checked_sub(1),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Summarize where a failure happened relative to `zones`
///
/// Produces `FAILED AT: [<invoker>]` followed by one `<zone> ENTRY: ...` line
/// per zone. Diagnostics must not turn into a second failure: a zone
/// configuration error is logged and reported as a single
/// `diagnostics unavailable` line.
pub fn failure_summary(stack: &[Frame], zones: &[Zone]) -> Vec<String> {
    let analysis = match analyzer::process(Some(stack), zones) {
        Ok(Some(analysis)) => analysis,
        Ok(None) => return vec!["diagnostics unavailable: no zones to analyze".to_string()],
        Err(e) => {
            tracing::warn!("Stack analysis failed: {}", e);
            return vec![format!("diagnostics unavailable: {}", e)];
        }
    };

    let mut lines = Vec::with_capacity(zones.len() + 1);
    match analysis.exit_point() {
        Some(exit) => lines.push(format!("FAILED AT: [{}]", exit.invoker_point())),
        None => lines.push("FAILED AT: [<outside all zones>]".to_string()),
    }

    for zone in zones {
        match analysis.entry_point(zone) {
            Some(entry) => lines.push(format!("{} ENTRY: {}", zone.name(), entry)),
            None => lines.push(format!("{} ENTRY: never entered", zone.name())),
        }
    }
    lines
}
