//! Call resolution - turns proposed calls into validated invocations.
//!
//! Resolution is where the tool-selection policy lives:
//!
//! - calls to unknown tools are rejected,
//! - parameters are validated against the tool's schema, never partially,
//! - identical calls are collapsed,
//! - within an exclusive group only the most specific tool survives.
//!
//! Tools outside any group are all kept, so a query spanning several
//! capabilities keeps every invocation.

use std::collections::HashMap;

use crate::domain::foundation::{QueryId, ValidationError};
use crate::domain::tools::{Specificity, ToolDefinition, ToolInvocation};

use super::ProposedCall;

/// Why a proposed call was not turned into an invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallRejection {
    #[error("unknown tool '{tool}'")]
    UnknownTool { tool: String },

    #[error("invalid parameters for '{tool}': {error}")]
    InvalidParameters { tool: String, error: ValidationError },
}

impl CallRejection {
    pub fn tool(&self) -> &str {
        match self {
            Self::UnknownTool { tool } | Self::InvalidParameters { tool, .. } => tool,
        }
    }
}

/// Result of resolving one proposal.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub invocations: Vec<ToolInvocation>,
    pub rejections: Vec<CallRejection>,
    /// Tool names dropped in favour of a more specific alternative.
    pub superseded: Vec<String>,
}

impl Resolution {
    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }

    /// Correction text for the model, listing every rejected call.
    pub fn feedback(&self, known_tools: &[&str]) -> Option<String> {
        if self.rejections.is_empty() {
            return None;
        }

        let mut out = String::from("Your previous routing had problems:\n");
        for rejection in &self.rejections {
            match rejection {
                CallRejection::UnknownTool { tool } => {
                    out.push_str(&format!(
                        "- '{}' is not an available tool. Available tools: {}\n",
                        tool,
                        if known_tools.is_empty() {
                            "none".to_string()
                        } else {
                            known_tools.join(", ")
                        }
                    ));
                }
                CallRejection::InvalidParameters { tool, error } => {
                    out.push_str(&format!("- parameters for '{}':\n", tool));
                    for line in error.to_feedback().lines() {
                        out.push_str("  ");
                        out.push_str(line);
                        out.push('\n');
                    }
                }
            }
        }
        out.push_str("Reply again with corrected JSON in the same format.");
        Some(out)
    }

    /// Names of everything that did not become an invocation.
    pub fn dropped(&self) -> Vec<String> {
        self.rejections
            .iter()
            .map(|r| r.to_string())
            .chain(
                self.superseded
                    .iter()
                    .map(|t| format!("'{}' superseded by a more specific tool", t)),
            )
            .collect()
    }
}

/// Resolves proposed calls against the available definitions.
pub fn resolve_calls(
    query_id: QueryId,
    calls: &[ProposedCall],
    definitions: &[&ToolDefinition],
) -> Resolution {
    let mut resolution = Resolution::default();

    for call in calls {
        let Some(definition) = definitions.iter().find(|d| d.name() == call.tool) else {
            resolution.rejections.push(CallRejection::UnknownTool {
                tool: call.tool.clone(),
            });
            continue;
        };

        match definition.instantiate(query_id, &call.parameters) {
            Ok(invocation) => {
                if !resolution.invocations.iter().any(|i| i.same_call(&invocation)) {
                    resolution.invocations.push(invocation);
                }
            }
            Err(error) => resolution.rejections.push(CallRejection::InvalidParameters {
                tool: call.tool.clone(),
                error,
            }),
        }
    }

    apply_exclusive_groups(&mut resolution, definitions);
    resolution
}

fn apply_exclusive_groups(resolution: &mut Resolution, definitions: &[&ToolDefinition]) {
    let lookup: HashMap<&str, &ToolDefinition> =
        definitions.iter().map(|d| (d.name(), *d)).collect();

    let mut best: HashMap<&str, Specificity> = HashMap::new();
    for invocation in &resolution.invocations {
        if let Some(def) = lookup.get(invocation.tool_name()) {
            if let Some(group) = def.exclusive_group() {
                let entry = best.entry(group).or_insert(def.specificity());
                if def.specificity() > *entry {
                    *entry = def.specificity();
                }
            }
        }
    }

    let mut superseded = Vec::new();
    resolution.invocations.retain(|invocation| {
        let keep = lookup
            .get(invocation.tool_name())
            .and_then(|def| def.exclusive_group().map(|g| (g, def.specificity())))
            .map_or(true, |(group, specificity)| {
                best.get(group).map_or(true, |top| specificity >= *top)
            });
        if !keep {
            superseded.push(invocation.tool_name().to_string());
        }
        keep
    });
    resolution.superseded.extend(superseded);
}
