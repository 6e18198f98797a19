//! Router accuracy metrics.

use std::collections::BTreeMap;

use serde::Serialize;

use super::CaseResult;

/// Confusion counts for one tool across all cases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ToolMetrics {
    pub fn precision(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolScore {
    #[serde(flatten)]
    pub counts: ToolMetrics,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub exact_matches: usize,
    pub tool_matches: usize,
    /// Exact matches over total.
    pub routing_accuracy: Option<f64>,
    pub tool_selection_accuracy: Option<f64>,
    /// Cases expecting two or more tools.
    pub multi_tool_cases: usize,
    /// Share of multi-tool cases where every expected tool was invoked.
    pub multi_tool_recall: Option<f64>,
    pub per_tool: BTreeMap<String, ToolScore>,
    pub mismatches: Vec<CaseResult>,
}

impl EvaluationReport {
    pub fn from_results(results: Vec<CaseResult>) -> Self {
        let total = results.len();
        let exact_matches = results.iter().filter(|r| r.exact_match).count();
        let tool_matches = results.iter().filter(|r| r.tools_match).count();

        let mut multi_tool_cases = 0usize;
        let mut multi_tool_hits = 0usize;
        let mut counts: BTreeMap<String, ToolMetrics> = BTreeMap::new();

        for result in &results {
            let expected = result.expected_tools();
            let actual = result.actual_tools();

            if expected.len() >= 2 {
                multi_tool_cases += 1;
                if expected.is_subset(&actual) {
                    multi_tool_hits += 1;
                }
            }

            for tool in expected.union(&actual) {
                let metrics = counts.entry((*tool).to_string()).or_default();
                match (expected.contains(tool), actual.contains(tool)) {
                    (true, true) => metrics.true_positives += 1,
                    (false, true) => metrics.false_positives += 1,
                    (true, false) => metrics.false_negatives += 1,
                    (false, false) => {}
                }
            }
        }

        let per_tool = counts
            .into_iter()
            .map(|(tool, counts)| {
                let score = ToolScore {
                    precision: counts.precision(),
                    recall: counts.recall(),
                    counts,
                };
                (tool, score)
            })
            .collect();

        Self {
            total,
            exact_matches,
            tool_matches,
            routing_accuracy: ratio(exact_matches, total),
            tool_selection_accuracy: ratio(tool_matches, total),
            multi_tool_cases,
            multi_tool_recall: ratio(multi_tool_hits, multi_tool_cases),
            per_tool,
            mismatches: results.into_iter().filter(|r| !r.exact_match).collect(),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}
