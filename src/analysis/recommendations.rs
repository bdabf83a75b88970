//! Recommendation composition: attach actions, rationale and savings
//! estimates to raw findings.

use std::collections::HashMap;

use crate::core::{
    PotentialSavings, Priority, Recommendation, RecommendedAction, RedundancyFinding, TestFeature,
};

/// Enrich findings in order, preserving the analyzer's sort.
pub fn compose(findings: Vec<RedundancyFinding>, features: &[TestFeature]) -> Vec<Recommendation> {
    let by_id: HashMap<&str, &TestFeature> = features
        .iter()
        .map(|f| (f.test_id.as_str(), f))
        .collect();

    findings
        .into_iter()
        .map(|finding| compose_one(finding, &by_id))
        .collect()
}

fn compose_one(
    finding: RedundancyFinding,
    by_id: &HashMap<&str, &TestFeature>,
) -> Recommendation {
    let action = action_for(finding.redundancy_score);
    let rationale = rationale_for(&finding);
    let numeric_priority = numeric_priority(&finding);
    let potential_savings = savings_for(&finding, by_id);

    Recommendation {
        finding,
        action,
        rationale,
        numeric_priority,
        potential_savings,
    }
}

fn action_for(score: f64) -> RecommendedAction {
    if score >= 0.95 {
        RecommendedAction::Merge
    } else if score >= 0.85 {
        RecommendedAction::Consolidate
    } else if score >= 0.70 {
        RecommendedAction::Review
    } else {
        RecommendedAction::Monitor
    }
}

fn rationale_for(finding: &RedundancyFinding) -> Vec<String> {
    let mut bullets = Vec::new();
    let pct = (finding.redundancy_score * 100.0).round() as i64;

    if finding.redundancy_score >= 0.95 {
        bullets.push(format!(
            "Tests in this cluster are {pct}% similar; they exercise the same behavior."
        ));
    } else if finding.redundancy_score >= 0.85 {
        bullets.push(format!(
            "Tests in this cluster overlap heavily ({pct}% similarity)."
        ));
    } else {
        bullets.push(format!("Tests in this cluster are related ({pct}% similarity)."));
    }

    bullets.push(format!(
        "Removing {} of {} tests keeps the representative's coverage within the 95% preservation gate.",
        finding.redundant_tests.len(),
        finding.analysis.cluster_size,
    ));

    if finding.analysis.execution_time_saved_sec > 0.0 {
        bullets.push(format!(
            "Estimated {:.1}s saved per suite run.",
            finding.analysis.execution_time_saved_sec
        ));
    }
    bullets
}

/// Scalar priority for ranking across reports: a priority-band base plus
/// score, set-size and time-saved components.
fn numeric_priority(finding: &RedundancyFinding) -> f64 {
    let base = match finding.priority {
        Priority::High => 100.0,
        Priority::Medium => 50.0,
        Priority::Low => 10.0,
    };
    let saved_ms = finding.analysis.execution_time_saved_sec * 1000.0;
    base + finding.redundancy_score * 20.0
        + (finding.redundant_tests.len() as f64 * 2.0).min(20.0)
        + (saved_ms / 100.0).min(10.0)
}

fn savings_for(
    finding: &RedundancyFinding,
    by_id: &HashMap<&str, &TestFeature>,
) -> PotentialSavings {
    let time_saved_ms: u64 = finding
        .redundant_tests
        .iter()
        .filter_map(|id| by_id.get(id.as_str()))
        .map(|f| f.metadata.execution_time_ms)
        .sum();
    let lines_reduction: usize = finding
        .redundant_tests
        .iter()
        .filter_map(|id| by_id.get(id.as_str()))
        .map(|f| f.metadata.lines_covered)
        .sum();
    let test_count_reduction = finding.redundant_tests.len();
    let percentage_reduction =
        test_count_reduction as f64 / finding.analysis.cluster_size as f64 * 100.0;

    PotentialSavings {
        time_saved_ms,
        time_saved_sec: time_saved_ms as f64 / 1000.0,
        lines_reduction,
        test_count_reduction,
        percentage_reduction,
    }
}
