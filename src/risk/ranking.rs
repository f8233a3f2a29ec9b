use super::ScoreLevel;
use crate::models::payload::PredFlag;
use crate::models::ClassifierRecord;
use serde::Serialize;
use std::cmp::Ordering;

/// Which rule of the selection policy decided a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    /// score >= threshold
    Threshold,
    /// pred is 1, true or "high"
    Flag,
    /// score >= fallback cutoff
    FallbackCutoff,
}

/// Policy parameters. Stack-allocated.
#[derive(Debug, Clone, Copy)]
pub struct RankingPolicy {
    pub fallback_cutoff: f64,
    pub limit: usize,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self { fallback_cutoff: 0.5, limit: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskEntry {
    /// 1-based position in the ranked table.
    pub rank: usize,
    pub patient_id: Option<String>,
    pub score: Option<f64>,
    pub pred: Option<PredFlag>,
    pub threshold: Option<f64>,
    pub rule: SelectionRule,
    pub level: Option<ScoreLevel>,
}

/// Evaluate the selection policy for one record. First matching rule wins:
///   1. threshold and score present: score >= threshold
///   2. pred present: pred marks high risk
///   3. score present: score >= fallback cutoff
///   4. otherwise not selected
///
/// Returns the deciding rule when the record is selected.
#[inline]
pub fn select(record: &ClassifierRecord, fallback_cutoff: f64) -> Option<SelectionRule> {
    match (record.score, record.threshold, &record.pred) {
        (Some(score), Some(threshold), _) => (score >= threshold).then_some(SelectionRule::Threshold),
        (_, _, Some(pred)) => pred.marks_high_risk().then_some(SelectionRule::Flag),
        (Some(score), _, None) => (score >= fallback_cutoff).then_some(SelectionRule::FallbackCutoff),
        (None, _, None) => None,
    }
}

/// Select, order and truncate the high-risk records of a classifier series.
///
/// Ordering is descending by score with a missing score counted as 0; the
/// sort is stable, so ties keep payload order.
pub fn rank(series: &[ClassifierRecord], policy: &RankingPolicy) -> Vec<HighRiskEntry> {
    let mut selected: Vec<(&ClassifierRecord, SelectionRule)> = series
        .iter()
        .filter_map(|r| select(r, policy.fallback_cutoff).map(|rule| (r, rule)))
        .collect();

    // slice::sort_by is stable
    selected.sort_by(|(a, _), (b, _)| {
        let sa = a.score.unwrap_or(0.0);
        let sb = b.score.unwrap_or(0.0);
        sb.partial_cmp(&sa).unwrap_or(Ordering::Equal)
    });

    selected
        .into_iter()
        .take(policy.limit)
        .enumerate()
        .map(|(i, (r, rule))| HighRiskEntry {
            rank: i + 1,
            patient_id: r.patient_id.clone(),
            score: r.score,
            pred: r.pred.clone(),
            threshold: r.threshold,
            rule,
            level: r.score.map(ScoreLevel::from_score),
        })
        .collect()
}

/// Share of records the selection policy marks positive. `None` for an empty series.
pub fn positive_rate(series: &[ClassifierRecord], fallback_cutoff: f64) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let positives = series
        .iter()
        .filter(|r| select(r, fallback_cutoff).is_some())
        .count();
    Some(positives as f64 / series.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(pid: &str, score: Option<f64>, pred: Option<serde_json::Value>, threshold: Option<f64>) -> ClassifierRecord {
        ClassifierRecord {
            patient_id: Some(pid.to_string()),
            score,
            pred: pred.as_ref().and_then(PredFlag::from_value),
            threshold,
        }
    }

    fn ids(entries: &[HighRiskEntry]) -> Vec<String> {
        entries.iter().map(|e| e.patient_id.clone().unwrap()).collect()
    }

    #[test]
    fn test_mixed_policy_selection_and_order() {
        let series = vec![
            rec("1", Some(0.9), None, Some(0.8)),
            rec("2", Some(0.5), None, Some(0.8)),
            rec("3", None, Some(json!(true)), None),
            rec("4", Some(0.95), None, None),
        ];
        let ranked = rank(&series, &RankingPolicy::default());
        assert_eq!(ids(&ranked), vec!["4", "1", "3"]);
        assert_eq!(ranked[0].rule, SelectionRule::FallbackCutoff);
        assert_eq!(ranked[1].rule, SelectionRule::Threshold);
        assert_eq!(ranked[2].rule, SelectionRule::Flag);
        assert_eq!(ranked.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(ranked[2].level, None, "no score, no level");
    }

    #[test]
    fn test_threshold_rule_beats_flag() {
        // threshold + score present: pred is ignored
        let r = rec("a", Some(0.3), Some(json!(1)), Some(0.5));
        assert_eq!(select(&r, 0.5), None);
        let r = rec("b", Some(0.7), Some(json!(0)), Some(0.5));
        assert_eq!(select(&r, 0.5), Some(SelectionRule::Threshold));
    }

    #[test]
    fn test_flag_rule_beats_fallback_cutoff() {
        // pred present without threshold: score is not compared to the cutoff
        let r = rec("a", Some(0.99), Some(json!(0)), None);
        assert_eq!(select(&r, 0.5), None);
        let r = rec("b", Some(0.1), Some(json!("high")), None);
        assert_eq!(select(&r, 0.5), Some(SelectionRule::Flag));
    }

    #[test]
    fn test_threshold_without_score_falls_to_flag() {
        let r = rec("a", None, Some(json!(1)), Some(0.5));
        assert_eq!(select(&r, 0.5), Some(SelectionRule::Flag));
        let r = rec("b", None, None, Some(0.5));
        assert_eq!(select(&r, 0.5), None);
    }

    #[test]
    fn test_fallback_cutoff_boundary() {
        assert_eq!(select(&rec("a", Some(0.5), None, None), 0.5), Some(SelectionRule::FallbackCutoff));
        assert_eq!(select(&rec("b", Some(0.4999), None, None), 0.5), None);
        assert_eq!(select(&rec("c", Some(0.3), None, None), 0.25), Some(SelectionRule::FallbackCutoff));
    }

    #[test]
    fn test_ties_keep_payload_order() {
        let series = vec![
            rec("first", Some(0.7), None, None),
            rec("second", Some(0.7), None, None),
            rec("flag-a", None, Some(json!(1)), None),
            rec("third", Some(0.7), None, None),
            rec("flag-b", None, Some(json!(true)), None),
        ];
        let ranked = rank(&series, &RankingPolicy::default());
        assert_eq!(ids(&ranked), vec!["first", "second", "third", "flag-a", "flag-b"]);
    }

    #[test]
    fn test_limit_truncates() {
        let series: Vec<_> = (0..50)
            .map(|i| rec(&format!("p{i}"), Some(0.5 + i as f64 / 100.0), None, None))
            .collect();
        let ranked = rank(&series, &RankingPolicy::default());
        assert_eq!(ranked.len(), 20);
        assert_eq!(ranked[0].patient_id.as_deref(), Some("p49"));

        let ranked = rank(&series, &RankingPolicy { fallback_cutoff: 0.5, limit: 3 });
        assert_eq!(ids(&ranked), vec!["p49", "p48", "p47"]);
    }

    #[test]
    fn test_empty_series() {
        assert!(rank(&[], &RankingPolicy::default()).is_empty());
        assert_eq!(positive_rate(&[], 0.5), None);
    }

    #[test]
    fn test_positive_rate() {
        let series = vec![
            rec("1", Some(0.9), None, Some(0.8)),
            rec("2", Some(0.5), None, Some(0.8)),
            rec("3", None, None, None),
            rec("4", Some(0.95), None, None),
        ];
        let rate = positive_rate(&series, 0.5).unwrap();
        assert!((rate - 0.5).abs() < 1e-12, "rate={rate}");
    }
}
