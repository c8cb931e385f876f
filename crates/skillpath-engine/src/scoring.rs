//! Pathway scoring.
//!
//! The engine only sees the [`PathwayScorer`] trait, so a heuristic or model-backed
//! scorer can be swapped in without touching caching or invalidation.

use serde::Serialize;
use skillpath_core::config::ScoringConfig;
use skillpath_gen::{ActivityType, LearningPathway, LearningStyle};

/// Errors from a scorer. Never fatal to a pathway request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("scorer unavailable: {0}")]
    Unavailable(String),
    #[error("scorer failed: {0}")]
    Failed(String),
}

/// Inputs a scorer may use besides the pathway itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub student_id: &'a str,
    /// Effort units per learning checkpoint at the student's pace.
    pub pace_budget: f64,
    /// Completion rate for pathways of the same shape, when the history store knows one.
    pub completion_history: Option<f64>,
}

/// Non-fatal condition attached to a scored pathway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ScoringWarning {
    /// The configured scorer failed or panicked; the baseline score was used instead.
    ScoringDegraded(String),
    /// The history store failed; the score was computed without completion history.
    HistoryUnavailable(String),
}

impl ScoringWarning {
    pub fn reason(&self) -> &str {
        match self {
            Self::ScoringDegraded(reason) | Self::HistoryUnavailable(reason) => reason,
        }
    }
}

/// Rates a pathway in [0, 1]; higher is a better fit for the student.
pub trait PathwayScorer: Send + Sync {
    fn score(
        &self,
        pathway: &LearningPathway,
        ctx: &ScoringContext<'_>,
    ) -> Result<f64, ScoringError>;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// Weighted mean of three signals, renormalized over the ones available:
///
/// - effort: `1 / (1 + sessions / reference)` where `sessions = total_effort / pace_budget`
/// - alignment: share of learning checkpoints whose activity matches the learning style
/// - history: completion rate for the pathway's shape, if known
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    config: ScoringConfig,
}

impl HeuristicScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score from effort and alignment only. Used when a scorer fails.
    pub fn baseline(&self, pathway: &LearningPathway, pace_budget: f64) -> f64 {
        self.combine(pathway, pace_budget, None)
    }

    pub fn effort_signal(&self, pathway: &LearningPathway, pace_budget: f64) -> f64 {
        if pathway.total_effort <= 0.0 || pace_budget <= 0.0 {
            return 1.0;
        }
        let sessions = pathway.total_effort / pace_budget;
        let reference = self.config.effort_reference_sessions.max(f64::EPSILON);
        1.0 / (1.0 + sessions / reference)
    }

    pub fn alignment_signal(pathway: &LearningPathway) -> f64 {
        let preferred = match pathway.preferences.style {
            LearningStyle::Visual => ActivityType::Video,
            LearningStyle::Reading => ActivityType::Reading,
            LearningStyle::PracticeHeavy => ActivityType::Exercise,
            // Rotation is the preference itself.
            LearningStyle::Mixed => return 1.0,
        };
        let total = pathway.learning_checkpoints().count();
        if total == 0 {
            return 1.0;
        }
        let matching = pathway
            .learning_checkpoints()
            .filter(|c| c.activity == preferred)
            .count();
        matching as f64 / total as f64
    }

    fn combine(&self, pathway: &LearningPathway, pace_budget: f64, history: Option<f64>) -> f64 {
        let mut signals = vec![
            (self.config.effort_weight, self.effort_signal(pathway, pace_budget)),
            (self.config.alignment_weight, Self::alignment_signal(pathway)),
        ];
        if let Some(rate) = history.filter(|r| r.is_finite()) {
            signals.push((self.config.history_weight, rate.clamp(0.0, 1.0)));
        }

        let total_weight: f64 = signals.iter().map(|(w, _)| w.max(0.0)).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = signals.iter().map(|(w, s)| w.max(0.0) * s).sum();
        (weighted / total_weight).clamp(0.0, 1.0)
    }
}

impl PathwayScorer for HeuristicScorer {
    fn score(
        &self,
        pathway: &LearningPathway,
        ctx: &ScoringContext<'_>,
    ) -> Result<f64, ScoringError> {
        Ok(self.combine(pathway, ctx.pace_budget, ctx.completion_history))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillpath_core::{SkillGraph, SkillNode};
    use skillpath_gen::{Pace, PathwayGenerator, StudentPreferences};
    use std::collections::BTreeSet;

    fn pathway(style: LearningStyle, efforts: &[f64]) -> LearningPathway {
        let mut graph = SkillGraph::new();
        let mut targets = BTreeSet::new();
        for (i, effort) in efforts.iter().enumerate() {
            let id = format!("S{i}");
            graph.add_skill(SkillNode::new(&id, &id, 0, *effort)).unwrap();
            targets.insert(id);
        }
        PathwayGenerator::default()
            .generate_pathway(
                &graph,
                &BTreeSet::new(),
                &targets,
                &StudentPreferences::new(style, Pace::Standard),
            )
            .unwrap()
    }

    fn ctx(history: Option<f64>) -> ScoringContext<'static> {
        ScoringContext {
            student_id: "ana",
            pace_budget: 2.0,
            completion_history: history,
        }
    }

    #[test]
    fn test_effort_signal_decreases_with_effort() {
        let scorer = HeuristicScorer::default();
        let small = pathway(LearningStyle::Visual, &[1.0]);
        let large = pathway(LearningStyle::Visual, &[2.0, 2.0, 2.0, 2.0]);
        assert!(scorer.effort_signal(&small, 2.0) > scorer.effort_signal(&large, 2.0));
        // 20 effort units at 2 per session = 10 sessions = the reference point.
        let reference = pathway(LearningStyle::Visual, &[2.0; 10]);
        assert!((scorer.effort_signal(&reference, 2.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_signal() {
        let visual = pathway(LearningStyle::Visual, &[2.0, 2.0]);
        assert_eq!(HeuristicScorer::alignment_signal(&visual), 1.0);

        let mut misaligned = visual.clone();
        misaligned.checkpoints[0].activity = ActivityType::Reading;
        assert_eq!(HeuristicScorer::alignment_signal(&misaligned), 0.5);

        let mixed = pathway(LearningStyle::Mixed, &[2.0, 2.0, 2.0]);
        assert_eq!(HeuristicScorer::alignment_signal(&mixed), 1.0);
    }

    #[test]
    fn test_missing_history_renormalizes_weights() {
        let scorer = HeuristicScorer::default();
        let p = pathway(LearningStyle::Visual, &[2.0; 10]);
        // effort 0.5 (weight 0.4), alignment 1.0 (weight 0.3): 0.5 / 0.7
        let without = scorer.score(&p, &ctx(None)).unwrap();
        assert!((without - 0.5 / 0.7).abs() < 1e-12);
        assert_eq!(without, scorer.baseline(&p, 2.0));

        // plus history 0.0 at weight 0.3: 0.5 / 1.0
        let with = scorer.score(&p, &ctx(Some(0.0))).unwrap();
        assert!((with - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        let scorer = HeuristicScorer::default();
        let p = pathway(LearningStyle::Reading, &[0.5]);
        for history in [None, Some(-3.0), Some(7.0), Some(f64::NAN)] {
            let score = scorer.score(&p, &ctx(history)).unwrap();
            assert!((0.0..=1.0).contains(&score), "{score} out of range");
        }
    }

    #[test]
    fn test_zero_weights_score_zero() {
        let scorer = HeuristicScorer::new(ScoringConfig {
            effort_weight: 0.0,
            history_weight: 0.0,
            alignment_weight: 0.0,
            ..ScoringConfig::default()
        });
        let p = pathway(LearningStyle::Visual, &[1.0]);
        assert_eq!(scorer.score(&p, &ctx(Some(1.0))).unwrap(), 0.0);
    }

    #[test]
    fn test_warning_serializes_with_reason() {
        let warning = ScoringWarning::ScoringDegraded("boom".into());
        assert_eq!(warning.reason(), "boom");
        assert_eq!(
            serde_json::to_string(&warning).unwrap(),
            r#"{"kind":"scoring_degraded","reason":"boom"}"#
        );
    }
}
