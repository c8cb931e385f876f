//! The personalization engine: scored, cached pathway generation per student.

use crate::cache::{CacheKey, CacheStats, PathwayCache, ScoredPathway};
use crate::error::EngineError;
use crate::scoring::{HeuristicScorer, PathwayScorer, ScoringContext, ScoringWarning};
use crate::store::{HistoryStore, MasteryStore, PreferenceStore};
use chrono::Utc;
use dashmap::DashMap;
use rayon::prelude::*;
use skillpath_core::{SharedSkillGraph, SkillGraph};
use skillpath_core::config::SkillpathConfig;
use skillpath_gen::{LearningPathway, PathwayGenerator, StudentPreferences};
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

type Flight = Arc<OnceLock<Result<ScoredPathway, EngineError>>>;

/// Wraps [`PathwayGenerator`] with scoring, a per-student cache and single-flight
/// generation.
///
/// Concurrent requests for the same uncached key share one generation; requests for
/// other keys never wait on it.
pub struct PersonalizationEngine {
    graph: Arc<SharedSkillGraph>,
    generator: PathwayGenerator,
    /// Custom scorer; `baseline` scores when unset.
    scorer: Option<Arc<dyn PathwayScorer>>,
    baseline: HeuristicScorer,
    mastery: Arc<dyn MasteryStore>,
    preferences: Arc<dyn PreferenceStore>,
    history: Option<Arc<dyn HistoryStore>>,
    cache: Arc<PathwayCache>,
    inflight: DashMap<CacheKey, Flight>,
}

impl PersonalizationEngine {
    /// Engine with default configuration, the heuristic scorer and no history store.
    pub fn new(
        graph: Arc<SharedSkillGraph>,
        mastery: Arc<dyn MasteryStore>,
        preferences: Arc<dyn PreferenceStore>,
        cache: Arc<PathwayCache>,
    ) -> Self {
        Self {
            graph,
            generator: PathwayGenerator::default(),
            scorer: None,
            baseline: HeuristicScorer::default(),
            mastery,
            preferences,
            history: None,
            cache,
            inflight: DashMap::new(),
        }
    }

    /// Apply generation thresholds and heuristic weights.
    #[must_use]
    pub fn with_config(mut self, config: &SkillpathConfig) -> Self {
        self.generator = PathwayGenerator::new(config.generation.clone());
        self.baseline = HeuristicScorer::new(config.scoring.clone());
        self
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn PathwayScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn graph(&self) -> &Arc<SharedSkillGraph> {
        &self.graph
    }

    pub fn cache(&self) -> &Arc<PathwayCache> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached pathway for one student. Returns how many were removed.
    pub fn invalidate_student(&self, student_id: &str) -> usize {
        let removed = self.cache.invalidate_student(student_id);
        debug!(student = %student_id, removed, "student cache invalidated");
        removed
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Scored pathway from the student's current mastery to one target skill.
    ///
    /// Returns the cached pathway unchanged when one is valid for the student's current
    /// mastery, preferences and graph revision, unless `force_refresh` is set.
    pub fn get_learning_pathway(
        &self,
        student_id: &str,
        target_skill_id: &str,
        force_refresh: bool,
    ) -> Result<ScoredPathway, EngineError> {
        let targets = BTreeSet::from([target_skill_id.to_string()]);
        self.get_pathway_for_targets(student_id, targets, force_refresh)
    }

    /// As [`Self::get_learning_pathway`] for several targets in one pathway.
    pub fn get_pathway_for_targets(
        &self,
        student_id: &str,
        targets: BTreeSet<String>,
        force_refresh: bool,
    ) -> Result<ScoredPathway, EngineError> {
        let mastered = self.mastery.get_mastered_skills(student_id)?;
        let preferences = self.preferences.get_preferences(student_id)?;
        let snapshot = self.graph.snapshot();
        let key = CacheKey::new(
            student_id,
            targets,
            &mastered,
            &preferences,
            snapshot.revision,
        );

        if force_refresh {
            self.cache.remove(&key);
        } else if let Some(hit) = self.cache.get(&key) {
            debug!(student = %student_id, targets = ?key.targets, "pathway cache hit");
            return Ok(hit);
        }

        let flight = self.join_flight(&key, force_refresh);
        let result = flight
            .get_or_init(|| {
                // A flight that finished just before this one started has already cached.
                if !force_refresh && let Some(hit) = self.cache.peek(&key) {
                    return Ok(hit);
                }
                self.generate(&key, &snapshot, &mastered, &preferences)
            })
            .clone();

        self.inflight
            .remove_if(&key, |_, current| Arc::ptr_eq(current, &flight));
        result
    }

    /// The flight for `key`, created if absent.
    ///
    /// A finished flight stays registered until its owner removes it; a forced request
    /// replaces it instead of reading its old result.
    fn join_flight(&self, key: &CacheKey, force_refresh: bool) -> Flight {
        let mut slot = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceLock::new()));
        if force_refresh && slot.value().get().is_some() {
            *slot.value_mut() = Arc::new(OnceLock::new());
        }
        slot.value().clone()
    }

    /// Generate pathways for several targets in parallel, e.g. ahead of a dashboard load.
    pub fn warm(
        &self,
        student_id: &str,
        targets: &[&str],
    ) -> Vec<Result<ScoredPathway, EngineError>> {
        targets
            .par_iter()
            .map(|target| self.get_learning_pathway(student_id, target, false))
            .collect()
    }

    fn generate(
        &self,
        key: &CacheKey,
        graph: &SkillGraph,
        mastered: &BTreeSet<String>,
        preferences: &StudentPreferences,
    ) -> Result<ScoredPathway, EngineError> {
        let pathway = self
            .generator
            .generate_pathway(graph, mastered, &key.targets, preferences)?;
        self.cache.record_generation();
        debug!(
            student = %key.student_id,
            targets = ?key.targets,
            checkpoints = pathway.checkpoints.len(),
            "pathway generated"
        );

        let scored = self.score(&key.student_id, pathway, preferences);
        self.cache.insert(key.clone(), scored.clone());
        Ok(scored)
    }

    /// Score a pathway. Never fails: scorer errors and panics fall back to the
    /// baseline heuristic with a `ScoringDegraded` warning.
    fn score(
        &self,
        student_id: &str,
        pathway: LearningPathway,
        preferences: &StudentPreferences,
    ) -> ScoredPathway {
        let mut warnings = Vec::new();
        let pace_budget = self.generator.budget_for(preferences.pace);

        let completion_history = self.history.as_ref().and_then(|store| {
            let signature = pathway.shape().signature();
            store
                .get_completion_history(student_id, &signature)
                .unwrap_or_else(|err| {
                    warn!(
                        student = %student_id,
                        error = %err,
                        "completion history unavailable"
                    );
                    warnings.push(ScoringWarning::HistoryUnavailable(err.to_string()));
                    None
                })
        });

        let ctx = ScoringContext {
            student_id,
            pace_budget,
            completion_history,
        };
        let scorer: &dyn PathwayScorer = self.scorer.as_deref().unwrap_or(&self.baseline);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| scorer.score(&pathway, &ctx)));

        let score = match outcome {
            Ok(Ok(score)) if score.is_finite() => score.clamp(0.0, 1.0),
            failed => {
                let reason = match failed {
                    Ok(Ok(score)) => format!("non-finite score {score}"),
                    Ok(Err(err)) => err.to_string(),
                    Err(payload) => {
                        format!("scorer panicked: {}", panic_message(payload.as_ref()))
                    }
                };
                warn!(
                    student = %student_id,
                    scorer = scorer.name(),
                    %reason,
                    "scoring degraded, using baseline"
                );
                warnings.push(ScoringWarning::ScoringDegraded(reason));
                self.baseline.baseline(&pathway, pace_budget)
            }
        };

        ScoredPathway {
            pathway: Arc::new(pathway),
            score,
            generated_at: Utc::now(),
            warnings,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringError;
    use crate::store::MemoryStore;
    use skillpath_core::SkillNode;

    fn engine() -> (PersonalizationEngine, Arc<MemoryStore>) {
        let shared = SharedSkillGraph::default();
        for id in ["A", "B", "C"] {
            shared.add_skill(SkillNode::new(id, id, 0, 1.0)).unwrap();
        }
        shared.add_prerequisite("A", "B").unwrap();
        shared.add_prerequisite("B", "C").unwrap();

        let store = Arc::new(MemoryStore::new());
        let engine = PersonalizationEngine::new(
            Arc::new(shared),
            store.clone(),
            store.clone(),
            Arc::new(PathwayCache::new(4)),
        );
        (engine, store)
    }

    struct FixedScorer(Result<f64, ScoringError>);

    impl PathwayScorer for FixedScorer {
        fn score(
            &self,
            _pathway: &LearningPathway,
            _ctx: &ScoringContext<'_>,
        ) -> Result<f64, ScoringError> {
            self.0.clone()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_custom_scorer_is_used_and_clamped() {
        let (engine, _) = engine();
        let engine = engine.with_scorer(Arc::new(FixedScorer(Ok(1.5))));
        let scored = engine.get_learning_pathway("ana", "C", false).unwrap();
        assert_eq!(scored.score, 1.0);
        assert!(scored.warnings.is_empty());
    }

    #[test]
    fn test_non_finite_score_degrades() {
        let (engine, _) = engine();
        let engine = engine.with_scorer(Arc::new(FixedScorer(Ok(f64::NAN))));
        let scored = engine.get_learning_pathway("ana", "C", false).unwrap();
        assert!(scored.is_degraded());
        assert!((0.0..=1.0).contains(&scored.score));
    }

    #[test]
    fn test_config_reaches_generator() {
        let (engine, _) = engine();
        let mut config = SkillpathConfig::default();
        config.generation.assessment_duration_ratio = 1.0;
        let engine = engine.with_config(&config);
        let scored = engine.get_learning_pathway("ana", "C", false).unwrap();
        let assessment = scored.pathway.assessments().next().unwrap();
        assert_eq!(assessment.estimated_duration, 1.0);
        assert_eq!(engine.stats().generations, 1);
    }

    #[test]
    fn test_force_refresh_replaces_finished_flight() {
        let (engine, _) = engine();
        let first = engine.get_learning_pathway("ana", "C", false).unwrap();

        // A flight whose result is set but which its owner has not yet deregistered.
        let key = CacheKey::new(
            "ana",
            BTreeSet::from(["C".to_string()]),
            &BTreeSet::new(),
            &StudentPreferences::default(),
            engine.graph().revision(),
        );
        let finished: Flight = Arc::new(OnceLock::new());
        let _ = finished.set(Ok(first.clone()));
        engine.inflight.insert(key.clone(), finished);

        let refreshed = engine.get_learning_pathway("ana", "C", true).unwrap();
        assert!(!Arc::ptr_eq(&first.pathway, &refreshed.pathway));
        assert_eq!(engine.stats().generations, 2);

        let cached = engine.cache().peek(&key).unwrap();
        assert!(Arc::ptr_eq(&cached.pathway, &refreshed.pathway));
    }

    #[test]
    fn test_errors_propagate_unchanged() {
        let (engine, _) = engine();
        let err = engine.get_learning_pathway("ana", "Z", false).unwrap_err();
        assert_eq!(
            err,
            EngineError::Pathway(skillpath_gen::PathwayError::UnknownTargetSkill("Z".into()))
        );
        // Failed requests leave nothing in flight or in the cache.
        assert!(engine.inflight.is_empty());
        assert!(engine.cache().is_empty());
    }
}
