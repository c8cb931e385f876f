//! Pathway generation: required set → ordered skills → checkpoints.

use crate::error::PathwayError;
use crate::pathway::{ActivityType, Checkpoint, CheckpointKind, LearningPathway};
use crate::preferences::{LearningStyle, Pace, StudentPreferences};
use skillpath_core::SkillGraph;
use skillpath_core::config::GenerationConfig;
use skillpath_nav::{prerequisite_closure, tiers, topological_order};
use std::collections::BTreeSet;
use tracing::debug;

/// Slack for accumulated float effort when comparing against a budget.
const BUDGET_TOLERANCE: f64 = 1e-9;

/// Rotation used for the mixed learning style.
const MIXED_ROTATION: [ActivityType; 3] = [
    ActivityType::Video,
    ActivityType::Reading,
    ActivityType::Exercise,
];

/// Stateless apart from its thresholds; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct PathwayGenerator {
    config: GenerationConfig,
}

impl PathwayGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Effort units one learning checkpoint may hold at `pace`.
    pub fn budget_for(&self, pace: Pace) -> f64 {
        match pace {
            Pace::Slow => self.config.slow_budget,
            Pace::Standard => self.config.standard_budget,
            Pace::Fast => self.config.fast_budget,
        }
    }

    /// Generate a pathway that takes a student from `mastered` to every skill in `targets`.
    ///
    /// Deterministic: identical graph content, mastered set, targets and preferences
    /// always produce an identical pathway.
    pub fn generate_pathway(
        &self,
        graph: &SkillGraph,
        mastered: &BTreeSet<String>,
        targets: &BTreeSet<String>,
        preferences: &StudentPreferences,
    ) -> Result<LearningPathway, PathwayError> {
        if targets.is_empty() {
            return Err(PathwayError::EmptyTargetSet);
        }
        if let Some(unknown) = targets.iter().find(|t| !graph.contains(t)) {
            return Err(PathwayError::UnknownTargetSkill(unknown.clone()));
        }
        let target_list: Vec<String> = targets.iter().cloned().collect();

        let closure = prerequisite_closure(graph, targets.iter().map(String::as_str))
            .map_err(PathwayError::InvalidSkillGraph)?;
        let required: Vec<&str> = closure
            .iter()
            .filter(|s| !mastered.contains(*s))
            .map(String::as_str)
            .collect();

        if required.is_empty() {
            debug!(targets = ?target_list, "targets already mastered");
            return Ok(LearningPathway::already_mastered(target_list, *preferences));
        }

        let order =
            topological_order(graph, required).map_err(PathwayError::InvalidSkillGraph)?;
        let tier_of = tiers(graph, &order);

        let mut builder = CheckpointBuilder::new(self, preferences);
        for skill in &order {
            let effort = graph.get_skill(skill).map_or(0.0, |s| s.effort);
            let tier = tier_of.get(skill).copied().unwrap_or(0);
            let needs_pending = graph.prerequisites(skill).any(|p| builder.is_pending(p));
            builder.push(skill, effort, tier, needs_pending);
        }
        let pathway = builder.finish(target_list, *preferences);

        debug!(
            targets = ?pathway.targets,
            skills = order.len(),
            checkpoints = pathway.checkpoints.len(),
            total_effort = pathway.total_effort,
            "pathway generated"
        );
        Ok(pathway)
    }
}

/// Accumulates skills in topological order and cuts checkpoints.
///
/// A learning checkpoint closes when the next skill would exceed the pace budget, when
/// the session cap is reached, or at a dependency boundary. At a dependency boundary the
/// pending skills are assessed before the next skill is taught. The next skill is a
/// boundary when one of its direct prerequisites is still pending, or when its tier is
/// neither assessed yet nor already pending.
struct CheckpointBuilder<'g> {
    generator: &'g PathwayGenerator,
    style: LearningStyle,
    budget: f64,
    cap: Option<usize>,
    checkpoints: Vec<Checkpoint>,
    learning_count: usize,
    total_effort: f64,

    current: Vec<String>,
    current_effort: f64,
    current_tier: usize,

    pending: Vec<String>,
    pending_effort: f64,
    pending_tiers: BTreeSet<usize>,
    assessed_tiers: BTreeSet<usize>,
}

impl<'g> CheckpointBuilder<'g> {
    fn new(generator: &'g PathwayGenerator, preferences: &StudentPreferences) -> Self {
        Self {
            generator,
            style: preferences.style,
            budget: generator.budget_for(preferences.pace),
            cap: preferences.max_checkpoints_per_session.filter(|&n| n > 0),
            checkpoints: Vec::new(),
            learning_count: 0,
            total_effort: 0.0,
            current: Vec::new(),
            current_effort: 0.0,
            current_tier: 0,
            pending: Vec::new(),
            pending_effort: 0.0,
            pending_tiers: BTreeSet::new(),
            assessed_tiers: BTreeSet::new(),
        }
    }

    fn is_pending(&self, skill: &str) -> bool {
        self.pending.iter().any(|s| s == skill)
    }

    fn push(&mut self, skill: &str, effort: f64, tier: usize, needs_pending: bool) {
        let new_tier =
            !self.assessed_tiers.contains(&tier) && !self.pending_tiers.contains(&tier);
        if (needs_pending || new_tier) && !self.pending.is_empty() {
            self.close_learning();
            self.close_assessment();
        }

        let over_budget = self.current_effort + effort > self.budget + BUDGET_TOLERANCE;
        let at_cap = self.cap.is_some_and(|cap| self.current.len() >= cap);
        if !self.current.is_empty() && (over_budget || at_cap) {
            self.close_learning();
        }

        self.current.push(skill.to_string());
        self.current_effort += effort;
        self.current_tier = self.current_tier.max(tier);
        self.pending.push(skill.to_string());
        self.pending_effort += effort;
        self.pending_tiers.insert(tier);
    }

    fn activity_for(&self, learning_index: usize) -> ActivityType {
        match self.style {
            LearningStyle::Visual => ActivityType::Video,
            LearningStyle::Reading => ActivityType::Reading,
            LearningStyle::PracticeHeavy => ActivityType::Exercise,
            LearningStyle::Mixed => MIXED_ROTATION[learning_index % MIXED_ROTATION.len()],
        }
    }

    fn close_learning(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let activity = self.activity_for(self.learning_count);
        self.checkpoints.push(Checkpoint {
            index: self.checkpoints.len(),
            kind: CheckpointKind::Learning,
            skills: std::mem::take(&mut self.current),
            activity,
            estimated_duration: self.current_effort,
            tier: self.current_tier,
        });
        self.learning_count += 1;
        self.total_effort += self.current_effort;
        self.current_effort = 0.0;
        self.current_tier = 0;
    }

    fn close_assessment(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let ratio = self.generator.config.assessment_duration_ratio;
        let tier = self.pending_tiers.last().copied().unwrap_or(0);
        self.checkpoints.push(Checkpoint {
            index: self.checkpoints.len(),
            kind: CheckpointKind::Assessment,
            skills: std::mem::take(&mut self.pending),
            activity: ActivityType::Assessment,
            estimated_duration: self.pending_effort * ratio,
            tier,
        });
        self.assessed_tiers.append(&mut self.pending_tiers);
        self.pending_effort = 0.0;
    }

    fn finish(
        mut self,
        targets: Vec<String>,
        preferences: StudentPreferences,
    ) -> LearningPathway {
        self.close_learning();
        self.close_assessment();
        LearningPathway {
            targets,
            preferences,
            checkpoints: self.checkpoints,
            total_effort: self.total_effort,
            notice: None,
        }
    }
}
