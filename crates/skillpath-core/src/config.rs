//! Configuration for pathway generation, scoring and caching.
//!
//! Load order: TOML file (optional) → `SKILLPATH_*` environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level skillpath configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillpathConfig {
    pub generation: GenerationConfig,
    pub scoring: ScoringConfig,
    pub cache: CacheConfig,
}

/// Checkpoint grouping thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Effort units a slow-paced checkpoint may hold.
    pub slow_budget: f64,
    /// Effort units a standard-paced checkpoint may hold.
    pub standard_budget: f64,
    /// Effort units a fast-paced checkpoint may hold.
    pub fast_budget: f64,
    /// Assessment duration as a fraction of the effort it covers.
    pub assessment_duration_ratio: f64,
}

/// Weights for the pathway score. Renormalized over the signals actually present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub effort_weight: f64,
    pub history_weight: f64,
    pub alignment_weight: f64,
    /// Number of sessions at which the effort signal falls to 0.5.
    pub effort_reference_sessions: f64,
}

/// Pathway cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Most-recent target pathways kept per student before LRU eviction.
    pub per_student_capacity: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            slow_budget: 1.0,
            standard_budget: 2.0,
            fast_budget: 3.0,
            assessment_duration_ratio: 0.25,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            effort_weight: 0.4,
            history_weight: 0.3,
            alignment_weight: 0.3,
            effort_reference_sessions: 10.0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            per_student_capacity: 16,
        }
    }
}

/// Parse the variable `var` from `lookup` and apply it to a config field.
/// Unset or unparsable values leave the field unchanged.
fn env_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    target: &mut T,
) {
    if let Some(v) = lookup(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl SkillpathConfig {
    /// Load config from a TOML file with env var overrides.
    /// Falls back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|var| std::env::var(var).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `SKILLPATH_*` overrides, reading each variable through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let g = &mut self.generation;
        env_override(&lookup, "SKILLPATH_SLOW_BUDGET", &mut g.slow_budget);
        env_override(&lookup, "SKILLPATH_STANDARD_BUDGET", &mut g.standard_budget);
        env_override(&lookup, "SKILLPATH_FAST_BUDGET", &mut g.fast_budget);
        env_override(
            &lookup,
            "SKILLPATH_ASSESSMENT_RATIO",
            &mut g.assessment_duration_ratio,
        );

        let s = &mut self.scoring;
        env_override(&lookup, "SKILLPATH_EFFORT_WEIGHT", &mut s.effort_weight);
        env_override(&lookup, "SKILLPATH_HISTORY_WEIGHT", &mut s.history_weight);
        env_override(&lookup, "SKILLPATH_ALIGNMENT_WEIGHT", &mut s.alignment_weight);
        env_override(
            &lookup,
            "SKILLPATH_EFFORT_REFERENCE",
            &mut s.effort_reference_sessions,
        );

        env_override(
            &lookup,
            "SKILLPATH_CACHE_CAPACITY",
            &mut self.cache.per_student_capacity,
        );
    }

    /// Reject settings that would make grouping or scoring meaningless.
    pub fn validate(&self) -> Result<()> {
        let g = &self.generation;
        for (name, budget) in [
            ("slow_budget", g.slow_budget),
            ("standard_budget", g.standard_budget),
            ("fast_budget", g.fast_budget),
        ] {
            if !budget.is_finite() || budget <= 0.0 {
                anyhow::bail!("{name} must be a positive number, got {budget}");
            }
        }
        if !g.assessment_duration_ratio.is_finite() || g.assessment_duration_ratio < 0.0 {
            anyhow::bail!(
                "assessment_duration_ratio must be non-negative, got {}",
                g.assessment_duration_ratio
            );
        }

        let s = &self.scoring;
        for (name, weight) in [
            ("effort_weight", s.effort_weight),
            ("history_weight", s.history_weight),
            ("alignment_weight", s.alignment_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                anyhow::bail!("{name} must be non-negative, got {weight}");
            }
        }
        // History is optional, so the remaining signals must carry weight on their own.
        if s.effort_weight + s.alignment_weight <= 0.0 {
            anyhow::bail!("effort_weight + alignment_weight must be positive");
        }
        if !s.effort_reference_sessions.is_finite() || s.effort_reference_sessions <= 0.0 {
            anyhow::bail!(
                "effort_reference_sessions must be positive, got {}",
                s.effort_reference_sessions
            );
        }

        if self.cache.per_student_capacity == 0 {
            anyhow::bail!("cache.per_student_capacity must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SkillpathConfig::default();
        assert_eq!(config.generation.slow_budget, 1.0);
        assert_eq!(config.generation.standard_budget, 2.0);
        assert_eq!(config.generation.fast_budget, 3.0);
        assert_eq!(config.scoring.effort_weight, 0.4);
        assert_eq!(config.cache.per_student_capacity, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[generation]
standard_budget = 4.0

[cache]
per_student_capacity = 3
"#;
        let config: SkillpathConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generation.standard_budget, 4.0);
        assert_eq!(config.cache.per_student_capacity, 3);
        // Defaults for unspecified fields
        assert_eq!(config.generation.fast_budget, 3.0);
        assert_eq!(config.scoring.history_weight, 0.3);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = SkillpathConfig::load(Path::new("/nonexistent/skillpath.toml")).unwrap();
        assert_eq!(config.generation.standard_budget, 2.0);
    }

    #[test]
    fn test_load_rejects_zero_budget() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("skillpath.toml");
        std::fs::write(&path, "[generation]\nslow_budget = 0.0\n").unwrap();

        let err = SkillpathConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("slow_budget"));
    }

    #[test]
    fn test_overrides_cover_every_field() {
        let vars: std::collections::HashMap<&str, &str> = [
            ("SKILLPATH_SLOW_BUDGET", "1.5"),
            ("SKILLPATH_STANDARD_BUDGET", "2.5"),
            ("SKILLPATH_FAST_BUDGET", "3.5"),
            ("SKILLPATH_ASSESSMENT_RATIO", "0.5"),
            ("SKILLPATH_EFFORT_WEIGHT", "0.2"),
            ("SKILLPATH_HISTORY_WEIGHT", "0.1"),
            ("SKILLPATH_ALIGNMENT_WEIGHT", "0.7"),
            ("SKILLPATH_EFFORT_REFERENCE", "4.0"),
            ("SKILLPATH_CACHE_CAPACITY", "8"),
        ]
        .into();
        let mut config = SkillpathConfig::default();
        config.apply_overrides(|var| vars.get(var).map(|v| (*v).to_string()));

        assert_eq!(config.generation.slow_budget, 1.5);
        assert_eq!(config.generation.standard_budget, 2.5);
        assert_eq!(config.generation.fast_budget, 3.5);
        assert_eq!(config.generation.assessment_duration_ratio, 0.5);
        assert_eq!(config.scoring.effort_weight, 0.2);
        assert_eq!(config.scoring.history_weight, 0.1);
        assert_eq!(config.scoring.alignment_weight, 0.7);
        assert_eq!(config.scoring.effort_reference_sessions, 4.0);
        assert_eq!(config.cache.per_student_capacity, 8);
    }

    #[test]
    fn test_unparsable_override_is_ignored() {
        let mut config = SkillpathConfig::default();
        config.apply_overrides(|var| {
            (var == "SKILLPATH_EFFORT_REFERENCE").then(|| "lots".to_string())
        });
        assert_eq!(config.scoring.effort_reference_sessions, 10.0);
    }

    #[test]
    fn test_validate_requires_non_history_weight() {
        let mut config = SkillpathConfig::default();
        config.scoring.effort_weight = 0.0;
        config.scoring.alignment_weight = 0.0;
        assert!(config.validate().is_err());
    }
}
