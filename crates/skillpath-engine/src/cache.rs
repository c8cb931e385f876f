//! Per-student pathway cache.
//!
//! Entries are keyed by student, target set, mastery hash, preferences hash and graph
//! revision. Invalidation is lazy: whenever a student's cache is touched with a key whose
//! mastery hash or graph revision differs from a stored entry, that entry is dropped.
//! Each student keeps at most `capacity` entries, evicting the least recently used.
//!
//! Students live in separate `DashMap` entries, so operations on one student never
//! contend with another student's shard lock beyond the map's own sharding.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use skillpath_core::config::CacheConfig;
use skillpath_gen::{LearningPathway, StudentPreferences};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::scoring::ScoringWarning;

/// A pathway together with its score, as returned to callers and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPathway {
    pub pathway: Arc<LearningPathway>,
    pub score: f64,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ScoringWarning>,
}

impl ScoredPathway {
    /// True when the score came from the baseline after the configured scorer failed.
    pub fn is_degraded(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, ScoringWarning::ScoringDegraded(_)))
    }
}

/// Identifies one cached pathway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub student_id: String,
    pub targets: BTreeSet<String>,
    pub mastery_hash: String,
    pub preferences_hash: String,
    pub graph_revision: u64,
}

impl CacheKey {
    pub fn new(
        student_id: &str,
        targets: BTreeSet<String>,
        mastered: &BTreeSet<String>,
        preferences: &StudentPreferences,
        graph_revision: u64,
    ) -> Self {
        Self {
            student_id: student_id.to_string(),
            targets,
            mastery_hash: mastery_hash(mastered),
            preferences_hash: preferences.fingerprint(),
            graph_revision,
        }
    }

    /// Whether an entry stored under `self` is still valid for a request keyed `current`.
    fn is_current_for(&self, current: &CacheKey) -> bool {
        self.mastery_hash == current.mastery_hash && self.graph_revision == current.graph_revision
    }
}

/// SHA-256 over the sorted mastered-skill ids, truncated to 16 hex chars.
pub fn mastery_hash(mastered: &BTreeSet<String>) -> String {
    let mut hasher = Sha256::new();
    for skill in mastered {
        hasher.update(skill.as_bytes());
        hasher.update([0]);
    }
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    scored: ScoredPathway,
    last_access: u64,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub generations: u64,
    pub stale_evictions: u64,
    pub capacity_evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Hits over lookups, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Explicitly constructed and owned by the engine that uses it; there is no global cache.
#[derive(Debug)]
pub struct PathwayCache {
    students: DashMap<String, HashMap<CacheKey, CacheEntry>>,
    capacity: usize,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    generations: AtomicU64,
    stale_evictions: AtomicU64,
    capacity_evictions: AtomicU64,
}

impl Default for PathwayCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl PathwayCache {
    /// `capacity` is the per-student entry limit; 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            students: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            generations: AtomicU64::new(0),
            stale_evictions: AtomicU64::new(0),
            capacity_evictions: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.per_student_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Look up a valid entry, recording a hit or a miss.
    pub fn get(&self, key: &CacheKey) -> Option<ScoredPathway> {
        let found = self.peek(key);
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Look up a valid entry without touching the hit/miss counters.
    pub fn peek(&self, key: &CacheKey) -> Option<ScoredPathway> {
        let mut entries = self.students.get_mut(&key.student_id)?;
        self.purge_stale(&key.student_id, &mut entries, key);
        let now = self.tick();
        entries.get_mut(key).map(|entry| {
            entry.last_access = now;
            entry.scored.clone()
        })
    }

    /// Store a freshly generated pathway, dropping stale entries and enforcing capacity.
    pub fn insert(&self, key: CacheKey, scored: ScoredPathway) {
        let now = self.tick();
        let mut entries = self.students.entry(key.student_id.clone()).or_default();
        self.purge_stale(&key.student_id, &mut entries, &key);

        entries.insert(
            key,
            CacheEntry {
                scored,
                last_access: now,
            },
        );

        while entries.len() > self.capacity {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            entries.remove(&oldest);
            self.capacity_evictions.fetch_add(1, Ordering::Relaxed);
            debug!(
                student = %oldest.student_id,
                targets = ?oldest.targets,
                "cache entry evicted"
            );
        }
    }

    /// Drop one entry. Returns whether it existed.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.students
            .get_mut(&key.student_id)
            .is_some_and(|mut entries| entries.remove(key).is_some())
    }

    pub fn record_generation(&self) {
        self.generations.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop every entry for one student. Returns how many were removed.
    pub fn invalidate_student(&self, student_id: &str) -> usize {
        self.students
            .remove(student_id)
            .map_or(0, |(_, entries)| entries.len())
    }

    pub fn clear(&self) {
        self.students.clear();
    }

    /// Entries currently held for one student, stale ones included until next access.
    pub fn student_len(&self, student_id: &str) -> usize {
        self.students.get(student_id).map_or(0, |entries| entries.len())
    }

    pub fn len(&self) -> usize {
        self.students.iter().map(|entries| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            generations: self.generations.load(Ordering::Relaxed),
            stale_evictions: self.stale_evictions.load(Ordering::Relaxed),
            capacity_evictions: self.capacity_evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn purge_stale(
        &self,
        student_id: &str,
        entries: &mut HashMap<CacheKey, CacheEntry>,
        current: &CacheKey,
    ) {
        let before = entries.len();
        entries.retain(|stored, _| stored.is_current_for(current));
        let purged = before - entries.len();
        if purged > 0 {
            self.stale_evictions.fetch_add(purged as u64, Ordering::Relaxed);
            debug!(student = %student_id, purged, "stale cache entries dropped");
        }
    }
}
