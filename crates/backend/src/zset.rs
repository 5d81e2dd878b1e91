//! A minimal in-process sorted set, keyed by member string with an `f64`
//! score, tie-broken by member string when scores are equal — matching
//! real sorted-set semantics closely enough for the engine's purposes
//! (prefix/suffix scans rely on the tie-break to make iteration order
//! deterministic across ties at the same score).

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct ZSet {
    scores: FxHashMap<String, f64>,
}

impl ZSet {
    pub fn add(&mut self, member: &str, score: f64) {
        self.scores.insert(member.to_string(), score);
    }

    pub fn remove(&mut self, member: &str) {
        self.scores.remove(member);
    }

    pub fn card(&self) -> u64 {
        self.scores.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn score_of(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// All (member, score) pairs sorted ascending by (score, member).
    pub fn sorted_ascending(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> =
            self.scores.iter().map(|(m, s)| (m.clone(), *s)).collect();
        entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        entries
    }

    pub fn rank(&self, member: &str) -> Option<u64> {
        if !self.scores.contains_key(member) {
            return None;
        }
        self.sorted_ascending()
            .iter()
            .position(|(m, _)| m == member)
            .map(|p| p as u64)
    }

    pub fn range(&self, start: i64, stop: i64) -> Vec<String> {
        let entries = self.sorted_ascending();
        let len = entries.len() as i64;
        if len == 0 {
            return Vec::new();
        }
        let norm = |idx: i64| -> i64 {
            if idx < 0 {
                (len + idx).max(0)
            } else {
                idx
            }
        };
        let start = norm(start).min(len - 1).max(0);
        let stop = norm(stop).min(len - 1);
        if stop < start {
            return Vec::new();
        }
        entries[start as usize..=stop as usize]
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn range_by_score(&self, min: f64, max: f64) -> Vec<(String, f64)> {
        self.sorted_ascending()
            .into_iter()
            .filter(|(_, s)| *s >= min && *s <= max)
            .collect()
    }

    pub fn revrange_by_score(&self, max: f64, min: f64) -> Vec<(String, f64)> {
        let mut entries = self.range_by_score(min, max);
        entries.reverse();
        entries
    }

    pub fn remrangebyscore(&mut self, min: f64, max: f64) {
        self.scores.retain(|_, s| !(*s >= min && *s <= max));
    }
}
