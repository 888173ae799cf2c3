//! Fuzzy Resolver
//!
//! Resolves free-text pen references ("vanshing pont", "VP", "lamy 2k")
//! to a formal pen name. Every command that accepts a pen reference goes
//! through the same resolver so thresholds and tie-breaks never diverge.
//!
//! Scoring: both strings are lowercased and stripped of all whitespace,
//! then compared with normalized Damerau-Levenshtein similarity (0.0-1.0).

use serde::Serialize;
use strsim::normalized_damerau_levenshtein;

/// Minimum similarity for a resolution to count as a hit
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// A string a query can be matched against, tagged with its owning pen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    /// Formal name or alias text
    pub text: &'a str,

    /// Formal name of the pen this candidate belongs to
    pub owner: &'a str,

    /// Whether `text` is the formal name itself rather than an alias
    pub is_formal: bool,
}

/// A ranked resolution result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub formal_name: String,
    /// The formal name or alias that produced the score
    pub matched: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyResolver {
    threshold: f64,
}

impl Default for FuzzyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl FuzzyResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Case- and whitespace-insensitive similarity in `[0.0, 1.0]`
    pub fn score(query: &str, candidate: &str) -> f64 {
        let query = squash(query);
        let candidate = squash(candidate);
        if query.is_empty() || candidate.is_empty() {
            return 0.0;
        }
        normalized_damerau_levenshtein(&query, &candidate)
    }

    /// Resolve `query` to the formal name of the best-scoring candidate.
    ///
    /// Ties go to a formal-name candidate over an alias, then to the
    /// candidate seen first. Returns `None` below the threshold.
    pub fn resolve<'a, I>(&self, query: &str, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = Candidate<'a>>,
    {
        let mut best: Option<(f64, Candidate<'a>)> = None;

        for candidate in candidates {
            let score = Self::score(query, candidate.text);
            let better = match &best {
                None => true,
                Some((best_score, best_candidate)) => {
                    score > *best_score
                        || (score == *best_score && candidate.is_formal && !best_candidate.is_formal)
                }
            };
            if better {
                best = Some((score, candidate));
            }
        }

        match best {
            Some((score, candidate)) if score >= self.threshold => {
                tracing::debug!(
                    "Resolved '{}' to '{}' via '{}' (score {:.3})",
                    query,
                    candidate.owner,
                    candidate.text,
                    score
                );
                Some(candidate.owner.to_string())
            }
            Some((score, _)) => {
                tracing::debug!("No pen matches '{}' (best score {:.3})", query, score);
                None
            }
            None => None,
        }
    }

    /// Every pen scoring at or above the threshold, best first, one entry per pen
    pub fn rank<'a, I>(&self, query: &str, candidates: I, limit: usize) -> Vec<ScoredMatch>
    where
        I: IntoIterator<Item = Candidate<'a>>,
    {
        let mut ranked: Vec<ScoredMatch> = Vec::new();

        for candidate in candidates {
            let score = Self::score(query, candidate.text);
            if score < self.threshold {
                continue;
            }
            match ranked.iter_mut().find(|m| m.formal_name == candidate.owner) {
                Some(existing) if score > existing.score => {
                    existing.matched = candidate.text.to_string();
                    existing.score = score;
                }
                Some(_) => {}
                None => ranked.push(ScoredMatch {
                    formal_name: candidate.owner.to_string(),
                    matched: candidate.text.to_string(),
                    score,
                }),
            }
        }

        // stable: equal scores keep store order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit);
        ranked
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
