use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pattern to search for, allowing a number of literal mismatches.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SearchTarget {
    /// The residue pattern.
    pub pattern: String,
    /// How many mismatching residues a match may contain.
    pub max_errors: u32,
    /// An opaque caller id reported back with every match of this pattern.
    pub group_id: u32,
}

/// The error for degenerate search patterns, rejected when the index is built, before any
/// search runs.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PatternError {
    /// Patterns shorter than four residues match close to everywhere.
    #[error("pattern {0:?} is shorter than 4 residues")]
    TooShort(String),
    /// An error budget that large makes every comparison ambiguous.
    #[error("pattern {pattern:?} with {max_errors} allowed errors is ambiguous")]
    TooManyErrors {
        /// The offending pattern.
        pattern: String,
        /// Its error budget.
        max_errors: u32,
    },
}

#[derive(Clone, Debug)]
struct IndexedTarget {
    pattern: Vec<u8>,
    max_errors: u32,
    group_id: u32,
    /// The length of the prefix shared with the lexically preceding pattern. Comparisons for
    /// those positions are reused instead of redone.
    branch_depth: usize,
}

/// One reported occurrence of a pattern.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ApproximateMatch {
    /// The group id of the matched pattern.
    pub group_id: u32,
    /// The byte offset the match starts at.
    pub start: usize,
    /// One past the last matched byte.
    pub end: usize,
    /// How many residues mismatched.
    pub errors: u32,
}

/// The approximate sequence search over a fixed set of patterns. Patterns are sorted once at
/// build time and each carries the length of its common prefix with its predecessor, so a
/// scan over candidates at one protein offset never re-compares a shared prefix.
#[derive(Clone, Debug)]
pub struct SearchIndex {
    targets: Vec<IndexedTarget>,
    longest: usize,
}

impl SearchIndex {
    /// Build the index. Degenerate patterns are rejected here so a search can never start
    /// with them.
    pub fn build(targets: Vec<SearchTarget>) -> Result<Self, PatternError> {
        for target in &targets {
            if target.pattern.len() < 4 {
                return Err(PatternError::TooShort(target.pattern.clone()));
            }
            if target.max_errors as usize >= target.pattern.len() - 3 {
                return Err(PatternError::TooManyErrors {
                    pattern: target.pattern.clone(),
                    max_errors: target.max_errors,
                });
            }
        }
        let mut targets = targets
            .into_iter()
            .map(|target| IndexedTarget {
                pattern: target.pattern.to_ascii_uppercase().into_bytes(),
                max_errors: target.max_errors,
                group_id: target.group_id,
                branch_depth: 0,
            })
            .collect_vec();
        targets.sort_by(|a, b| a.pattern.cmp(&b.pattern));
        for index in 1..targets.len() {
            targets[index].branch_depth = common_prefix(
                &targets[index - 1].pattern,
                &targets[index].pattern,
            );
        }
        let longest = targets.iter().map(|t| t.pattern.len()).max().unwrap_or(0);
        Ok(Self { targets, longest })
    }

    /// Find all pattern occurrences in a protein, reporting for each starting offset only
    /// the best candidate: lowest error count, ties broken by shortest match. Matches come
    /// out in ascending start offset.
    pub fn search(&self, protein: &str) -> Vec<ApproximateMatch> {
        let protein = protein.as_bytes();
        let mut matches = Vec::new();
        // Cumulative error counts for the candidate prefix at the current offset, shared
        // between targets through their branch depths
        let mut cumulative = vec![0_u32; self.longest + 1];

        for offset in 0..protein.len() {
            let mut best: Option<ApproximateMatch> = None;
            // How many entries of `cumulative` hold values for this offset
            let mut valid = 0_usize;
            // The prefix the upcoming target shares with the last target actually compared;
            // skipping a candidate shrinks it to the minimum over the gap
            let mut shared = usize::MAX;

            for target in &self.targets {
                let depth = target.branch_depth.min(shared);
                if offset + target.pattern.len() > protein.len() {
                    shared = depth;
                    continue;
                }
                shared = usize::MAX;
                let start = depth.min(valid);
                let mut errors = cumulative[start];
                let mut abandoned = false;
                for (position, &expected) in target.pattern.iter().enumerate().skip(start) {
                    if protein[offset + position].to_ascii_uppercase() != expected {
                        errors += 1;
                    }
                    cumulative[position + 1] = errors;
                    if errors > target.max_errors {
                        valid = position + 1;
                        abandoned = true;
                        break;
                    }
                }
                if abandoned {
                    continue;
                }
                valid = target.pattern.len();
                let candidate = ApproximateMatch {
                    group_id: target.group_id,
                    start: offset,
                    end: offset + target.pattern.len(),
                    errors,
                };
                if best.is_none_or(|b| {
                    (candidate.errors, candidate.end - candidate.start)
                        < (b.errors, b.end - b.start)
                }) {
                    best = Some(candidate);
                }
            }
            matches.extend(best);
        }
        matches
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
