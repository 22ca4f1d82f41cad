//! Index-to-candidate bijections for plain and templated enumeration
//!
//! Every candidate in scope has a unique integer index, which is what the
//! workers actually iterate over. The plain space orders candidates by length
//! and then lexicographically under the declared alphabet order, with the
//! leftmost position changing slowest. Templated spaces reuse the same
//! convention for the concatenated wildcard payload.

use crate::error::IndexError;
use crate::pattern::{Pattern, Segment};
use std::collections::BTreeMap;

/// Deterministic bijections between indices and candidate strings
#[derive(Debug, Clone)]
pub struct CandidateIndexer {
    alphabet: Vec<char>,
}

impl CandidateIndexer {
    pub fn new(charset: &str) -> Self {
        CandidateIndexer {
            alphabet: charset.chars().collect(),
        }
    }

    pub fn alphabet_size(&self) -> u64 {
        self.alphabet.len() as u64
    }

    /// `sigma^length`, or `Overflow` when it exceeds 64 bits
    pub fn combinations(&self, length: u32) -> Result<u64, IndexError> {
        let sigma = self.alphabet_size();
        let mut count: u64 = 1;
        for _ in 0..length {
            count = count.checked_mul(sigma).ok_or(IndexError::Overflow)?;
        }
        Ok(count)
    }

    /// Candidates shorter than `min_length`: the offset of the target range
    /// inside the global index space
    pub fn prefix_count(&self, min_length: u32) -> Result<u64, IndexError> {
        self.sum_combinations(1, min_length.saturating_sub(1))
    }

    /// Total candidates with lengths in `[min_length, max_length]`
    pub fn total_in_range(&self, min_length: u32, max_length: u32) -> Result<u64, IndexError> {
        self.sum_combinations(min_length, max_length)
    }

    fn sum_combinations(&self, from: u32, to: u32) -> Result<u64, IndexError> {
        let sigma = self.alphabet_size();
        let mut total: u64 = 0;
        let mut power: u64 = 1;
        for length in 1..=to {
            power = power.checked_mul(sigma).ok_or(IndexError::Overflow)?;
            if length >= from {
                total = total.checked_add(power).ok_or(IndexError::Overflow)?;
            }
        }
        Ok(total)
    }

    /// Candidate for a global index over all lengths `1..=max_length`
    pub fn candidate_at(&self, index: u64, max_length: u32) -> Result<String, IndexError> {
        let sigma = self.alphabet_size();
        let mut remaining = index;
        let mut power: u64 = 1;
        for length in 1..=max_length {
            power = power.checked_mul(sigma).ok_or(IndexError::Overflow)?;
            if remaining < power {
                return Ok(self.candidate_within_length(remaining, length));
            }
            remaining -= power;
        }
        Err(IndexError::OutOfRange)
    }

    /// Candidate at a local index inside one length block: the base-sigma
    /// representation of the index, most significant digit first, padded with
    /// the first alphabet character. All digits are generated unconditionally.
    pub fn candidate_within_length(&self, local_index: u64, length: u32) -> String {
        let sigma = self.alphabet_size();
        let length = length as usize;
        let mut digits = vec![self.alphabet[0]; length];
        let mut remaining = local_index;
        for i in 0..length {
            digits[length - 1 - i] = self.alphabet[(remaining % sigma) as usize];
            remaining /= sigma;
        }
        digits.into_iter().collect()
    }

    /// Templated candidate of exactly `length` characters at local index
    /// `local_index` within that length block. Wildcard payloads advance
    /// lexicographically with the leftmost wildcard position changing slowest.
    pub fn pattern_candidate_at(
        &self,
        local_index: u64,
        pattern: &Pattern,
        length: u32,
    ) -> Result<String, IndexError> {
        let info = pattern.info();
        if length < info.fixed_len {
            return Err(IndexError::OutOfRange);
        }
        let star_len = if info.stars > 0 {
            length - info.fixed_len
        } else {
            if length != info.fixed_len {
                return Err(IndexError::OutOfRange);
            }
            0
        };

        let payload_len = info.wildcards + star_len;
        let payload = if payload_len > 0 {
            // The local index addresses the length-`payload_len` block of the
            // plain space, so shift past all shorter payloads first.
            let offset = self.prefix_count(payload_len)?;
            let global = offset
                .checked_add(local_index)
                .ok_or(IndexError::Overflow)?;
            self.candidate_at(global, payload_len)?
        } else {
            String::new()
        };
        debug_assert_eq!(payload.chars().count() as u32, payload_len);

        let mut candidate = String::with_capacity(length as usize);
        let mut payload_chars = payload.chars();
        for segment in pattern.segments() {
            match segment {
                Segment::Literal(text) => candidate.push_str(text),
                Segment::One => {
                    candidate.push(payload_chars.next().ok_or(IndexError::OutOfRange)?)
                }
                Segment::Many => {
                    for _ in 0..star_len {
                        candidate.push(payload_chars.next().ok_or(IndexError::OutOfRange)?);
                    }
                }
            }
        }
        Ok(candidate)
    }

    /// Route a global templated index to its length block. `counts` maps each
    /// length to its combination count, ascending; zero-count lengths are
    /// skipped.
    pub fn pattern_candidate_global(
        &self,
        global_index: u64,
        pattern: &Pattern,
        counts: &BTreeMap<u32, u64>,
    ) -> Result<String, IndexError> {
        let mut remaining = global_index;
        for (&length, &count) in counts {
            if count == 0 {
                continue;
            }
            if remaining < count {
                return self.pattern_candidate_at(remaining, pattern, length);
            }
            remaining -= count;
        }
        Err(IndexError::OutOfRange)
    }
}
