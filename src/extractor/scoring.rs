//! Container scoring for the content-container strategy.
//!
//! Pure and allocation-free: candidates are plain counts, so the reducer can
//! be exercised without parsing any HTML.

/// Measurements of one element matched by a container selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerCandidate {
    pub word_count: usize,
    /// Direct-child `<p>` elements
    pub paragraph_count: usize,
}

/// Position and score of the winning candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestContainer {
    pub index: usize,
    pub score: usize,
}

/// Score = words + `paragraph_weight` × direct paragraphs.
///
/// Paragraph density outranks raw length, which penalizes wordy link farms
/// with few real paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerScoring {
    /// Candidates must have strictly more words than this
    pub min_words: usize,
    pub paragraph_weight: usize,
}

impl ContainerScoring {
    pub fn score(&self, candidate: ContainerCandidate) -> usize {
        candidate
            .word_count
            .saturating_add(self.paragraph_weight.saturating_mul(candidate.paragraph_count))
    }

    pub fn qualifies(&self, candidate: ContainerCandidate) -> bool {
        candidate.word_count > self.min_words
    }

    /// Highest-scoring qualifying candidate; the earliest wins ties.
    pub fn best<I>(&self, candidates: I) -> Option<BestContainer>
    where
        I: IntoIterator<Item = ContainerCandidate>,
    {
        candidates
            .into_iter()
            .enumerate()
            .filter(|(_, candidate)| self.qualifies(*candidate))
            .fold(None, |best, (index, candidate)| {
                let score = self.score(candidate);
                match best {
                    Some(current) if current.score >= score => Some(current),
                    _ => Some(BestContainer { index, score }),
                }
            })
    }
}
