/// Top-k filtering of fake scores for the generator update.
///
/// Once the epoch index reaches half the configured total, the generator
/// loss only sees the `batch / 2` fakes the discriminator scores highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFilter {
    enabled: bool,
    total_epochs: usize,
}

impl SampleFilter {
    pub fn new(enabled: bool, total_epochs: usize) -> SampleFilter {
        SampleFilter { enabled, total_epochs }
    }

    pub fn is_active(&self, epoch: usize) -> bool {
        self.enabled && 2 * epoch >= self.total_epochs
    }

    /// Number of fakes kept from a batch; never zero.
    pub fn keep_count(batch: usize) -> usize {
        (batch / 2).max(1).min(batch)
    }

    /// Indices of the scores the generator loss is computed over.
    ///
    /// Inactive: every index in order. Active: the `keep_count` highest
    /// scores, best first.
    pub fn select(&self, scores: &[f64], epoch: usize) -> Vec<usize> {
        if !self.is_active(epoch) {
            return (0..scores.len()).collect();
        }
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(SampleFilter::keep_count(scores.len()));
        order
    }
}
