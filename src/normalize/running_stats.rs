use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Online elementwise mean/variance over an unbounded stream
// ---------------------------------------------------------------------------

/// Count floor keeping the very first merge well conditioned.
const COUNT_FLOOR: f64 = 1e-4;

/// Streaming per-feature mean and population variance.
///
/// Updates go through the parallel-variance merge (Chan et al.), so merging
/// is associative and order-independent up to floating-point rounding, and
/// stays stable for arbitrarily large counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningMeanStd {
    mean: Vec<f64>,
    var: Vec<f64>,
    count: f64,
}

impl RunningMeanStd {
    pub fn new(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            var: vec![1.0; dim],
            count: COUNT_FLOOR,
        }
    }

    pub fn from_parts(mean: Vec<f64>, var: Vec<f64>, count: f64) -> Self {
        Self {
            mean,
            var,
            count: count.max(COUNT_FLOOR),
        }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn var(&self) -> &[f64] {
        &self.var
    }

    pub fn count(&self) -> f64 {
        self.count
    }

    /// Fold one sample in as a batch of size one (zero batch variance).
    pub fn update(&mut self, sample: &[f64]) {
        debug_assert_eq!(sample.len(), self.dim());
        self.merge_moments(sample, &vec![0.0; sample.len()], 1.0);
    }

    /// Merge another aggregate into this one.
    pub fn merge(&mut self, other: &RunningMeanStd) {
        self.merge_moments(&other.mean, &other.var, other.count);
    }

    fn merge_moments(&mut self, batch_mean: &[f64], batch_var: &[f64], batch_count: f64) {
        let total = self.count + batch_count;
        for i in 0..self.mean.len() {
            let delta = batch_mean[i] - self.mean[i];
            let m2 = self.var[i] * self.count
                + batch_var[i] * batch_count
                + delta * delta * self.count * batch_count / total;
            self.mean[i] += delta * batch_count / total;
            self.var[i] = m2 / total;
        }
        self.count = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(stats: &mut RunningMeanStd, samples: &[[f64; 2]]) {
        for sample in samples {
            stats.update(sample);
        }
    }

    #[test]
    fn converges_to_sample_moments() {
        let samples = [[1.0, -2.0], [3.0, 0.0], [5.0, 2.0], [7.0, 4.0]];
        let mut stats = RunningMeanStd::new(2);
        feed(&mut stats, &samples);

        // Population moments of the samples; the count floor perturbs them
        // only at the 1e-4 level.
        assert!((stats.mean()[0] - 4.0).abs() < 1e-2);
        assert!((stats.mean()[1] - 1.0).abs() < 1e-2);
        assert!((stats.var()[0] - 5.0).abs() < 1e-2);
        assert!((stats.var()[1] - 5.0).abs() < 1e-2);
    }

    #[test]
    fn merge_is_order_independent() {
        let first = [[0.5, -1.0], [1.5, 2.0], [2.5, 0.0]];
        let second = [[-3.0, 4.0], [0.0, 1.0]];

        let mut a = RunningMeanStd::new(2);
        let mut b = RunningMeanStd::new(2);
        feed(&mut a, &first);
        feed(&mut b, &second);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        for i in 0..2 {
            assert!((ab.mean()[i] - ba.mean()[i]).abs() < 1e-12);
            assert!((ab.var()[i] - ba.var()[i]).abs() < 1e-12);
        }
        assert!((ab.count() - ba.count()).abs() < 1e-12);
    }

    #[test]
    fn count_never_hits_zero() {
        let stats = RunningMeanStd::new(3);
        assert!(stats.count() > 0.0);
        let restored = RunningMeanStd::from_parts(vec![0.0; 3], vec![1.0; 3], 0.0);
        assert!(restored.count() > 0.0);
    }

    #[test]
    fn count_is_monotonic() {
        let mut stats = RunningMeanStd::new(1);
        let mut previous = stats.count();
        for i in 0..100 {
            stats.update(&[i as f64]);
            assert!(stats.count() > previous);
            previous = stats.count();
        }
    }
}
