//! Streaming aggregation over integer samples (Welford's online algorithm),
//! so distributions are available at finalization without replaying input.

#[derive(Clone, Debug, Default)]
pub struct RunningStats {
    count: u64,
    sum: i64,
    min: i64,
    max: i64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: i64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;

        let delta = value as f64 - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value as f64 - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn min(&self) -> Option<i64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<i64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Standard deviation. Population formula up to two samples (a sample
    /// standard deviation is undefined there), sample formula beyond.
    pub fn sd(&self) -> f64 {
        match self.count {
            0 => 0.0,
            1 | 2 => (self.m2 / self.count as f64).sqrt(),
            n => (self.m2 / (n - 1) as f64).sqrt(),
        }
    }
}

impl Extend<i64> for RunningStats {
    fn extend<T: IntoIterator<Item = i64>>(&mut self, iter: T) {
        for value in iter {
            self.push(value);
        }
    }
}
