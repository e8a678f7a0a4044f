/*!
 * Descriptive Statistics
 * Sample statistics shared by the scoring pillars and the runtime tuner
 *
 * All functions take plain slices and never panic: degenerate inputs return
 * the neutral value documented on each function.
 */

/// Running statistics (Welford's online algorithm)
#[derive(Debug, Clone, Copy, Default)]
pub struct Running {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Running {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update statistics with a new value
    #[inline]
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (n - 1 denominator), 0 below two samples
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl FromIterator<f64> for Running {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Running::new();
        for value in iter {
            stats.update(value);
        }
        stats
    }
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance, 0 below two samples
pub fn variance(data: &[f64]) -> f64 {
    data.iter().copied().collect::<Running>().variance()
}

/// Sample standard deviation, 0 below two samples
pub fn stddev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Coefficient of variation (stdev / mean)
///
/// 0 below two samples or when the mean is zero.
pub fn coefficient_of_variation(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let stats = data.iter().copied().collect::<Running>();
    if stats.mean() == 0.0 {
        return 0.0;
    }
    stats.stddev() / stats.mean()
}

/// Copy and sort ascending (NaN-safe total order)
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut values = data.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Median of an already sorted slice, 0 when empty
pub fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Median, 0 when empty
pub fn median(data: &[f64]) -> f64 {
    median_sorted(&sorted(data))
}

/// Exclusive-method quantile cut point `i` of `n` over a sorted slice
///
/// Cut points divide the distribution into `n` intervals, positioned over
/// `len + 1` virtual slots. Requires at least two samples; returns the only
/// value (or 0) otherwise.
pub fn quantile_exclusive(sorted: &[f64], i: usize, n: usize) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len == 1 || n == 0 {
        return sorted[0];
    }
    let i = i.min(n - 1);
    let m = len + 1;
    let j = (i * m / n).clamp(1, len - 1);
    let delta = (i * m) as f64 - (j * n) as f64;
    let n = n as f64;
    (sorted[j - 1] * (n - delta) + sorted[j] * delta) / n
}

/// Percentile via linear interpolation between closest ranks
///
/// `p` is a fraction in [0, 1]; k = (len - 1) * p.
pub fn percentile_linear(sorted: &[f64], p: f64) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    let k = (len - 1) as f64 * p.clamp(0.0, 1.0);
    let floor = k.floor() as usize;
    let ceil = k.ceil() as usize;
    if floor == ceil {
        sorted[floor]
    } else {
        let d0 = sorted[floor];
        let d1 = sorted[ceil];
        d0 + (d1 - d0) * (k - floor as f64)
    }
}

/// Shannon entropy in bits over a set of frequency counts
pub fn shannon_entropy<I>(counts: I) -> f64
where
    I: IntoIterator<Item = usize> + Clone,
{
    let total: usize = counts.clone().into_iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .into_iter()
        .filter(|&count| count > 0)
        .map(|count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Map a metric where 0 is best onto (0, 1]: exp(-rate * metric)
#[inline]
pub fn exponential_decay(metric: f64, rate: f64) -> f64 {
    (-rate * metric).exp()
}

/// Clamp into [0, 1], mapping NaN to 0
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Replace negative or non-finite values with 0
#[inline]
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
