use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Descriptive statistics of a sample.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); undefined below two observations.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Linearly interpolated quantile of an ascending, non-empty slice.
///
/// Uses the `(n - 1) * p` positioning, so `p = 0` and `p = 1` return the
/// extremes.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let position = (sorted.len() - 1) as f64 * p;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Summarises the finite values of `values`.
///
/// Returns `None` when no finite value remains; non-finite inputs never reach
/// the result.
pub fn describe(values: impl IntoIterator<Item = f64>) -> Option<Summary> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std_dev = (count > 1).then(|| {
        let squares: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (squares / (count - 1) as f64).sqrt()
    });

    Some(Summary {
        count,
        mean,
        std_dev,
        min: sorted[0],
        q25: quantile(&sorted, 0.25)?,
        median: quantile(&sorted, 0.5)?,
        q75: quantile(&sorted, 0.75)?,
        max: sorted[count - 1],
    })
}

/// Fraction of the population satisfying `given` that also satisfies `event`.
///
/// Returns `None` for an empty conditioning set.
pub fn conditional_probability<T>(
    population: &[T],
    given: impl Fn(&T) -> bool,
    event: impl Fn(&T) -> bool,
) -> Option<f64> {
    let (conditioned, hits) = population
        .iter()
        .filter(|&item| given(item))
        .fold((0usize, 0usize), |(n, k), item| (n + 1, k + usize::from(event(item))));
    (conditioned > 0).then(|| hits as f64 / conditioned as f64)
}

/// Bootstrap estimate of a proportion.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BootstrapEstimate {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Generator for one resample; depends only on the seed and iteration number.
fn iteration_rng(seed: u64, iteration: usize) -> rand_pcg::Pcg64 {
    rand_pcg::Pcg64::seed_from_u64(seed ^ (iteration as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Resamples `sample` with replacement `iterations` times and reports the mean
/// proportion of `true` with its `(alpha / 2, 1 - alpha / 2)` empirical interval.
///
/// Iterations run in parallel but each draws from its own seeded generator, so
/// a fixed seed gives the same estimate on any thread count. Returns `None` for
/// an empty sample, zero iterations or an `alpha` outside `(0, 1)`.
pub fn bootstrap_confidence_interval(
    sample: &[bool],
    iterations: usize,
    alpha: f64,
    seed: u64,
) -> Option<BootstrapEstimate> {
    if sample.is_empty() || iterations == 0 || !(alpha > 0.0 && alpha < 1.0) {
        return None;
    }

    let n = sample.len();
    let mut proportions: Vec<f64> = (0..iterations)
        .into_par_iter()
        .map(|iteration| {
            let mut rng = iteration_rng(seed, iteration);
            let hits = (0..n).filter(|_| sample[rng.gen_range(0..n)]).count();
            hits as f64 / n as f64
        })
        .collect();

    let mean = proportions.iter().sum::<f64>() / iterations as f64;
    proportions.sort_by(f64::total_cmp);
    Some(BootstrapEstimate {
        mean,
        lower: quantile(&proportions, alpha / 2.0)?,
        upper: quantile(&proportions, 1.0 - alpha / 2.0)?,
    })
}
