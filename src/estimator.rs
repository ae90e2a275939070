use crate::config::BootstrapConfig;
use crate::progress;
use crate::ratio::{Extremum, RatioId, RatioRow, Window, WindowExtrema};
use crate::stats::{self, Summary};

/// Direction of a threshold test against a window extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The window's low fell below the level.
    Below,
    /// The window's high rose above the level.
    Above,
}

/// Level expressed in standard deviations around a ratio's mean.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Threshold {
    pub side: Side,
    /// Standard deviations from the mean in the direction of `side`:
    /// `Below` sits at `mean - sigma * sd`, `Above` at `mean + sigma * sd`.
    pub sigma: f64,
}

impl Threshold {
    pub fn level(&self, summary: &Summary) -> Option<f64> {
        let sd = summary.std_dev?;
        Some(match self.side {
            Side::Below => summary.mean - self.sigma * sd,
            Side::Above => summary.mean + self.sigma * sd,
        })
    }

    pub fn holds(&self, extremum: &Extremum, level: f64) -> bool {
        match self.side {
            Side::Below => extremum.low < level,
            Side::Above => extremum.high > level,
        }
    }
}

/// "Given the ratio crossed `given` before the hour, did it cross `event` after it?"
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Relationship {
    pub name: String,
    pub given: Threshold,
    pub event: Threshold,
}

/// Summary of each ratio over every defined grid value, computed once per run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RatioStats {
    pub summaries: std::collections::BTreeMap<RatioId, Summary>,
}

impl RatioStats {
    pub fn from_rows(rows: &[RatioRow]) -> Self {
        let summaries = RatioId::ALL
            .into_iter()
            .filter_map(|id| Some((id, stats::describe(rows.iter().filter_map(|row| row.get(id)))?)))
            .collect();
        RatioStats { summaries }
    }

    pub fn get(&self, id: RatioId) -> Option<&Summary> {
        self.summaries.get(&id)
    }
}

/// Conditional probability of one relationship for one ratio at one hour.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProbabilityRow {
    pub ratio: RatioId,
    pub relationship: String,
    pub hour: u32,
    pub population: usize,
    pub conditioned: usize,
    pub point: Option<f64>,
    pub mean: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Before/after extrema of one day around one hour boundary.
struct DayPair<'a> {
    before: &'a Extremum,
    after: &'a Extremum,
}

fn estimate(
    extrema: &WindowExtrema,
    dates: &[chrono::NaiveDate],
    summary: &Summary,
    ratio: RatioId,
    relationship: &Relationship,
    hour: u32,
    bootstrap: &BootstrapConfig,
) -> ProbabilityRow {
    let (before_label, after_label) = (Window::before(hour), Window::after(hour));
    let population: Vec<DayPair> = dates
        .iter()
        .filter_map(|&date| {
            Some(DayPair {
                before: extrema.get(date, ratio, &before_label)?,
                after: extrema.get(date, ratio, &after_label)?,
            })
        })
        .collect();

    let mut row = ProbabilityRow {
        ratio,
        relationship: relationship.name.clone(),
        hour,
        population: population.len(),
        conditioned: 0,
        point: None,
        mean: None,
        lower: None,
        upper: None,
    };

    let (Some(given_level), Some(event_level)) =
        (relationship.given.level(summary), relationship.event.level(summary))
    else {
        tracing::warn!(%ratio, "ratio has no standard deviation; skipping");
        return row;
    };

    let given = |day: &DayPair| relationship.given.holds(day.before, given_level);
    let event = |day: &DayPair| relationship.event.holds(day.after, event_level);

    let outcomes: Vec<bool> = population.iter().filter(|&day| given(day)).map(|day| event(day)).collect();
    row.conditioned = outcomes.len();
    row.point = stats::conditional_probability(&population, given, event);

    match stats::bootstrap_confidence_interval(
        &outcomes,
        bootstrap.iterations,
        bootstrap.alpha,
        bootstrap.seed,
    ) {
        Some(ci) => {
            row.mean = Some(ci.mean);
            row.lower = Some(ci.lower);
            row.upper = Some(ci.upper);
        }
        None => {
            tracing::warn!(
                %ratio,
                relationship = %relationship.name,
                hour,
                "empty conditioning set; probability undefined"
            );
        }
    }
    row
}

/// Estimates every relationship for every cumulative ratio and hour boundary.
///
/// For hour H the population is the set of days with both `B{H}` and `A{H}`
/// extrema; the relationship's `given` test reads the before-window and its
/// `event` test the after-window. Levels come from `stats`.
///
/// # Arguments
/// * `extrema` - Per-day window highs and lows.
/// * `stats` - Mean and standard deviation of each ratio.
/// * `relationships` - Given/event threshold pairs to estimate.
/// * `hour_boundaries` - Hours splitting each day into `B{H}` and `A{H}`.
/// * `bootstrap` - Resampling settings for the confidence interval.
///
/// # Returns
/// * `Vec<ProbabilityRow>` - One row per cumulative ratio, relationship and hour.
pub fn probability_table(
    extrema: &WindowExtrema,
    stats: &RatioStats,
    relationships: &[Relationship],
    hour_boundaries: &[u32],
    bootstrap: &BootstrapConfig,
) -> Vec<ProbabilityRow> {
    let dates = extrema.dates();
    let tasks: Vec<(RatioId, &Summary, &Relationship, u32)> = RatioId::cumulative()
        .filter_map(|id| stats.get(id).map(|summary| (id, summary)))
        .flat_map(|(id, summary)| {
            relationships.iter().flat_map(move |relationship| {
                hour_boundaries.iter().map(move |&hour| (id, summary, relationship, hour))
            })
        })
        .collect();

    let bar = progress::bar(tasks.len() as u64, "bootstrapping");
    let rows: Vec<ProbabilityRow> = tasks
        .into_iter()
        .map(|(ratio, summary, relationship, hour)| {
            let row = estimate(extrema, &dates, summary, ratio, relationship, hour, bootstrap);
            bar.inc(1);
            row
        })
        .collect();
    bar.finish_and_clear();

    tracing::info!(rows = rows.len(), "estimated conditional probabilities");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio::{Basis, RatioPair, WindowKey};

    const UN: RatioId = RatioId { pair: RatioPair::UltraNote, basis: Basis::Cumulative };

    fn summary(mean: f64, sd: f64) -> Summary {
        Summary {
            count: 100,
            mean,
            std_dev: Some(sd),
            min: 0.0,
            q25: 0.0,
            median: mean,
            q75: 0.0,
            max: 0.0,
        }
    }

    fn insert(extrema: &mut WindowExtrema, day: u32, window: &str, low: f64, high: f64) {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        extrema
            .entries
            .insert(WindowKey { date, ratio: UN, window: window.to_string() }, Extremum { high, low });
    }

    fn revert_up() -> Relationship {
        Relationship {
            name: "revert-up".into(),
            given: Threshold { side: Side::Below, sigma: 1.0 },
            event: Threshold { side: Side::Above, sigma: 0.0 },
        }
    }

    fn quick_bootstrap() -> BootstrapConfig {
        BootstrapConfig { iterations: 500, seed: 42, alpha: 0.05 }
    }

    #[test]
    fn test_threshold_levels() {
        let s = summary(1.0, 0.2);
        assert_eq!(Threshold { side: Side::Below, sigma: 1.0 }.level(&s), Some(0.8));
        assert_eq!(Threshold { side: Side::Above, sigma: 2.0 }.level(&s), Some(1.4));
        let flat = Summary { std_dev: None, ..s };
        assert_eq!(Threshold { side: Side::Above, sigma: 0.0 }.level(&flat), None);
    }

    #[test]
    fn test_nine_of_ten_revert() {
        let mut extrema = WindowExtrema::default();
        for day in 1..=10 {
            // dipped below 0.5 before 7
            insert(&mut extrema, day, "B7", 0.4, 1.0);
            let after_high = if day == 10 { 0.9 } else { 1.5 };
            insert(&mut extrema, day, "A7", 0.6, after_high);
        }
        // never dipped: outside the conditioning set
        for day in 11..=15 {
            insert(&mut extrema, day, "B7", 0.9, 1.1);
            insert(&mut extrema, day, "A7", 0.9, 1.1);
        }
        // no before-window extremum: outside the population
        insert(&mut extrema, 20, "A7", 0.1, 3.0);

        let mut stats = RatioStats::default();
        stats.summaries.insert(UN, summary(1.0, 0.5));

        let rows = probability_table(&extrema, &stats, &[revert_up()], &[7], &quick_bootstrap());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.population, 15);
        assert_eq!(row.conditioned, 10);
        assert_eq!(row.point, Some(0.9));
        let (lower, upper) = (row.lower.unwrap(), row.upper.unwrap());
        assert!(lower <= row.mean.unwrap() && row.mean.unwrap() <= upper);
        assert!(upper <= 1.0);
    }

    #[test]
    fn test_empty_conditioning_set_is_undefined() {
        let mut extrema = WindowExtrema::default();
        insert(&mut extrema, 1, "B8", 0.95, 1.0);
        insert(&mut extrema, 1, "A8", 0.95, 1.2);

        let mut stats = RatioStats::default();
        stats.summaries.insert(UN, summary(1.0, 0.5));

        let rows = probability_table(&extrema, &stats, &[revert_up()], &[8], &quick_bootstrap());
        assert_eq!(rows[0].population, 1);
        assert_eq!(rows[0].conditioned, 0);
        assert_eq!(rows[0].point, None);
        assert_eq!(rows[0].mean, None);
    }

    #[test]
    fn test_ratio_stats_skip_undefined_values() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let rows = vec![
            RatioRow { date, secs: 1, values: [Some(1.0), None, None, Some(2.0), None, None] },
            RatioRow { date, secs: 2, values: [Some(3.0), None, None, Some(2.0), None, None] },
            RatioRow { date, secs: 3, values: [None, None, None, Some(2.0), None, None] },
        ];
        let stats = RatioStats::from_rows(&rows);
        assert_eq!(stats.get(UN).unwrap().count, 2);
        assert_eq!(stats.get(UN).unwrap().mean, 2.0);
        assert!(stats.get(RatioId { pair: RatioPair::BondNote, basis: Basis::Cumulative }).is_none());
        assert_eq!(stats.summaries.len(), 2);
    }
}
