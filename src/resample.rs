use crate::index;
use crate::instrument::{Instrument, PerInstrument};
use crate::range::AnnotatedTick;

use rayon::prelude::*;

/// Intraday sampling grid, in seconds since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub start_secs: u32,
    /// Inclusive.
    pub end_secs: u32,
    pub step_secs: u32,
    /// Grid points before this time are dropped after the join.
    pub range_cutoff_secs: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            start_secs: 5 * 3600 + 20 * 60,
            end_secs: 12 * 3600,
            step_secs: 10,
            range_cutoff_secs: 6 * 3600,
        }
    }
}

impl GridConfig {
    /// Every grid timestamp from start to end inclusive.
    pub fn grid_points(&self) -> impl Iterator<Item = u32> + '_ {
        (self.start_secs..=self.end_secs).step_by(self.step_secs.max(1) as usize)
    }

    /// Grid timestamps that survive the range cutoff.
    pub fn retained_points(&self) -> Vec<u32> {
        self.grid_points().filter(|&secs| secs >= self.range_cutoff_secs).collect()
    }

    /// Earliest time any retained row can carry.
    pub fn effective_start(&self) -> u32 {
        self.start_secs.max(self.range_cutoff_secs)
    }
}

/// One instrument's state copied from its nearest tick.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sample {
    pub price: f64,
    pub running_range: f64,
    pub daily_range: f64,
}

impl From<&AnnotatedTick> for Sample {
    fn from(tick: &AnnotatedTick) -> Self {
        Sample {
            price: tick.price,
            running_range: tick.running_range,
            daily_range: tick.daily_range,
        }
    }
}

/// All three instruments aligned on one grid timestamp of one day.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridRow {
    pub date: chrono::NaiveDate,
    pub secs: u32,
    pub samples: PerInstrument<Sample>,
}

/// Finds the tick closest in time to `target_ms` within one day's ticks.
///
/// Equal distances resolve to the earlier tick; several ticks printed at the
/// same instant resolve to the last of them. Returns `None` for an empty day.
pub fn nearest_tick(day: &[AnnotatedTick], target_ms: i64) -> Option<&AnnotatedTick> {
    let after = day.partition_point(|tick| tick.time_ms <= target_ms);
    match (after.checked_sub(1).map(|i| &day[i]), day.get(after)) {
        (Some(before), Some(next)) => {
            if next.time_ms - target_ms < target_ms - before.time_ms {
                Some(next)
            } else {
                Some(before)
            }
        }
        (Some(before), None) => Some(before),
        (None, next) => next,
    }
}

/// Aligns the three annotated series onto a common intraday grid.
///
/// Dates come from the instrument with the fewest trading days. A date on which
/// any instrument printed nothing is dropped entirely rather than padded.
///
/// # Arguments
/// * `series` - Annotated ticks per instrument, ascending by time.
/// * `grid` - Grid spacing and the range cutoff.
///
/// # Returns
/// * `Vec<GridRow>` - Rows at or after the cutoff, ordered by date then time.
pub fn resample_grid(series: &PerInstrument<Vec<AnnotatedTick>>, grid: &GridConfig) -> Vec<GridRow> {
    let days = series.map(|_, ticks| index::day_index(ticks, |tick| tick.date));
    let base = Instrument::ALL
        .into_iter()
        .min_by_key(|&instrument| days[instrument].len())
        .unwrap_or(Instrument::Note);
    let points = grid.retained_points();

    let rows: Vec<GridRow> = days[base]
        .par_iter()
        .flat_map_iter(|base_day| {
            let slices = PerInstrument::from_fn(|instrument| {
                days[instrument]
                    .binary_search_by_key(&base_day.date, |day| day.date)
                    .ok()
                    .map(|found| &series[instrument][days[instrument][found].range()])
            });

            let aligned = match (slices.note, slices.ultra, slices.bond) {
                (Some(note), Some(ultra), Some(bond)) => Some(PerInstrument { note, ultra, bond }),
                _ => {
                    tracing::debug!(date = %base_day.date, "dropping date missing from an instrument");
                    None
                }
            };

            aligned
                .into_iter()
                .flat_map(|day| {
                    points.iter().filter_map(move |&secs| {
                        let target_ms = secs as i64 * 1000;
                        let samples = PerInstrument::try_from_fn(|instrument| {
                            nearest_tick(day[instrument], target_ms).map(Sample::from).ok_or(())
                        })
                        .ok()?;
                        Some(GridRow { date: base_day.date, secs, samples })
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();

    tracing::info!(
        base = %base,
        days = days[base].len(),
        rows = rows.len(),
        "resampled instruments onto common grid"
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated(day: u32, points: &[(i64, f64)]) -> Vec<AnnotatedTick> {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        points
            .iter()
            .map(|&(secs, running_range)| AnnotatedTick {
                date,
                time_ms: secs * 1000,
                price: 100.0 + secs as f64,
                volume: 1,
                day_high: 0.0,
                day_low: 0.0,
                daily_range: 9.0,
                daily_volume: 1,
                running_high: 0.0,
                running_low: 0.0,
                running_range,
            })
            .collect()
    }

    #[test]
    fn test_nearest_tie_prefers_earlier() {
        let day = annotated(1, &[(100, 1.0), (200, 2.0)]);
        assert_eq!(nearest_tick(&day, 150_000).unwrap().time_ms, 100_000);
    }

    #[test]
    fn test_nearest_picks_strictly_closer() {
        let day = annotated(1, &[(100, 1.0), (200, 2.0)]);
        assert_eq!(nearest_tick(&day, 151_000).unwrap().time_ms, 200_000);
        assert_eq!(nearest_tick(&day, 149_000).unwrap().time_ms, 100_000);
        assert_eq!(nearest_tick(&day, 10_000).unwrap().time_ms, 100_000);
        assert_eq!(nearest_tick(&day, 900_000).unwrap().time_ms, 200_000);
    }

    #[test]
    fn test_nearest_exact_duplicates_take_last() {
        let day = annotated(1, &[(100, 1.0), (100, 4.0), (300, 5.0)]);
        assert_eq!(nearest_tick(&day, 100_000).unwrap().running_range, 4.0);
        assert!(nearest_tick(&[], 100_000).is_none());
    }

    #[test]
    fn test_grid_points_and_cutoff() {
        let grid = GridConfig { start_secs: 100, end_secs: 160, step_secs: 20, range_cutoff_secs: 130 };
        assert_eq!(grid.grid_points().collect::<Vec<_>>(), vec![100, 120, 140, 160]);
        assert_eq!(grid.retained_points(), vec![140, 160]);
        assert_eq!(grid.effective_start(), 130);
    }

    #[test]
    fn test_resample_drops_dates_missing_from_any_instrument() {
        let mut note = annotated(1, &[(100, 1.0), (200, 2.0)]);
        note.extend(annotated(4, &[(100, 3.0)]));
        note.extend(annotated(5, &[(100, 3.0)]));
        let mut ultra = annotated(1, &[(110, 1.5)]);
        ultra.extend(annotated(5, &[(150, 2.5)]));
        let mut bond = annotated(1, &[(90, 0.5), (210, 6.0)]);
        bond.extend(annotated(4, &[(100, 1.0)]));
        let series = PerInstrument { note, ultra, bond };

        let grid = GridConfig { start_secs: 100, end_secs: 200, step_secs: 50, range_cutoff_secs: 0 };
        let rows = resample_grid(&series, &grid);

        // ultra drives the dates; the 5th is missing from bond
        let dates: Vec<u32> = rows.iter().map(|r| chrono::Datelike::day(&r.date)).collect();
        assert_eq!(dates, vec![1, 1, 1]);

        let at_200 = &rows[2];
        assert_eq!(at_200.secs, 200);
        assert_eq!(at_200.samples.note.running_range, 2.0);
        assert_eq!(at_200.samples.ultra.running_range, 1.5);
        assert_eq!(at_200.samples.bond.running_range, 6.0);
    }

    #[test]
    fn test_resample_discards_rows_before_cutoff() {
        let series = PerInstrument {
            note: annotated(1, &[(100, 1.0)]),
            ultra: annotated(1, &[(100, 1.0)]),
            bond: annotated(1, &[(100, 1.0)]),
        };
        let grid = GridConfig { start_secs: 0, end_secs: 300, step_secs: 100, range_cutoff_secs: 150 };
        let rows = resample_grid(&series, &grid);
        assert_eq!(rows.iter().map(|r| r.secs).collect::<Vec<_>>(), vec![200, 300]);
    }
}
