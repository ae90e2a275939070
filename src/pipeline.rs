use crate::config::AnalysisConfig;
use crate::daily::{self, DailyRecord};
use crate::error::AnalysisError;
use crate::estimator::{self, ProbabilityRow, RatioStats};
use crate::instrument::{Instrument, PerInstrument};
use crate::loader;
use crate::range::{self, AnnotatedTick};
use crate::ratio::{self, RatioRow, Window, WindowExtrema};
use crate::resample::{self, GridRow};
use crate::tick::Tick;

use rayon::prelude::*;

/// Everything the reporting layer consumes from one run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub daily: PerInstrument<Vec<DailyRecord>>,
    pub grid: Vec<GridRow>,
    pub ratios: Vec<RatioRow>,
    pub windows: Vec<Window>,
    pub ratio_stats: RatioStats,
    pub extrema: WindowExtrema,
    pub probabilities: Vec<ProbabilityRow>,
}

/// Annotates the three series in parallel.
pub fn annotate_all(
    ticks: &PerInstrument<Vec<Tick>>,
    tick_sizes: &PerInstrument<f64>,
) -> Result<PerInstrument<Vec<AnnotatedTick>>, AnalysisError> {
    let annotated = Instrument::ALL
        .par_iter()
        .map(|&instrument| {
            range::annotate(instrument, &ticks[instrument], tick_sizes[instrument])
                .map(|rows| (instrument, rows))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut series = PerInstrument::<Vec<AnnotatedTick>>::default();
    for (instrument, rows) in annotated {
        series[instrument] = rows;
    }
    Ok(series)
}

/// Runs every stage after loading on already-aligned tick series.
pub fn analyse(
    ticks: &PerInstrument<Vec<Tick>>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;

    let annotated = annotate_all(ticks, &config.tick_sizes())?;
    let daily = annotated.map(|_, rows| daily::daily_records(rows));
    for (instrument, records) in daily.iter() {
        tracing::info!(%instrument, days = records.len(), "aggregated daily records");
    }

    let grid = resample::resample_grid(&annotated, &config.grid);
    let ratios = ratio::compute_ratios(&grid);
    let ratio_stats = RatioStats::from_rows(&ratios);

    let windows = ratio::build_windows(
        &config.windows.hour_boundaries,
        config.grid.effective_start(),
        config.grid.end_secs,
    );
    let extrema = ratio::window_extrema(&ratios, &windows);
    let probabilities = estimator::probability_table(
        &extrema,
        &ratio_stats,
        &config.relationships,
        &config.windows.hour_boundaries,
        &config.bootstrap,
    );

    Ok(AnalysisReport {
        config: config.clone(),
        daily,
        grid,
        ratios,
        windows,
        ratio_stats,
        extrema,
        probabilities,
    })
}

/// Loads the instrument files under `input_dir` and runs the full study.
pub fn run<P: AsRef<std::path::Path> + Sync>(
    input_dir: P,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;
    let ticks = loader::load_instruments(input_dir, config)?;
    analyse(&ticks, config)
}
