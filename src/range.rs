use crate::error::AnalysisError;
use crate::index;
use crate::instrument::Instrument;
use crate::tick::Tick;

/// A tick carrying its day's range metrics, all expressed in ticks of the
/// instrument's minimum increment.
///
/// The `day_*` and `daily_*` fields describe the whole trading day and are
/// attached to every row of that day, so they look ahead of the tick itself.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotatedTick {
    pub date: chrono::NaiveDate,
    /// Milliseconds since local midnight.
    pub time_ms: i64,
    pub price: f64,
    pub volume: u64,
    pub day_high: f64,
    pub day_low: f64,
    pub daily_range: f64,
    pub daily_volume: u64,
    pub running_high: f64,
    pub running_low: f64,
    pub running_range: f64,
}

/// Annotates one instrument's date-ordered RTH ticks with running and full-day
/// high/low ranges.
///
/// Each calendar day is processed independently: a forward pass records the
/// running extremes, then the day's final extremes and volume are written back
/// onto every row of the day. Output order and length match the input.
///
/// # Errors
/// * `InvalidTickSize` if `tick_size` is not a positive finite number.
pub fn annotate(
    instrument: Instrument,
    ticks: &[Tick],
    tick_size: f64,
) -> Result<Vec<AnnotatedTick>, AnalysisError> {
    if !(tick_size > 0.0) || !tick_size.is_finite() {
        return Err(AnalysisError::InvalidTickSize { instrument, tick_size });
    }

    let mut annotated = Vec::with_capacity(ticks.len());
    for day in index::day_index(ticks, Tick::date) {
        let day_ticks = &ticks[day.range()];
        let day_start = annotated.len();

        let mut running_high = f64::NEG_INFINITY;
        let mut running_low = f64::INFINITY;
        let mut daily_volume = 0u64;
        for tick in day_ticks {
            running_high = running_high.max(tick.price);
            running_low = running_low.min(tick.price);
            daily_volume += tick.volume;
            annotated.push(AnnotatedTick {
                date: day.date,
                time_ms: tick.time_ms(),
                price: tick.price,
                volume: tick.volume,
                day_high: f64::NAN,
                day_low: f64::NAN,
                daily_range: f64::NAN,
                daily_volume: 0,
                running_high,
                running_low,
                running_range: (running_high - running_low) / tick_size,
            });
        }

        // running extremes after the last tick are the day's extremes
        let daily_range = (running_high - running_low) / tick_size;
        for row in &mut annotated[day_start..] {
            row.day_high = running_high;
            row.day_low = running_low;
            row.daily_range = daily_range;
            row.daily_volume = daily_volume;
        }
    }

    tracing::debug!(%instrument, ticks = annotated.len(), "annotated ranges");
    Ok(annotated)
}
