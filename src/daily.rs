use crate::index;
use crate::range::AnnotatedTick;

/// End-of-day summary of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DailyRecord {
    pub date: chrono::NaiveDate,
    pub daily_range: f64,
    pub daily_volume: u64,
    pub day_high: f64,
    pub day_low: f64,
    pub tick_count: usize,
}

/// Reduces an annotated tick stream to one record per trading day.
///
/// Day-level fields are already constant across a day's rows, so each record is
/// projected from the day's first tick rather than recomputed.
pub fn daily_records(annotated: &[AnnotatedTick]) -> Vec<DailyRecord> {
    index::day_index(annotated, |tick| tick.date)
        .into_iter()
        .map(|day| {
            let first = &annotated[day.start_index];
            DailyRecord {
                date: day.date,
                daily_range: first.daily_range,
                daily_volume: first.daily_volume,
                day_high: first.day_high,
                day_low: first.day_low,
                tick_count: day.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;
    use crate::range;
    use crate::tick::{Session, Tick};

    #[test]
    fn test_one_record_per_day_in_order() {
        let mut ticks = Vec::new();
        for (day, prices) in [(1u32, vec![100.0, 103.0, 101.0]), (4, vec![99.0]), (5, vec![98.0, 97.0])] {
            let date = chrono::NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
            for (i, price) in prices.into_iter().enumerate() {
                ticks.push(Tick {
                    timestamp: date.and_hms_opt(9, 0, i as u32).unwrap(),
                    session: Session::Rth,
                    price,
                    volume: 5,
                });
            }
        }
        let annotated = range::annotate(Instrument::Note, &ticks, 1.0).unwrap();
        let daily = daily_records(&annotated);

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].daily_range, 3.0);
        assert_eq!(daily[0].daily_volume, 15);
        assert_eq!(daily[0].tick_count, 3);
        assert_eq!(daily[1].daily_range, 0.0);
        assert_eq!(daily[2].day_low, 97.0);
        assert!(daily.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_empty_stream_has_no_records() {
        assert!(daily_records(&[]).is_empty());
    }
}
