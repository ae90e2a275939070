use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::instrument::{Instrument, PerInstrument};
use crate::progress;
use crate::tick::{Session, Tick};

use rayon::prelude::*;

/// Accepted layouts for the `timestamp` column, tried in order.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Represents a single record from an input tick file.
#[derive(Debug, serde::Deserialize)]
struct TickRecord {
    timestamp: String,
    session: Session,
    price: f64,
    volume: u64,
}

fn parse_timestamp(raw: &str) -> Option<chrono::NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| chrono::NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Decodes tick records from any CSV source, keeping regular-session trades only.
///
/// `path` is used for error reporting. The result is sorted ascending by
/// timestamp; ticks sharing a timestamp keep their file order.
pub fn read_ticks<R: std::io::Read>(
    reader: R,
    path: &std::path::Path,
) -> Result<Vec<Tick>, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::MalformedRecord {
            path: path.to_path_buf(),
            line: 1,
            reason: e.to_string(),
        })?
        .clone();

    let mut ticks = Vec::new();
    for result in reader.records() {
        let raw = result.map_err(|e| AnalysisError::MalformedRecord {
            path: path.to_path_buf(),
            line: e.position().map_or(0, |p| p.line()),
            reason: e.to_string(),
        })?;
        let line = raw.position().map_or(0, |p| p.line());
        let record: TickRecord =
            raw.deserialize(Some(&headers)).map_err(|e| AnalysisError::MalformedRecord {
                path: path.to_path_buf(),
                line,
                reason: e.to_string(),
            })?;
        if record.session != Session::Rth {
            continue;
        }
        if !record.price.is_finite() {
            return Err(AnalysisError::MalformedRecord {
                path: path.to_path_buf(),
                line,
                reason: format!("non-finite price {}", record.price),
            });
        }
        let timestamp =
            parse_timestamp(&record.timestamp).ok_or_else(|| AnalysisError::MalformedRecord {
                path: path.to_path_buf(),
                line,
                reason: format!("unparseable timestamp {:?}", record.timestamp),
            })?;
        ticks.push(Tick {
            timestamp,
            session: record.session,
            price: record.price,
            volume: record.volume,
        });
    }

    ticks.sort_by_key(|tick| tick.timestamp);
    Ok(ticks)
}

/// Loads one instrument's RTH ticks from a memory-mapped CSV file.
///
/// # Errors
/// * `SourceUnavailable` if the file cannot be opened or mapped.
/// * `MalformedRecord` if a row cannot be decoded.
/// * `NoRegularSession` if the file holds no RTH ticks.
pub fn load_ticks<P: AsRef<std::path::Path>>(
    path: P,
    instrument: Instrument,
) -> Result<Vec<Tick>, AnalysisError> {
    let path = path.as_ref();
    let unavailable = |source| AnalysisError::SourceUnavailable { path: path.to_path_buf(), source };

    let file = std::fs::File::open(path).map_err(unavailable)?;
    let mmap = unsafe { memmap2::Mmap::map(&file).map_err(unavailable)? };

    let ticks = read_ticks(&mmap[..], path)?;
    if ticks.is_empty() {
        return Err(AnalysisError::NoRegularSession { instrument });
    }
    tracing::info!(
        %instrument,
        path = %path.display(),
        ticks = ticks.len(),
        "loaded regular-session ticks"
    );
    Ok(ticks)
}

/// Trims every series to the trading days all three instruments share.
///
/// The kept range is `[latest first date, earliest last date]`, so the instrument
/// with the shortest history bounds the study.
pub fn align_date_range(
    series: PerInstrument<Vec<Tick>>,
) -> Result<PerInstrument<Vec<Tick>>, AnalysisError> {
    let mut start = chrono::NaiveDate::MIN;
    let mut end = chrono::NaiveDate::MAX;
    for (instrument, ticks) in series.iter() {
        let (Some(first), Some(last)) = (ticks.first(), ticks.last()) else {
            return Err(AnalysisError::NoRegularSession { instrument });
        };
        start = start.max(first.date());
        end = end.min(last.date());
    }

    if start > end {
        return Err(AnalysisError::MisalignedDateRange { latest_start: start, earliest_end: end });
    }

    tracing::info!(%start, %end, "aligned instrument date ranges");
    Ok(PerInstrument {
        note: retain_dates(series.note, start, end),
        ultra: retain_dates(series.ultra, start, end),
        bond: retain_dates(series.bond, start, end),
    })
}

fn retain_dates(mut ticks: Vec<Tick>, start: chrono::NaiveDate, end: chrono::NaiveDate) -> Vec<Tick> {
    ticks.retain(|tick| (start..=end).contains(&tick.date()));
    ticks
}

/// Loads all three instruments from `input_dir` in parallel and aligns their dates.
pub fn load_instruments<P: AsRef<std::path::Path> + Sync>(
    input_dir: P,
    config: &AnalysisConfig,
) -> Result<PerInstrument<Vec<Tick>>, AnalysisError> {
    let bar = progress::bar(Instrument::ALL.len() as u64, "loading ticks");
    let loaded = Instrument::ALL
        .par_iter()
        .map(|&instrument| {
            let path = input_dir.as_ref().join(config.file_for(instrument));
            let ticks = load_ticks(&path, instrument);
            bar.inc(1);
            ticks.map(|ticks| (instrument, ticks))
        })
        .collect::<Result<Vec<_>, _>>()?;
    bar.finish_and_clear();

    let mut series = PerInstrument::<Vec<Tick>>::default();
    for (instrument, ticks) in loaded {
        series[instrument] = ticks;
    }
    align_date_range(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(raw: &str) -> Vec<Tick> {
        read_ticks(raw.as_bytes(), std::path::Path::new("test.csv")).unwrap()
    }

    fn tick_on(date: &str) -> Tick {
        Tick {
            timestamp: parse_timestamp(&format!("{} 08:00:00", date)).unwrap(),
            session: Session::Rth,
            price: 100.0,
            volume: 1,
        }
    }

    #[test]
    fn test_read_ticks_filters_and_sorts() {
        let ticks = read(
            "timestamp,session,price,volume\n\
             2024-03-01 08:00:05,RTH,101.0,2\n\
             2024-03-01 02:00:00,OVN,99.0,7\n\
             2024-03-01 08:00:01.250,RTH,100.5,3\n",
        );
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].price, 100.5);
        assert_eq!(ticks[0].time_ms(), 8 * 3_600_000 + 1_250);
        assert_eq!(ticks[1].volume, 2);
        assert!(ticks.iter().all(|t| t.session == Session::Rth));
    }

    #[test]
    fn test_read_ticks_accepts_iso_separator() {
        let ticks = read("timestamp,session,price,volume\n2024-03-01T09:30:00,RTH,1.0,1\n");
        assert_eq!(ticks[0].time_ms(), (9 * 3600 + 1800) * 1000);
    }

    #[test]
    fn test_read_ticks_rejects_bad_timestamp() {
        let result = read_ticks(
            "timestamp,session,price,volume\nyesterday,RTH,1.0,1\n".as_bytes(),
            std::path::Path::new("bad.csv"),
        );
        assert!(matches!(result, Err(AnalysisError::MalformedRecord { .. })));
    }

    #[test]
    fn test_read_ticks_rejects_unknown_session() {
        let result = read_ticks(
            "timestamp,session,price,volume\n2024-03-01 08:00:00,XYZ,1.0,1\n".as_bytes(),
            std::path::Path::new("bad.csv"),
        );
        assert!(matches!(result, Err(AnalysisError::MalformedRecord { .. })));
    }

    #[test]
    fn test_read_ticks_rejects_non_finite_price() {
        for price in ["NaN", "inf", "-inf"] {
            let raw = format!(
                "timestamp,session,price,volume\n\
                 2024-03-01 08:00:00,RTH,{},1\n\
                 2024-03-01 08:00:01,RTH,100.0,1\n",
                price
            );
            let result = read_ticks(raw.as_bytes(), std::path::Path::new("nan.csv"));
            match result {
                Err(AnalysisError::MalformedRecord { line, reason, .. }) => {
                    assert_eq!(line, 2);
                    assert!(reason.starts_with("non-finite price"));
                }
                other => panic!("expected MalformedRecord for {}, got {:?}", price, other),
            }
        }
    }

    #[test]
    fn test_overnight_non_finite_price_is_ignored() {
        let ticks = read(
            "timestamp,session,price,volume\n\
             2024-03-01 02:00:00,OVN,NaN,1\n\
             2024-03-01 08:00:00,RTH,100.0,1\n",
        );
        assert_eq!(ticks.len(), 1);
    }

    #[test]
    fn test_load_ticks_missing_file_is_fatal() {
        let result = load_ticks("/nonexistent/ZN.csv", Instrument::Note);
        assert!(matches!(result, Err(AnalysisError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_align_date_range_uses_overlap() {
        let series = PerInstrument {
            note: vec![tick_on("2024-03-01"), tick_on("2024-03-04"), tick_on("2024-03-05")],
            ultra: vec![tick_on("2024-03-04"), tick_on("2024-03-05")],
            bond: vec![tick_on("2024-03-01"), tick_on("2024-03-04")],
        };
        let aligned = align_date_range(series).unwrap();
        assert_eq!(aligned.note.len(), 1);
        assert_eq!(aligned.ultra.len(), 1);
        assert_eq!(aligned.bond.len(), 1);
        assert!(aligned.iter().all(|(_, ticks)| ticks[0].date().to_string() == "2024-03-04"));
    }

    #[test]
    fn test_align_date_range_without_overlap_fails() {
        let series = PerInstrument {
            note: vec![tick_on("2024-03-01")],
            ultra: vec![tick_on("2024-03-04")],
            bond: vec![tick_on("2024-03-04")],
        };
        assert!(matches!(
            align_date_range(series),
            Err(AnalysisError::MisalignedDateRange { .. })
        ));
    }
}
