use crate::error::AnalysisError;
use crate::instrument::Instrument;
use crate::pipeline::AnalysisReport;
use crate::ratio::RatioId;
use crate::utils;

/// File name of the binary report snapshot inside the output directory.
pub const SNAPSHOT_FILE: &str = "report.bin";

/// Flat `grid.csv` row: aligned samples plus every ratio.
#[derive(Debug, serde::Serialize)]
struct GridCsvRow {
    date: chrono::NaiveDate,
    time: String,
    #[serde(rename = "N_price")]
    note_price: f64,
    #[serde(rename = "N_range")]
    note_range: f64,
    #[serde(rename = "N_day_range")]
    note_day_range: f64,
    #[serde(rename = "U_price")]
    ultra_price: f64,
    #[serde(rename = "U_range")]
    ultra_range: f64,
    #[serde(rename = "U_day_range")]
    ultra_day_range: f64,
    #[serde(rename = "B_price")]
    bond_price: f64,
    #[serde(rename = "B_range")]
    bond_range: f64,
    #[serde(rename = "B_day_range")]
    bond_day_range: f64,
    #[serde(rename = "UN_cum")]
    un_cum: Option<f64>,
    #[serde(rename = "BN_cum")]
    bn_cum: Option<f64>,
    #[serde(rename = "BU_cum")]
    bu_cum: Option<f64>,
    #[serde(rename = "UN_day")]
    un_day: Option<f64>,
    #[serde(rename = "BN_day")]
    bn_day: Option<f64>,
    #[serde(rename = "BU_day")]
    bu_day: Option<f64>,
}

#[derive(Debug, serde::Serialize)]
struct SummaryCsvRow {
    ratio: String,
    count: usize,
    mean: f64,
    std_dev: Option<f64>,
    min: f64,
    q25: f64,
    median: f64,
    q75: f64,
    max: f64,
}

#[derive(Debug, serde::Serialize)]
struct ExtremumCsvRow<'a> {
    date: chrono::NaiveDate,
    ratio: String,
    window: &'a str,
    high: f64,
    low: f64,
}

#[derive(Debug, serde::Serialize)]
struct ProbabilityCsvRow<'a> {
    ratio: String,
    relationship: &'a str,
    hour: u32,
    population: usize,
    conditioned: usize,
    point: Option<f64>,
    mean: Option<f64>,
    lower: Option<f64>,
    upper: Option<f64>,
}

fn persist_error(path: &std::path::Path, error: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Persist(format!("{}: {}", path.display(), error))
}

fn write_csv<S: serde::Serialize>(
    path: &std::path::Path,
    rows: impl IntoIterator<Item = S>,
) -> Result<(), AnalysisError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| persist_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| persist_error(path, e))?;
    }
    writer.flush().map_err(|e| persist_error(path, e))?;
    tracing::debug!(path = %path.display(), "wrote table");
    Ok(())
}

/// Writes every report table as CSV into `output_dir`.
///
/// Undefined values are written as empty cells.
pub fn write_tables<P: AsRef<std::path::Path>>(
    report: &AnalysisReport,
    output_dir: P,
) -> Result<(), AnalysisError> {
    let dir = output_dir.as_ref();

    for (instrument, records) in report.daily.iter() {
        let path = dir.join(format!("daily_{}.csv", instrument.symbol()));
        write_csv(&path, records.iter())?;
    }

    let ratio_rows = report.ratios.iter();
    write_csv(
        &dir.join("grid.csv"),
        report.grid.iter().zip(ratio_rows).map(|(row, ratios)| {
            let [un_cum, bn_cum, bu_cum, un_day, bn_day, bu_day] = ratios.values;
            let samples = &row.samples;
            GridCsvRow {
                date: row.date,
                time: utils::format_secs(row.secs),
                note_price: samples[Instrument::Note].price,
                note_range: samples[Instrument::Note].running_range,
                note_day_range: samples[Instrument::Note].daily_range,
                ultra_price: samples[Instrument::Ultra].price,
                ultra_range: samples[Instrument::Ultra].running_range,
                ultra_day_range: samples[Instrument::Ultra].daily_range,
                bond_price: samples[Instrument::Bond].price,
                bond_range: samples[Instrument::Bond].running_range,
                bond_day_range: samples[Instrument::Bond].daily_range,
                un_cum,
                bn_cum,
                bu_cum,
                un_day,
                bn_day,
                bu_day,
            }
        }),
    )?;

    write_csv(
        &dir.join("ratio_summary.csv"),
        report.ratio_stats.summaries.iter().map(|(id, s)| SummaryCsvRow {
            ratio: id.name(),
            count: s.count,
            mean: s.mean,
            std_dev: s.std_dev,
            min: s.min,
            q25: s.q25,
            median: s.median,
            q75: s.q75,
            max: s.max,
        }),
    )?;

    write_csv(
        &dir.join("window_extrema.csv"),
        report.extrema.entries.iter().map(|(key, extremum)| ExtremumCsvRow {
            date: key.date,
            ratio: key.ratio.name(),
            window: &key.window,
            high: extremum.high,
            low: extremum.low,
        }),
    )?;

    write_csv(
        &dir.join("probabilities.csv"),
        report.probabilities.iter().map(|row| ProbabilityCsvRow {
            ratio: row.ratio.name(),
            relationship: &row.relationship,
            hour: row.hour,
            population: row.population,
            conditioned: row.conditioned,
            point: row.point,
            mean: row.mean,
            lower: row.lower,
            upper: row.upper,
        }),
    )?;

    tracing::info!(dir = %dir.display(), "wrote report tables");
    Ok(())
}

/// Serializes the full report with `bincode` next to the CSV tables.
pub fn save_snapshot<P: AsRef<std::path::Path>>(
    report: &AnalysisReport,
    output_dir: P,
) -> Result<std::path::PathBuf, AnalysisError> {
    let path = output_dir.as_ref().join(SNAPSHOT_FILE);
    let data = bincode::serialize(report)?;
    std::fs::write(&path, data).map_err(|e| persist_error(&path, e))?;
    Ok(path)
}

/// Loads a report previously written by [`save_snapshot`].
pub fn load_snapshot<P: AsRef<std::path::Path>>(path: P) -> Result<AnalysisReport, AnalysisError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| AnalysisError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bincode::deserialize(&data)?)
}

/// Prints the first `count` rows of the daily, grid and probability tables.
pub fn print_preview(report: &AnalysisReport, count: usize) {
    for (instrument, records) in report.daily.iter() {
        println!("📄 Daily records for {} ({} days)", instrument, records.len());
        for record in records.iter().take(count) {
            println!(
                " - date: {}, range: {:.2}, volume: {}, high: {:.4}, low: {:.4}",
                record.date, record.daily_range, record.daily_volume, record.day_high, record.day_low,
            );
        }
    }

    println!("📈 Aligned grid ({} rows)", report.grid.len());
    for ratios in report.ratios.iter().take(count) {
        let values: Vec<String> = RatioId::ALL
            .into_iter()
            .map(|id| format!("{}: {}", id, utils::format_opt(ratios.get(id))))
            .collect();
        println!(" - {} {}, {}", ratios.date, utils::format_secs(ratios.secs), values.join(", "));
    }

    println!("📊 Conditional probabilities ({} rows)", report.probabilities.len());
    for row in report.probabilities.iter().take(count) {
        println!(
            " - {} {} @{}h: n={}, p={}, mean={}, ci=[{}, {}]",
            row.ratio,
            row.relationship,
            row.hour,
            row.conditioned,
            utils::format_opt(row.point),
            utils::format_opt(row.mean),
            utils::format_opt(row.lower),
            utils::format_opt(row.upper),
        );
    }
}
