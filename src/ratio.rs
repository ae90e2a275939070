use crate::index;
use crate::instrument::Instrument;
use crate::resample::GridRow;

/// Instrument pairs whose relative volatility is compared, numerator first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum RatioPair {
    UltraNote,
    BondNote,
    BondUltra,
}

impl RatioPair {
    pub const ALL: [RatioPair; 3] = [RatioPair::UltraNote, RatioPair::BondNote, RatioPair::BondUltra];

    pub fn instruments(self) -> (Instrument, Instrument) {
        match self {
            RatioPair::UltraNote => (Instrument::Ultra, Instrument::Note),
            RatioPair::BondNote => (Instrument::Bond, Instrument::Note),
            RatioPair::BondUltra => (Instrument::Bond, Instrument::Ultra),
        }
    }
}

/// Which range feeds a ratio.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Basis {
    /// Running range up to the grid time.
    Cumulative,
    /// Full-day range, constant within a day.
    Daily,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RatioId {
    pub pair: RatioPair,
    pub basis: Basis,
}

impl RatioId {
    /// Every ratio, in the column order of [`RatioRow::values`].
    pub const ALL: [RatioId; 6] = [
        RatioId { pair: RatioPair::UltraNote, basis: Basis::Cumulative },
        RatioId { pair: RatioPair::BondNote, basis: Basis::Cumulative },
        RatioId { pair: RatioPair::BondUltra, basis: Basis::Cumulative },
        RatioId { pair: RatioPair::UltraNote, basis: Basis::Daily },
        RatioId { pair: RatioPair::BondNote, basis: Basis::Daily },
        RatioId { pair: RatioPair::BondUltra, basis: Basis::Daily },
    ];

    pub fn cumulative() -> impl Iterator<Item = RatioId> {
        Self::ALL.into_iter().filter(|id| id.basis == Basis::Cumulative)
    }

    pub fn position(self) -> usize {
        let offset = match self.basis {
            Basis::Cumulative => 0,
            Basis::Daily => 3,
        };
        let pair = match self.pair {
            RatioPair::UltraNote => 0,
            RatioPair::BondNote => 1,
            RatioPair::BondUltra => 2,
        };
        offset + pair
    }

    /// Short name such as `UN_cum` or `BU_day`.
    pub fn name(self) -> String {
        let (numerator, denominator) = self.pair.instruments();
        let suffix = match self.basis {
            Basis::Cumulative => "cum",
            Basis::Daily => "day",
        };
        format!("{}{}_{}", numerator.symbol(), denominator.symbol(), suffix)
    }
}

impl std::fmt::Display for RatioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Quotient of two range magnitudes; undefined when the denominator is zero or
/// the result is not finite.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}

/// All six ratios on one grid timestamp.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RatioRow {
    pub date: chrono::NaiveDate,
    pub secs: u32,
    pub values: [Option<f64>; 6],
}

impl RatioRow {
    pub fn get(&self, id: RatioId) -> Option<f64> {
        self.values[id.position()]
    }
}

/// Derives every pairwise ratio for each aligned grid row.
///
/// # Arguments
/// * `rows` - Aligned grid rows from [`crate::resample::resample_grid`].
///
/// # Returns
/// * `Vec<RatioRow>` - One row per input row; a zero or undefined denominator
///   leaves that ratio `None`.
pub fn compute_ratios(rows: &[GridRow]) -> Vec<RatioRow> {
    rows.iter()
        .map(|row| {
            let mut values = [None; 6];
            for id in RatioId::ALL {
                let (numerator, denominator) = id.pair.instruments();
                let (a, b) = (&row.samples[numerator], &row.samples[denominator]);
                values[id.position()] = match id.basis {
                    Basis::Cumulative => safe_ratio(a.running_range, b.running_range),
                    Basis::Daily => safe_ratio(a.daily_range, b.daily_range),
                };
            }
            RatioRow { date: row.date, secs: row.secs, values }
        })
        .collect()
}

/// Half-open clock window `[lower, upper)` in seconds since midnight.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Window {
    pub label: String,
    pub lower: u32,
    pub upper: u32,
}

impl Window {
    pub fn contains(&self, secs: u32) -> bool {
        (self.lower..self.upper).contains(&secs)
    }

    pub fn before(hour: u32) -> String {
        format!("B{}", hour)
    }

    pub fn after(hour: u32) -> String {
        format!("A{}", hour)
    }
}

/// Builds the clock windows for a set of ascending hour boundaries.
///
/// For each hour H: `B{H}` covers `[start, H)` and `A{H}` covers `[H, end]`.
/// Consecutive boundaries a, b also get `H{a}-{b}` covering `[a, b)`, so five
/// boundaries give 14 windows.
///
/// # Arguments
/// * `hour_boundaries` - Ascending clock hours.
/// * `start_secs` - Lower edge of every `B{H}` window.
/// * `end_secs` - Last second covered by every `A{H}` window.
pub fn build_windows(hour_boundaries: &[u32], start_secs: u32, end_secs: u32) -> Vec<Window> {
    let mut windows = Vec::with_capacity(hour_boundaries.len() * 3);
    for &hour in hour_boundaries {
        let boundary = hour.saturating_mul(3600);
        windows.push(Window { label: Window::before(hour), lower: start_secs, upper: boundary });
        windows.push(Window { label: Window::after(hour), lower: boundary, upper: end_secs + 1 });
    }
    for pair in hour_boundaries.windows(2) {
        windows.push(Window {
            label: format!("H{}-{}", pair[0], pair[1]),
            lower: pair[0].saturating_mul(3600),
            upper: pair[1].saturating_mul(3600),
        });
    }
    windows
}

/// Highest and lowest defined ratio value inside one window of one day.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Extremum {
    pub high: f64,
    pub low: f64,
}

impl Extremum {
    fn absorb(slot: &mut Option<Extremum>, value: f64) {
        match slot {
            Some(extremum) => {
                extremum.high = extremum.high.max(value);
                extremum.low = extremum.low.min(value);
            }
            None => *slot = Some(Extremum { high: value, low: value }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct WindowKey {
    pub date: chrono::NaiveDate,
    pub ratio: RatioId,
    pub window: String,
}

/// Window extrema keyed by `(date, ratio, window)`.
///
/// A key is absent when the window held no defined ratio value that day.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WindowExtrema {
    pub entries: std::collections::BTreeMap<WindowKey, Extremum>,
}

impl WindowExtrema {
    pub fn get(&self, date: chrono::NaiveDate, ratio: RatioId, window: &str) -> Option<&Extremum> {
        self.entries.get(&WindowKey { date, ratio, window: window.to_string() })
    }

    /// Distinct dates carrying at least one extremum, in order.
    pub fn dates(&self) -> Vec<chrono::NaiveDate> {
        let mut dates: Vec<_> = self.entries.keys().map(|key| key.date).collect();
        dates.dedup();
        dates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Computes the max and min of every ratio within every window, per day.
///
/// Undefined ratio values are skipped; a (day, window, ratio) left with no
/// values produces no entry.
///
/// # Arguments
/// * `rows` - Ratio rows in date then time order.
/// * `windows` - Windows from [`build_windows`].
pub fn window_extrema(rows: &[RatioRow], windows: &[Window]) -> WindowExtrema {
    let mut extrema = WindowExtrema::default();
    for day in index::day_index(rows, |row| row.date) {
        let day_rows = &rows[day.range()];
        for window in windows {
            let mut slots = [None::<Extremum>; 6];
            for row in day_rows.iter().filter(|row| window.contains(row.secs)) {
                for (slot, value) in slots.iter_mut().zip(row.values) {
                    if let Some(value) = value {
                        Extremum::absorb(slot, value);
                    }
                }
            }
            for id in RatioId::ALL {
                if let Some(extremum) = slots[id.position()] {
                    extrema.entries.insert(
                        WindowKey { date: day.date, ratio: id, window: window.label.clone() },
                        extremum,
                    );
                }
            }
        }
    }
    tracing::info!(windows = windows.len(), entries = extrema.len(), "computed window extrema");
    extrema
}
