/// Trading session a tick was printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Session {
    /// Regular trading hours.
    #[serde(rename = "RTH")]
    Rth,
    /// Overnight session.
    #[serde(rename = "OVN")]
    Ovn,
}

/// A single trade observation for one instrument, in exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub timestamp: chrono::NaiveDateTime,
    pub session: Session,
    pub price: f64,
    pub volume: u64,
}

impl Tick {
    pub fn date(&self) -> chrono::NaiveDate {
        self.timestamp.date()
    }

    /// Milliseconds elapsed since local midnight.
    pub fn time_ms(&self) -> i64 {
        use chrono::Timelike;
        let time = self.timestamp.time();
        time.num_seconds_from_midnight() as i64 * 1000 + (time.nanosecond() / 1_000_000) as i64
    }
}
