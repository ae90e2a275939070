/// Contiguous run of rows sharing one trading date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DayIndexEntry {
    pub date: chrono::NaiveDate,
    pub start_index: usize,
    /// One past the last row of the day.
    pub end_index: usize,
}

impl DayIndexEntry {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_index..self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }
}

/// Builds the per-day index of a date-ordered sequence.
///
/// A new entry starts whenever `date_of` changes between neighbouring rows.
pub fn day_index<T>(items: &[T], date_of: impl Fn(&T) -> chrono::NaiveDate) -> Vec<DayIndexEntry> {
    let mut daily_index = Vec::new();
    let mut current_day = None::<chrono::NaiveDate>;
    let mut day_start_index = 0usize;

    for (i, item) in items.iter().enumerate() {
        let date = date_of(item);
        match current_day {
            Some(day) if day == date => {}
            Some(day) => {
                daily_index.push(DayIndexEntry { date: day, start_index: day_start_index, end_index: i });
                day_start_index = i;
                current_day = Some(date);
            }
            None => {
                current_day = Some(date);
                day_start_index = i;
            }
        }
    }

    // last day
    if let Some(day) = current_day {
        daily_index.push(DayIndexEntry {
            date: day,
            start_index: day_start_index,
            end_index: items.len(),
        });
    }

    daily_index
}
