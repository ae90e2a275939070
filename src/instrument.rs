/// Interest-rate futures contracts taking part in the study.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// 10-year Treasury note.
    Note,
    /// Ultra 10-year Treasury note.
    Ultra,
    /// 30-year Treasury bond.
    Bond,
}

impl Instrument {
    pub const ALL: [Instrument; 3] = [Instrument::Note, Instrument::Ultra, Instrument::Bond];

    /// Single-letter code used in ratio names and output columns.
    pub fn symbol(self) -> &'static str {
        match self {
            Instrument::Note => "N",
            Instrument::Ultra => "U",
            Instrument::Bond => "B",
        }
    }

    /// Minimum price increment in the data's price units.
    pub fn default_tick_size(self) -> f64 {
        match self {
            Instrument::Note | Instrument::Ultra => 156.25,
            Instrument::Bond => 312.5,
        }
    }

    pub fn default_file(self) -> &'static str {
        match self {
            Instrument::Note => "ZN.csv",
            Instrument::Ultra => "TN.csv",
            Instrument::Bond => "ZB.csv",
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Instrument::Note => "note",
            Instrument::Ultra => "ultra",
            Instrument::Bond => "bond",
        };
        f.write_str(name)
    }
}

/// One value per instrument, indexable by [`Instrument`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PerInstrument<T> {
    pub note: T,
    pub ultra: T,
    pub bond: T,
}

impl<T> PerInstrument<T> {
    pub fn from_fn(mut f: impl FnMut(Instrument) -> T) -> Self {
        PerInstrument {
            note: f(Instrument::Note),
            ultra: f(Instrument::Ultra),
            bond: f(Instrument::Bond),
        }
    }

    pub fn try_from_fn<E>(mut f: impl FnMut(Instrument) -> Result<T, E>) -> Result<Self, E> {
        Ok(PerInstrument {
            note: f(Instrument::Note)?,
            ultra: f(Instrument::Ultra)?,
            bond: f(Instrument::Bond)?,
        })
    }

    pub fn map<U>(&self, mut f: impl FnMut(Instrument, &T) -> U) -> PerInstrument<U> {
        PerInstrument {
            note: f(Instrument::Note, &self.note),
            ultra: f(Instrument::Ultra, &self.ultra),
            bond: f(Instrument::Bond, &self.bond),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Instrument, &T)> {
        Instrument::ALL.into_iter().map(move |instrument| (instrument, &self[instrument]))
    }
}

impl<T> std::ops::Index<Instrument> for PerInstrument<T> {
    type Output = T;

    fn index(&self, instrument: Instrument) -> &T {
        match instrument {
            Instrument::Note => &self.note,
            Instrument::Ultra => &self.ultra,
            Instrument::Bond => &self.bond,
        }
    }
}

impl<T> std::ops::IndexMut<Instrument> for PerInstrument<T> {
    fn index_mut(&mut self, instrument: Instrument) -> &mut T {
        match instrument {
            Instrument::Note => &mut self.note,
            Instrument::Ultra => &mut self.ultra,
            Instrument::Bond => &mut self.bond,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_instrument_indexing() {
        let mut set = PerInstrument::from_fn(|instrument| instrument.symbol().to_string());
        assert_eq!(set[Instrument::Ultra], "U");
        set[Instrument::Bond].push('!');
        assert_eq!(set.bond, "B!");
        let lengths = set.map(|_, s| s.len());
        assert_eq!(lengths, PerInstrument { note: 1, ultra: 1, bond: 2 });
        let order: Vec<Instrument> = set.iter().map(|(instrument, _)| instrument).collect();
        assert_eq!(order, Instrument::ALL.to_vec());
    }

    #[test]
    fn test_try_from_fn_short_circuits() {
        let result: Result<PerInstrument<u8>, Instrument> = PerInstrument::try_from_fn(|instrument| {
            if instrument == Instrument::Ultra { Err(instrument) } else { Ok(1) }
        });
        assert_eq!(result, Err(Instrument::Ultra));
    }
}
