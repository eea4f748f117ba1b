// Puzzle catalog: move count -> remaining puzzles, with random pop-without-replacement.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DataSourceError;

/// Legacy spelled-out keys accepted in the data source.
const WORD_KEYS: [(&str, u32); 7] = [
    ("seven", 7),
    ("nine", 9),
    ("eleven", 11),
    ("thirteen", 13),
    ("fifteen", 15),
    ("seventeen", 17),
    ("nineteen", 19),
];

/// Number of moves to mate. Always a positive odd number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MoveCount(u32);

impl MoveCount {
    /// Returns `None` for zero and even numbers.
    pub fn new(moves: u32) -> Option<Self> {
        (moves % 2 == 1).then_some(Self(moves))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Parse a data-source key: decimal digits or a legacy English word.
    pub fn from_key(key: &str) -> Result<Self, DataSourceError> {
        let moves = match key.parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) => WORD_KEYS
                .iter()
                .find(|(word, _)| *word == key)
                .map(|&(_, n)| n),
        };
        moves
            .and_then(Self::new)
            .ok_or_else(|| DataSourceError::InvalidKey(key.to_string()))
    }
}

impl fmt::Display for MoveCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One mating problem: the board image and its solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub question_image: String,
    pub answer: String,
}

/// One line of the stock report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockEntry {
    pub moves: MoveCount,
    pub remaining: usize,
}

/// Remaining puzzles per move count, in the order the data source lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<(MoveCount, Vec<PuzzleRecord>)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the puzzle list for `moves`, keeping its position if already present.
    pub fn insert(&mut self, moves: MoveCount, records: Vec<PuzzleRecord>) {
        match self.records_mut(moves) {
            Some(existing) => *existing = records,
            None => self.entries.push((moves, records)),
        }
    }

    fn records(&self, moves: MoveCount) -> Option<&Vec<PuzzleRecord>> {
        self.entries
            .iter()
            .find(|(key, _)| *key == moves)
            .map(|(_, records)| records)
    }

    fn records_mut(&mut self, moves: MoveCount) -> Option<&mut Vec<PuzzleRecord>> {
        self.entries
            .iter_mut()
            .find(|(key, _)| *key == moves)
            .map(|(_, records)| records)
    }

    /// Build a catalog from a JSON object of `{ "<moves>": [record, ...] }`.
    ///
    /// Keys keep their source order. Two keys naming the same move count,
    /// including a literally repeated key, are rejected.
    pub fn from_json(contents: &str) -> Result<Self, DataSourceError> {
        let SourceEntries(raw) = serde_json::from_str(contents)?;
        let mut catalog = Catalog::new();
        for (key, records) in raw {
            let moves = MoveCount::from_key(&key)?;
            if catalog.records(moves).is_some() {
                return Err(DataSourceError::DuplicateKey(moves.get()));
            }
            catalog.entries.push((moves, records));
        }
        Ok(catalog)
    }

    /// Remove and return a uniformly chosen puzzle for `moves`.
    ///
    /// Returns `None` when the key is unknown or its list is exhausted.
    pub fn pop_random(&mut self, moves: MoveCount) -> Option<PuzzleRecord> {
        self.pop_random_with(moves, &mut rand::thread_rng())
    }

    /// Same as [`Catalog::pop_random`] with a caller-supplied RNG.
    pub fn pop_random_with<R: Rng + ?Sized>(
        &mut self,
        moves: MoveCount,
        rng: &mut R,
    ) -> Option<PuzzleRecord> {
        let records = self.records_mut(moves)?;
        if records.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..records.len());
        Some(records.remove(index))
    }

    /// Every key with its remaining count, in catalog order.
    pub fn stock_report(&self) -> Vec<StockEntry> {
        self.entries
            .iter()
            .map(|(moves, records)| StockEntry {
                moves: *moves,
                remaining: records.len(),
            })
            .collect()
    }

    pub fn remaining(&self, moves: MoveCount) -> usize {
        self.records(moves).map_or(0, Vec::len)
    }

    pub fn total_remaining(&self) -> usize {
        self.entries.iter().map(|(_, records)| records.len()).sum()
    }
}

impl FromIterator<(MoveCount, Vec<PuzzleRecord>)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (MoveCount, Vec<PuzzleRecord>)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (moves, records) in iter {
            catalog.insert(moves, records);
        }
        catalog
    }
}

/// The raw data-source object as `(key, records)` pairs in source order.
/// Repeated keys are kept, not merged.
struct SourceEntries(Vec<(String, Vec<PuzzleRecord>)>);

impl<'de> Deserialize<'de> for SourceEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = SourceEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of move counts to puzzle lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Vec<PuzzleRecord>>()? {
                    entries.push(entry);
                }
                Ok(SourceEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

// ── Data sources ─────────────────────────────────────────────────────

/// Something that can produce a fresh catalog on demand.
pub trait DataSource: Send + Sync {
    fn load(&self) -> Result<Catalog, DataSourceError>;
}

impl<F> DataSource for F
where
    F: Fn() -> Result<Catalog, DataSourceError> + Send + Sync,
{
    fn load(&self) -> Result<Catalog, DataSourceError> {
        self()
    }
}

/// Reads the catalog from a JSON file each time it is loaded.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for JsonFileSource {
    fn load(&self) -> Result<Catalog, DataSourceError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|source| DataSourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        Catalog::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(image: &str) -> PuzzleRecord {
        PuzzleRecord {
            question_image: image.into(),
            answer: format!("answer for {image}"),
        }
    }

    fn moves(n: u32) -> MoveCount {
        MoveCount::new(n).unwrap()
    }

    #[test]
    fn test_move_count_rejects_even_and_zero() {
        assert!(MoveCount::new(0).is_none());
        assert!(MoveCount::new(8).is_none());
        assert_eq!(MoveCount::new(7).map(MoveCount::get), Some(7));
    }

    #[test]
    fn test_move_count_from_key() {
        assert_eq!(MoveCount::from_key("11").unwrap(), moves(11));
        assert_eq!(MoveCount::from_key("nineteen").unwrap(), moves(19));
        assert!(matches!(
            MoveCount::from_key("8"),
            Err(DataSourceError::InvalidKey(k)) if k == "8"
        ));
        assert!(MoveCount::from_key("eight").is_err());
        assert!(MoveCount::from_key("").is_err());
    }

    #[test]
    fn test_from_json_keeps_source_order() {
        let json = r#"{
            "13": [{"question_image": "c.png", "answer": "c"}],
            "seven": [
                {"question_image": "a.png", "answer": "a"},
                {"question_image": "b.png", "answer": "b"}
            ]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        let report = catalog.stock_report();
        assert_eq!(
            report,
            vec![
                StockEntry { moves: moves(13), remaining: 1 },
                StockEntry { moves: moves(7), remaining: 2 },
            ]
        );

        let images: Vec<_> = catalog.records(moves(7)).unwrap()
            .iter()
            .map(|r| r.question_image.as_str())
            .collect();
        assert_eq!(images, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_from_json_rejects_duplicate_keys() {
        let json = r#"{"7": [], "seven": []}"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(DataSourceError::DuplicateKey(7))
        ));
    }

    #[test]
    fn test_from_json_rejects_repeated_literal_key() {
        let json = r#"{
            "7": [{"question_image": "a.png", "answer": "a"}],
            "7": []
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(DataSourceError::DuplicateKey(7))
        ));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut catalog: Catalog = [(moves(11), vec![]), (moves(7), vec![])]
            .into_iter()
            .collect();
        catalog.insert(moves(11), vec![record("a.png")]);
        assert_eq!(
            catalog.stock_report(),
            vec![
                StockEntry { moves: moves(11), remaining: 1 },
                StockEntry { moves: moves(7), remaining: 0 },
            ]
        );
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(
            Catalog::from_json("{\"7\": [{\"image\": \"x\"}]}"),
            Err(DataSourceError::Parse(_))
        ));
        assert!(matches!(
            Catalog::from_json("{\"6\": []}"),
            Err(DataSourceError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_pop_random_exhausts_without_repeats() {
        let records: Vec<_> = (0..10).map(|i| record(&format!("{i}.png"))).collect();
        let mut catalog: Catalog = [(moves(9), records.clone())].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(42);

        let mut served = Vec::new();
        for left in (0..10).rev() {
            served.push(catalog.pop_random_with(moves(9), &mut rng).unwrap());
            assert_eq!(catalog.remaining(moves(9)), left);
        }
        assert!(catalog.pop_random_with(moves(9), &mut rng).is_none());

        served.sort_by(|a, b| a.question_image.cmp(&b.question_image));
        let mut expected = records;
        expected.sort_by(|a, b| a.question_image.cmp(&b.question_image));
        assert_eq!(served, expected);
    }

    #[test]
    fn test_pop_random_unknown_key_is_empty() {
        let mut catalog: Catalog = [(moves(7), vec![record("a.png")])].into_iter().collect();
        assert!(catalog.pop_random(moves(11)).is_none());
        assert_eq!(catalog.total_remaining(), 1);
    }

    #[test]
    fn test_pop_random_preserves_order_of_remaining() {
        let images = ["a.png", "b.png", "c.png", "d.png"];
        let mut catalog: Catalog = [(moves(7), images.iter().map(|i| record(i)).collect())]
            .into_iter()
            .collect();
        let popped = catalog.pop_random(moves(7)).unwrap();

        let expected: Vec<_> = images
            .into_iter()
            .filter(|img| *img != popped.question_image)
            .collect();
        let actual: Vec<_> = catalog.records(moves(7)).unwrap()
            .iter()
            .map(|r| r.question_image.as_str())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_json_file_source_missing_file() {
        let source = JsonFileSource::new("/nonexistent/tsume.json");
        assert!(matches!(source.load(), Err(DataSourceError::Io { .. })));
    }

    #[test]
    fn test_closure_data_source() {
        let source = || -> Result<Catalog, DataSourceError> {
            Ok(Catalog::from_iter([(moves(7), vec![record("a.png")])]))
        };
        assert_eq!(source.load().unwrap().total_remaining(), 1);
    }
}
