//! Batched optimisation logs: per-iteration values grouped into repeated runs
//!
//! A log looks like
//!
//! ```text
//! # swarm size 20
//! # Batch 1
//! 0 12.5
//! 10 3.25
//! # Batch 2
//! 0 11.0
//! 10 2.75
//! # DONE
//! ```
//!
//! Comment lines other than batch markers and `# DONE` are kept as headers.

use crate::io::error::{Result, ToolError, WithPath, computation_error, invalid_input};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Values recorded during one run, keyed by iteration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    keys: Vec<u64>,
    values: HashMap<u64, f64>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `iteration`
    pub fn add(&mut self, iteration: u64, value: f64) {
        if self.values.insert(iteration, value).is_none() {
            self.keys.push(iteration);
        }
    }

    /// Value at `iteration`
    pub fn get(&self, iteration: u64) -> Option<f64> {
        self.values.get(&iteration).copied()
    }

    /// Most recently added iteration
    pub fn last(&self) -> Option<u64> {
        self.keys.last().copied()
    }

    /// Most recently added iteration and its value
    pub fn last_item(&self) -> Option<(u64, f64)> {
        let key = self.last()?;
        self.get(key).map(|value| (key, value))
    }

    /// Iterations in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.keys.iter().copied()
    }

    /// Number of recorded iterations
    pub const fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing was recorded
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Parsed log of every batch and the header comments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchLog {
    headers: Vec<String>,
    batches: Vec<Batch>,
}

impl BatchLog {
    /// Parse a log from any buffered reader
    ///
    /// # Errors
    ///
    /// Returns an error on read failure, on a data line that is not
    /// `iteration value`, or on data before the first batch marker
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        Self::parse_from(reader, Path::new("<input>"))
    }

    /// Parse the log stored at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_path(path, "open batch log")?;
        Self::parse_from(BufReader::new(file), path)
    }

    fn parse_from<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let malformed = |line: usize, reason: &str| ToolError::MalformedLine {
            path: PathBuf::from(path),
            line,
            reason: reason.to_string(),
        };

        let mut log = Self::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line.with_path(path, "read batch log")?;
            let number = index + 1;

            if line.starts_with("# Batch") {
                log.batches.push(Batch::new());
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with('#') {
                if line.split_whitespace().nth(1) != Some("DONE") {
                    log.headers.push(line);
                }
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(iteration), Some(value), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed(number, "expected 'iteration value'"));
            };
            let iteration: u64 = iteration
                .parse()
                .map_err(|error| malformed(number, &format!("bad iteration: {error}")))?;
            let value: f64 = value
                .parse()
                .map_err(|error| malformed(number, &format!("bad value: {error}")))?;
            let batch = log
                .batches
                .last_mut()
                .ok_or_else(|| malformed(number, "data before the first batch marker"))?;
            batch.add(iteration, value);
        }
        Ok(log)
    }

    /// Header comment lines, verbatim
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Batches in file order
    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    /// Number of batches
    pub const fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether the log had no batches
    pub const fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    fn values_at(&self, iteration: u64) -> Result<Vec<f64>> {
        if self.batches.is_empty() {
            return Err(invalid_input(&"log contains no batches"));
        }
        self.batches
            .iter()
            .enumerate()
            .map(|(index, batch)| {
                batch.get(iteration).ok_or_else(|| {
                    invalid_input(&format!("batch {} has no iteration {iteration}", index + 1))
                })
            })
            .collect()
    }

    /// Mean across batches of the value at `iteration`
    ///
    /// # Errors
    ///
    /// Returns an error if there are no batches or one lacks the iteration
    pub fn average(&self, iteration: u64) -> Result<f64> {
        let values = self.values_at(iteration)?;
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Low, median and high of the values at `iteration`
    ///
    /// After sorting, `trim` values are dropped from each end before taking
    /// the low and high. With 20 batches and a trim of 2 these are the 10th
    /// and 90th percentiles.
    ///
    /// # Errors
    ///
    /// Returns an error if a batch lacks the iteration or trimming leaves
    /// nothing
    pub fn statistics(&self, iteration: u64, trim: usize) -> Result<(f64, f64, f64)> {
        let mut values = self.values_at(iteration)?;
        values.sort_by(f64::total_cmp);

        let count = values.len();
        if 2 * trim >= count {
            return Err(computation_error(
                "statistics",
                &format!("trimming {trim} from each end of {count} values leaves nothing"),
            ));
        }
        let low = values.get(trim).copied();
        let high = values.get(count - 1 - trim).copied();
        let middle = count / 2;
        let median = if count % 2 == 1 {
            values.get(middle).copied()
        } else {
            values
                .get(middle - 1)
                .zip(values.get(middle))
                .map(|(a, b)| (a + b) / 2.0)
        };

        match (low, median, high) {
            (Some(low), Some(median), Some(high)) => Ok((low, median, high)),
            _ => Err(computation_error("statistics", &"index out of range")),
        }
    }
}
