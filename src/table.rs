//! Sample-keyed CSV tables.
//!
//! Both utilities in this crate operate on small tables whose rows are
//! identified by a `Sample` column. `SampleTable` keeps rows in file order
//! and columns in header order, so output files line up with their inputs.

use std::fs::File;
use std::io::{Read, Write};

use indexmap::IndexMap;
use log::warn;

/// Column holding the unique sample identifier.
pub const SAMPLE_COLUMN: &str = "Sample";

/// An ordered, sample-keyed table of string cells.
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    columns: Vec<String>,
    rows: IndexMap<String, IndexMap<String, String>>,
}

impl SampleTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: IndexMap::new(),
        }
    }

    /// Read a table from a CSV file. The header must contain a `Sample` column.
    pub fn read_csv(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path)
            .map_err(|e| std::io::Error::other(format!("Error opening table {}: {}", path, e)))?;
        Self::from_reader(file)
            .map_err(|e| format!("Error reading table {}: {}", path, e).into())
    }

    /// Read a table from any reader producing CSV with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Box<dyn std::error::Error>> {
        let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
        let headers = rdr.headers()?.clone();

        let sample_idx = headers
            .iter()
            .position(|h| h.trim() == SAMPLE_COLUMN)
            .ok_or_else(|| format!("No '{}' column in header", SAMPLE_COLUMN))?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != sample_idx)
            .map(|(_, h)| h.trim().to_string())
            .collect();

        let mut table = Self::new(columns);
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| format!("Row {}: {}", line + 2, e))?;
            let sample = record
                .get(sample_idx)
                .unwrap_or_default()
                .trim()
                .to_string();
            if sample.is_empty() {
                warn!("Row {} has an empty sample key - row is ignored", line + 2);
                continue;
            }
            if table.rows.contains_key(&sample) {
                warn!(
                    "Duplicate sample key '{}' at row {} - row is ignored",
                    sample,
                    line + 2
                );
                continue;
            }
            let mut cells = IndexMap::new();
            let mut col = 0;
            for (i, value) in record.iter().enumerate() {
                if i == sample_idx {
                    continue;
                }
                if let Some(name) = table.columns.get(col) {
                    cells.insert(name.clone(), value.to_string());
                }
                col += 1;
            }
            table.rows.insert(sample, cells);
        }
        Ok(table)
    }

    /// Write the table to a CSV file, `Sample` leftmost, one row per sample.
    pub fn write_csv(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let file = File::create(path)
            .map_err(|e| std::io::Error::other(format!("Error creating {}: {}", path, e)))?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Box<dyn std::error::Error>> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(SAMPLE_COLUMN);
        header.extend(self.columns.iter().map(|c| c.as_str()));
        wtr.write_record(&header)?;

        for (sample, cells) in &self.rows {
            let mut row = Vec::with_capacity(self.columns.len() + 1);
            row.push(sample.as_str());
            for col in &self.columns {
                row.push(cells.get(col).map(|s| s.as_str()).unwrap_or(""));
            }
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Column names, excluding the sample key.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Sample keys in row order.
    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, sample: &str) -> bool {
        self.rows.contains_key(sample)
    }

    /// Cell lookup. `None` when either the sample or the column is absent.
    pub fn get(&self, sample: &str, column: &str) -> Option<&str> {
        self.rows.get(sample).and_then(|r| r.get(column)).map(|s| s.as_str())
    }

    /// Set a cell, registering the column if it is new.
    pub fn set(&mut self, sample: &str, column: &str, value: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        self.rows
            .entry(sample.to_string())
            .or_default()
            .insert(column.to_string(), value.to_string());
    }

    /// Remove columns by name. Unknown names are ignored.
    pub fn drop_columns(&mut self, names: &[&str]) {
        self.columns.retain(|c| !names.contains(&c.as_str()));
        for cells in self.rows.values_mut() {
            cells.retain(|c, _| !names.contains(&c.as_str()));
        }
    }

    /// Reorder rows to the given key sequence, keeping only keys present here.
    pub fn align_to<'a, I>(&self, keys: I) -> SampleTable
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut aligned = Self::new(self.columns.clone());
        for key in keys {
            if let Some(cells) = self.rows.get(key) {
                aligned.rows.insert(key.to_string(), cells.clone());
            }
        }
        aligned
    }
}
