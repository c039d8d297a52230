//! Sample sources
//!
//! The scheduler pulls one row of values per tick from a [`SampleSource`].
//! The production source is a [`CycleSource`] over rows loaded from CSV: a
//! lazy, infinite cycle that restarts from the first row after the last one.
//! Its position is private to whoever owns it and does not survive a restart.

use std::io::Read;
use std::path::Path;

use crate::errors::SourceError;

/// Producer of one vector of measurements per tick
pub trait SampleSource: Send {
    /// Values for the next tick. Never exhausts.
    fn next_values(&mut self) -> Vec<f64>;

    /// Number of channels per sample (width of the first row)
    fn channel_count(&self) -> usize;
}

/// Infinite cycle over a finite, non-empty set of rows
#[derive(Debug, Clone)]
pub struct CycleSource {
    rows: Vec<Vec<f64>>,
    cursor: usize,
}

impl CycleSource {
    /// Build a cycle over `rows`. Returns `None` when `rows` is empty.
    pub fn new(rows: Vec<Vec<f64>>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(Self { rows, cursor: 0 })
    }

    /// Load rows from a CSV file and cycle over them
    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        options: &CsvOptions,
    ) -> Result<Self, SourceError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let rows = load_csv_rows(path, options)?;
        Self::new(rows).ok_or(SourceError::Empty { path: path_str })
    }

    /// Number of distinct rows in one cycle
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the row the next tick will yield
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl SampleSource for CycleSource {
    fn next_values(&mut self) -> Vec<f64> {
        let values = self.rows[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.rows.len();
        values
    }

    fn channel_count(&self) -> usize {
        self.rows[0].len()
    }
}

/// CSV loading options
#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    /// Skip the first line as a header row
    pub has_headers: bool,
}

/// Load value rows from a CSV file
///
/// Each non-blank line is one row. Fields are separated by tabs or commas,
/// and both may appear on the same line. The first field of every row is a
/// legacy timestamp and is discarded; the remaining fields become the row's
/// values. Each value is read from the field's leading number, so `"1.5V"`
/// loads as 1.5 and a field with no leading number loads as NaN.
///
/// Fails when the file cannot be read or holds no data rows.
pub fn load_csv_rows<P: AsRef<Path>>(
    path: P,
    options: &CsvOptions,
) -> Result<Vec<Vec<f64>>, SourceError> {
    let path_str = path.as_ref().to_string_lossy().to_string();

    let file = std::fs::File::open(&path).map_err(|e| SourceError::Io {
        path: path_str.clone(),
        source: e,
    })?;

    let rows = parse_csv_rows(file, &path_str, options)?;
    tracing::info!(
        path = %path_str,
        rows = rows.len(),
        channels = rows.first().map_or(0, Vec::len),
        "sample source loaded"
    );
    Ok(rows)
}

/// Parse value rows from any reader; `label` names the source in errors
pub fn parse_csv_rows<R: Read>(
    reader: R,
    label: &str,
    options: &CsvOptions,
) -> Result<Vec<Vec<f64>>, SourceError> {
    // Records split on tabs here; commas are split per field below
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(options.has_headers)
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut ragged = 0usize;
    for result in csv_reader.records() {
        let record = result.map_err(|e| SourceError::CsvParse {
            path: label.to_string(),
            line: e.position().map_or(0, |p| p.line()),
            source: e,
        })?;

        let fields: Vec<&str> = record
            .iter()
            .flat_map(|field| field.split(','))
            .map(str::trim)
            .collect();

        // Whitespace-only lines come through as a single empty field
        if fields.iter().all(|field| field.is_empty()) {
            continue;
        }

        let values: Vec<f64> = fields.into_iter().skip(1).map(parse_value).collect();
        if let Some(first) = rows.first()
            && first.len() != values.len()
        {
            ragged += 1;
        }
        rows.push(values);
    }

    if rows.is_empty() {
        return Err(SourceError::Empty {
            path: label.to_string(),
        });
    }
    if ragged > 0 {
        tracing::warn!(
            source = label,
            ragged,
            expected_channels = rows[0].len(),
            "rows with a different channel count than the first row"
        );
    }

    Ok(rows)
}

/// Leading decimal number of `field`, NaN when there is none
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent; anything after the longest such prefix is ignored.
/// `Infinity` with an optional sign reads as an infinite value.
fn parse_value(field: &str) -> f64 {
    let s = field.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |at: usize| {
        bytes[at.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let sign_len = end;

    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits + frac_digits == 0 {
        return if s[sign_len..].starts_with("Infinity") {
            if s.starts_with('-') {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }
        } else {
            f64::NAN
        };
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits_from(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}
