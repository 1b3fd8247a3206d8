use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;
pub mod chart;
pub mod error;
pub mod game;
pub mod plot;
pub mod solve;

pub use error::{Error, LoadFailure};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Columns of the fictitious play csv that get plotted.
pub const EPSILON: &str = "epsilon";
pub const PAYOFF: &str = "payoff";

/// Field values read as missing, the same set pandas treats as NA by default.
pub const NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Numeric columns loaded by name from a csv file.
/// Only the requested columns are kept; the row order of the file is preserved.
#[derive(Debug, Clone)]
pub struct Table {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(names: &[&str]) -> Table {
        Table {
            names: names.iter().map(|n| n.to_string()).collect(),
            values: names.iter().map(|_| Vec::new()).collect(),
        }
    }

    /// Init a Table from csv, checking that every required column is in the header
    /// before any value is read.
    /// Missing fields and the `NA_VALUES` become NAN, anything else that is not a number is an error.
    pub fn from_csv(fin: &Path, required: &[&str]) -> Result<Table, Error> {
        let file = File::open(fin).map_err(|e| Error::load(fin, LoadFailure::Io(e)))?;
        Table::from_reader(BufReader::new(file), fin, required)
    }

    pub fn from_reader<R: BufRead>(buf: R, fin: &Path, required: &[&str]) -> Result<Table, Error> {
        let mut lines = buf.lines();
        let header = match lines.next() {
            Some(Ok(h)) => h,
            Some(Err(e)) => return Err(Error::load(fin, LoadFailure::Io(e))),
            None => return Err(Error::load(fin, LoadFailure::Empty)),
        };
        let header = split_record(header.trim_start_matches('\u{feff}'));
        let mut positions = Vec::with_capacity(required.len());
        for &name in required {
            match header.iter().position(|h| h == name) {
                Some(p) => positions.push(p),
                None => {
                    return Err(Error::MissingColumn {
                        path: fin.to_path_buf(),
                        column: name.to_string(),
                    })
                }
            }
        }

        let mut table = Table::new(required);
        for (n, l) in lines.enumerate() {
            let line_number = n + 2;
            let l = l.map_err(|e| Error::load(fin, LoadFailure::Io(e)))?;
            if l.trim().is_empty() {
                continue;
            }
            let fields = split_record(&l);
            if fields.len() > header.len() {
                return Err(Error::load(
                    fin,
                    LoadFailure::Ragged {
                        line: line_number,
                        expected: header.len(),
                        found: fields.len(),
                    },
                ));
            }
            for ((&p, &name), column) in positions
                .iter()
                .zip(required.iter())
                .zip(table.values.iter_mut())
            {
                let v = match fields.get(p).map(|f| f.as_str()) {
                    None => f64::NAN,
                    Some(f) if NA_VALUES.contains(&f) => f64::NAN,
                    Some(f) => f.parse().map_err(|_| {
                        Error::load(
                            fin,
                            LoadFailure::InvalidValue {
                                line: line_number,
                                column: name.to_string(),
                                value: f.to_string(),
                            },
                        )
                    })?,
                };
                column.push(v);
            }
        }
        debug!("loaded {} rows from {}", table.len(), fin.display());
        Ok(table)
    }

    /// (name, values) in the order the columns were requested
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.values.iter().map(|v| &v[..]))
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.values[i][..])
    }

    /// number of rows
    pub fn len(&self) -> usize {
        self.values.first().map_or(0, |v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits one csv record on commas, honouring double quotes and "" escapes.
/// Fields are trimmed of surrounding whitespace.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    quoted = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            ',' if !quoted => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// min and max of the values that pass the filter, None if no value does
pub fn min_and_max<T, F>(s: &[T], keep: F) -> Option<(T, T)>
where
    T: std::cmp::PartialOrd + Copy,
    F: Fn(&T) -> bool,
{
    let mut self_iter = s.iter().filter(|v| keep(*v));
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}
