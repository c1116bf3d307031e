//! Generic tabular source parser.
//!
//! Provides a streaming parser for delimited classification exports whose
//! columns are identified by header name rather than position.

use std::collections::HashMap;
use std::io::Read;
use std::marker::PhantomData;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::types::{MknError, MknResult, ParseConfig};

/// Trait for types that can be parsed from tabular records.
///
/// Implement this trait for each row shape of a tabular source.
pub trait TabularRecord: Sized {
    /// Column names that must appear in the header.
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Parse a record from a CSV StringRecord.
    fn from_record(record: &StringRecord, columns: &ColumnMap) -> MknResult<Self>;

    /// Returns true if this record passes the given filter config.
    fn passes_filter(&self, config: &ParseConfig) -> bool;
}

/// Header name to column position mapping.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    /// Builds the mapping from a header record.
    pub fn from_headers(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                // Handle UTF-8 BOM at start of file
                let name = name.trim_start_matches('\u{feff}').trim();
                (name.to_string(), i)
            })
            .collect();
        Self { positions }
    }

    /// Returns true if the header contains the column.
    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Returns the trimmed field value for a column, or `""` when the
    /// column is absent or the row is short.
    pub fn get<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }
}

/// A streaming parser for tabular sources.
///
/// Reads record-by-record; filtered records are skipped and counted.
pub struct TabularParser<R: Read, T: TabularRecord> {
    reader: Reader<R>,
    columns: ColumnMap,
    config: ParseConfig,
    records_read: usize,
    records_filtered: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: TabularRecord> TabularParser<&'a [u8], T> {
    /// Creates a parser over in-memory content.
    pub fn from_content(content: &'a str, config: ParseConfig) -> MknResult<Self> {
        Self::from_reader(content.as_bytes(), config)
    }
}

impl<R: Read, T: TabularRecord> TabularParser<R, T> {
    /// Creates a new parser from a reader.
    ///
    /// # Errors
    /// Returns [`MknError::MissingColumn`] if a required column is absent
    /// from the header.
    pub fn from_reader(reader: R, config: ParseConfig) -> MknResult<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(config.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(reader);

        let columns = Self::validate_headers(&mut csv_reader)?;

        Ok(Self {
            reader: csv_reader,
            columns,
            config,
            records_read: 0,
            records_filtered: 0,
            _marker: PhantomData,
        })
    }

    /// Validates that every required column is present.
    fn validate_headers(reader: &mut Reader<R>) -> MknResult<ColumnMap> {
        let columns = ColumnMap::from_headers(reader.headers()?);

        for required in T::REQUIRED_COLUMNS {
            if !columns.contains(required) {
                return Err(MknError::MissingColumn {
                    column: required.to_string(),
                });
            }
        }

        Ok(columns)
    }

    /// Returns the number of non-empty records read so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Returns the number of records rejected by `passes_filter`.
    pub fn records_filtered(&self) -> usize {
        self.records_filtered
    }

    /// Returns the parser configuration.
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }
}

impl<R: Read, T: TabularRecord> Iterator for TabularParser<R, T> {
    type Item = MknResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    // Skip empty records
                    if record.is_empty() || record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    self.records_read += 1;

                    match T::from_record(&record, &self.columns) {
                        Ok(parsed) => {
                            if parsed.passes_filter(&self.config) {
                                return Some(Ok(parsed));
                            }
                            self.records_filtered += 1;
                            continue;
                        }
                        Err(e) => return Some(Err(e)),
                    }
                }
                Ok(false) => return None, // End of input
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Pair {
        key: String,
        value: String,
    }

    impl TabularRecord for Pair {
        const REQUIRED_COLUMNS: &'static [&'static str] = &["key"];

        fn from_record(record: &StringRecord, columns: &ColumnMap) -> MknResult<Self> {
            Ok(Pair {
                key: columns.get(record, "key").to_string(),
                value: columns.get(record, "value").to_string(),
            })
        }

        fn passes_filter(&self, _config: &ParseConfig) -> bool {
            self.key != "skip"
        }
    }

    #[test]
    fn test_column_map_handles_bom_and_order() {
        let headers = StringRecord::from(vec!["\u{feff}value", "key"]);
        let columns = ColumnMap::from_headers(&headers);
        let record = StringRecord::from(vec![" v1 ", "k1"]);

        assert!(columns.contains("value"));
        assert_eq!(columns.get(&record, "key"), "k1");
        assert_eq!(columns.get(&record, "value"), "v1");
        assert_eq!(columns.get(&record, "missing"), "");
    }

    #[test]
    fn test_parser_reads_and_filters() {
        let content = "key,value\na,1\nskip,2\n,\nb,3\n";
        let mut parser =
            TabularParser::<_, Pair>::from_content(content, ParseConfig::default()).unwrap();

        let rows: Vec<Pair> = parser.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "a");
        assert_eq!(rows[1].value, "3");
        assert_eq!(parser.records_read(), 3);
        assert_eq!(parser.records_filtered(), 1);
    }

    #[test]
    fn test_parser_missing_required_column() {
        let result = TabularParser::<_, Pair>::from_content("value\n1\n", ParseConfig::default());
        match result {
            Err(MknError::MissingColumn { column }) => assert_eq!(column, "key"),
            other => panic!("expected MissingColumn, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parser_short_rows_are_tolerated() {
        let content = "key,value\nonly_key\n";
        let rows: Vec<Pair> = TabularParser::<_, Pair>::from_content(content, ParseConfig::default())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "");
    }

    #[test]
    fn test_parser_custom_delimiter() {
        let config = ParseConfig {
            delimiter: b';',
            ..Default::default()
        };
        let rows: Vec<Pair> = TabularParser::<_, Pair>::from_content("key;value\nx;y\n", config)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(rows[0].key, "x");
        assert_eq!(rows[0].value, "y");
    }
}
