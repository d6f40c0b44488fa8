use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

const HEADER_PREFIX: &str = "#";

#[derive(Debug, Error)]
pub enum TableIoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid metadata '{key}': {value}")]
    InvalidMetadata { key: &'static str, value: String },
}

/// Defines the interface for reading and writing tabular result files.
///
/// Tables are CSV with an optional block of `# key=value` metadata lines at the top.
pub trait TabularFile: Sized {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a table from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Self, Self::Error>;

    /// Writes the table to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or I/O operations encounter issues.
    fn write_to(&self, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a table from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes the table to a file path, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Splits the leading `# key=value` lines off a table and returns them with the CSV body.
pub(crate) fn split_header(
    reader: &mut impl BufRead,
) -> io::Result<(BTreeMap<String, String>, String)> {
    let mut metadata = BTreeMap::new();
    let mut body = String::new();
    let mut in_header = true;
    for line in reader.lines() {
        let line = line?;
        if in_header {
            if let Some(entry) = line.strip_prefix(HEADER_PREFIX) {
                if let Some((key, value)) = entry.split_once('=') {
                    metadata.insert(key.trim().to_string(), value.trim().to_string());
                }
                continue;
            }
            in_header = false;
        }
        body.push_str(&line);
        body.push('\n');
    }
    Ok((metadata, body))
}

pub(crate) fn write_header(writer: &mut impl Write, entries: &[(&str, String)]) -> io::Result<()> {
    for (key, value) in entries {
        writeln!(writer, "{HEADER_PREFIX} {key}={value}")?;
    }
    Ok(())
}

pub(crate) fn join_list(items: &[String]) -> String {
    items.join(",")
}

pub(crate) fn parse_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn split_header_separates_metadata_from_body() {
        let text = "# species=electron,hole\n# bin-size = 0.5\ntime,msd\n1,2\n";
        let (metadata, body) = split_header(&mut Cursor::new(text)).unwrap();
        assert_eq!(metadata["species"], "electron,hole");
        assert_eq!(metadata["bin-size"], "0.5");
        assert_eq!(body, "time,msd\n1,2\n");
        assert_eq!(
            parse_list(metadata.get("species")),
            vec!["electron".to_string(), "hole".to_string()]
        );
    }

    #[test]
    fn parse_list_of_missing_or_empty_value_is_empty() {
        assert!(parse_list(None).is_empty());
        assert!(parse_list(Some(&String::new())).is_empty());
    }
}
