//! Line-oriented text files: key/value tables, word lists and number columns

use crate::io::configuration::TSV_SEPARATOR;
use crate::io::error::{Result, ToolError, WithPath};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn lines(path: &Path) -> Result<impl Iterator<Item = (usize, std::io::Result<String>)>> {
    let file = File::open(path).with_path(path, "open")?;
    Ok(BufReader::new(file)
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line)))
}

fn malformed(path: &Path, line: usize, reason: String) -> ToolError {
    ToolError::MalformedLine {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

/// Read `key<separator>value` lines into a map
///
/// Later duplicates overwrite earlier keys.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line does not contain
/// exactly one separator
pub fn read_dict_from_tsv(path: &Path, separator: char) -> Result<HashMap<String, String>> {
    let mut table = HashMap::new();
    for (number, line) in lines(path)? {
        let line = line.with_path(path, "read")?;
        let mut fields = line.trim().split(separator);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(key), Some(value), None) => {
                table.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(malformed(
                    path,
                    number,
                    format!("expected exactly one {separator:?} separator"),
                ));
            }
        }
    }
    Ok(table)
}

/// Read every line, trimmed of surrounding whitespace
///
/// # Errors
///
/// Returns an error if the file cannot be read
pub fn read_list_from_file(path: &Path) -> Result<Vec<String>> {
    lines(path)?
        .map(|(_, line)| line.with_path(path, "read").map(|line| line.trim().to_string()))
        .collect()
}

/// Read every trimmed line split on `separator`
///
/// # Errors
///
/// Returns an error if the file cannot be read
pub fn read_list_of_lists_from_tsv(path: &Path, separator: char) -> Result<Vec<Vec<String>>> {
    lines(path)?
        .map(|(_, line)| {
            line.with_path(path, "read").map(|line| {
                line.trim()
                    .split(separator)
                    .map(str::to_string)
                    .collect()
            })
        })
        .collect()
}

/// Read one number per line, skipping blank lines
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not a number
pub fn read_numbers(path: &Path) -> Result<Vec<f64>> {
    let mut numbers = Vec::new();
    for (number, line) in lines(path)? {
        let line = line.with_path(path, "read")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = trimmed
            .parse::<f64>()
            .map_err(|error| malformed(path, number, format!("'{trimmed}': {error}")))?;
        numbers.push(value);
    }
    Ok(numbers)
}

/// Create the parent directories of `path` if needed and open it for writing
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created
pub fn create_dirs_and_open(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }
    let file = File::create(path).with_path(path, "create")?;
    Ok(BufWriter::new(file))
}

/// Write rows of fields joined by tabs, one row per line, creating parent
/// directories as needed
///
/// # Errors
///
/// Returns an error if the file cannot be created or written
pub fn write_rows<I, R, F>(path: &Path, rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: ToString,
{
    let mut writer = create_dirs_and_open(path)?;
    let separator = TSV_SEPARATOR.to_string();
    for row in rows {
        let fields: Vec<String> = row.into_iter().map(|field| field.to_string()).collect();
        writeln!(writer, "{}", fields.join(&separator)).with_path(path, "write")?;
    }
    writer.flush().with_path(path, "write")
}
