//! Random gene set results: comma-separated `size,AUSR` rows

use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};

use super::tsv::{line_of, parse_error};
use crate::error::{MorphError, Result};
use crate::significance::NullDistribution;

/// Read random gene set results.
///
/// Columns are found by their header names, `size` and `AUSR` (any case);
/// other columns, such as a leading row index, are ignored.
pub fn read_null_distribution<P: AsRef<Path>>(path: P) -> Result<NullDistribution> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (size_col, ausr_col) = match (column("size"), column("ausr")) {
        (Some(s), Some(a)) => (s, a),
        _ => return Err(parse_error(path, 1, "expected 'size' and 'AUSR' columns")),
    };

    let mut null = NullDistribution::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        let size_field = record.get(size_col).unwrap_or_default();
        let ausr_field = record.get(ausr_col).unwrap_or_default();

        // Sizes may have been written as floats
        let size = size_field
            .parse::<usize>()
            .ok()
            .or_else(|| {
                size_field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0 && *v >= 0.0)
                    .map(|v| v as usize)
            })
            .ok_or_else(|| parse_error(path, line, format!("invalid gene set size: {}", size_field)))?;
        let ausr = ausr_field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| parse_error(path, line, format!("invalid AUSR: {}", ausr_field)))?;
        null.push(size, ausr);
    }

    if null.is_empty() {
        return Err(MorphError::InvalidConfig {
            reason: format!("{}: no random gene set results", path.display()),
        });
    }
    Ok(null)
}

/// Write random gene set results with a `size,AUSR` header
pub fn write_null_distribution<P: AsRef<Path>>(path: P, null: &NullDistribution) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["size", "AUSR"])?;
    for (size, ausr) in null.iter() {
        writer.write_record([size.to_string(), ausr.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
