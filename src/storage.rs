use crate::dataset::Table;
use crate::error::Result;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save a table as CSV: index columns, then the value column.
///
/// Suppressed values are written as empty cells.
pub fn save_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    let mut header = table.index().names();
    header.push(table.value_column().to_string());
    wtr.write_record(&header)?;
    for (labels, value) in table.rows() {
        let mut record = labels;
        record.push(value.map(|v| v.to_string()).unwrap_or_default());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a table as a pretty JSON array of row objects.
pub fn save_json<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&table.records())?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
