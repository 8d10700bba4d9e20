//! CSV export of report rows. Each row type derives `Serialize`; its field
//! names become the header.

use serde::Serialize;
use std::{fs::File, io::Write, path::Path};

use crate::error::{Error, Result};

pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_csv_file<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    write_csv(file, rows)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(())
}
