use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::types::ValuationSample;

const HEADER: [&str; 2] = ["date", "price"];

/// Writes one `<SYMBOL>.csv` per tracked address, newest sample first.
pub struct CsvExporter {
    out_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.out_dir.join(format!("{symbol}.csv"))
    }

    /// Overwrites any previous file for `symbol`. The header is written even
    /// for an empty series.
    pub fn export(&self, symbol: &str, series: &[ValuationSample]) -> crate::Result<PathBuf> {
        let path = self.path_for(symbol);
        let fail = |reason: String| crate::Error::ExportFailed {
            path: path.clone(),
            reason,
        };

        if symbol.is_empty() || symbol.contains(['/', '\\']) || symbol.starts_with('.') {
            return Err(fail(format!("'{symbol}' is not usable as a file name")));
        }

        fs::create_dir_all(&self.out_dir).map_err(|e| fail(e.to_string()))?;
        let file = fs::File::create(&path).map_err(|e| fail(e.to_string()))?;
        write_series(file, series).map_err(|e| fail(e.to_string()))?;

        Ok(path)
    }
}

/// `date,price` rows, newest sample first.
pub fn write_series<W: Write>(out: W, series: &[ValuationSample]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    writer.write_record(HEADER)?;
    for sample in series.iter().rev() {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}
