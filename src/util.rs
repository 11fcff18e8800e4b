use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Opens a file for buffered reading, naming its `kind` in any error.
pub fn open(path: &Path, kind: &str) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Opening {} file `{}`", kind, path.display()))?;
    Ok(BufReader::new(file))
}
