use crate::ingest::error::IngestError;
use log::{debug, info};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `df` as delimited text with a header row, all or nothing.
///
/// The table is written to a temporary file next to `path` and only moved into place once
/// complete, so a failure never leaves a truncated file at `path`. Missing parent
/// directories are created.
pub fn write_csv_atomic(
    df: &mut DataFrame,
    path: &Path,
    separator: u8,
) -> Result<(), IngestError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .map_err(|e| IngestError::OutputDirCreation(parent.to_path_buf(), e))?;

    let mut staging =
        NamedTempFile::new_in(parent).map_err(|e| IngestError::CsvWriteIo(path.to_path_buf(), e))?;
    CsvWriter::new(staging.as_file_mut())
        .include_header(true)
        .with_separator(separator)
        .finish(df)
        .map_err(|e| IngestError::CsvWritePolars(path.to_path_buf(), e))?;
    staging
        .as_file()
        .sync_all()
        .map_err(|e| IngestError::CsvWriteIo(path.to_path_buf(), e))?;
    staging
        .persist(path)
        .map_err(|e| IngestError::Persist(path.to_path_buf(), e))?;

    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Removes the plain files directly inside `dir`, except `keep`. Subdirectories are left
/// alone and a missing directory is not an error.
pub fn clear_directory(dir: &Path, keep: Option<&Path>) -> Result<usize, IngestError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(IngestError::OutputDirClear(dir.to_path_buf(), e)),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::OutputDirClear(dir.to_path_buf(), e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| IngestError::OutputDirClear(dir.to_path_buf(), e))?;
        if file_type.is_file() && keep != Some(entry.path().as_path()) {
            std::fs::remove_file(entry.path())
                .map_err(|e| IngestError::OutputDirClear(dir.to_path_buf(), e))?;
            removed += 1;
        }
    }
    debug!("Removed {} files from {}", removed, dir.display());
    Ok(removed)
}

/// Renames the columns listed in `labels` to their presentation label.
/// Labels for columns the table does not have are ignored.
pub fn apply_labels(
    df: &mut DataFrame,
    labels: &BTreeMap<String, String>,
) -> Result<(), IngestError> {
    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    for name in present {
        if let Some(label) = labels.get(&name) {
            df.rename(&name, label.as_str().into())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_directories() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cleaned").join("data.csv");
        let mut df = df!(
            "Commune" => ["BASTIA", "CORTE"],
            "PRELIQ" => [1.5, 0.0],
        )?;

        write_csv_atomic(&mut df, &path, b';')?;

        let written = std::fs::read_to_string(&path)?;
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("Commune;PRELIQ"));
        assert_eq!(lines.next(), Some("BASTIA;1.5"));
        assert_eq!(lines.count(), 1);
        // Only the final file remains
        assert_eq!(std::fs::read_dir(path.parent().unwrap())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_clear_keeps_subdirectories() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("old.csv"), "a\n1\n")?;
        std::fs::write(dir.path().join("notes.txt"), "x")?;
        std::fs::create_dir(dir.path().join("archive"))?;

        assert_eq!(clear_directory(dir.path(), None)?, 2);
        let remaining: Vec<_> = std::fs::read_dir(dir.path())?
            .map(|e| e.map(|e| e.file_name()))
            .collect::<Result<_, _>>()?;
        assert_eq!(remaining, vec![std::ffi::OsString::from("archive")]);
        Ok(())
    }

    #[test]
    fn test_clear_missing_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        assert_eq!(clear_directory(&dir.path().join("absent"), None)?, 0);
        Ok(())
    }

    #[test]
    fn test_clear_spares_kept_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("data.csv");
        std::fs::write(&output, "a\n1\n")?;
        std::fs::write(dir.path().join("stale.csv"), "b\n2\n")?;

        assert_eq!(clear_directory(dir.path(), Some(&output))?, 1);
        assert!(output.exists());
        assert!(!dir.path().join("stale.csv").exists());
        Ok(())
    }

    #[test]
    fn test_labels_ignore_absent_columns() -> Result<(), Box<dyn std::error::Error>> {
        let mut df = df!("PRENEI" => [0.0], "lat" => [42.6])?;
        let labels = BTreeMap::from([
            ("PRENEI".to_string(), "Snowfall".to_string()),
            ("PRELIQ".to_string(), "Rainfall".to_string()),
        ]);

        apply_labels(&mut df, &labels)?;

        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["Snowfall".to_string(), "lat".to_string()]);
        Ok(())
    }
}
