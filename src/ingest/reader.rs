use crate::ingest::error::IngestError;
use flate2::read::GzDecoder;
use log::debug;
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Reads a delimited text file with a header row into a `DataFrame` of text columns.
///
/// Gzip-compressed files are recognised by their magic bytes and decompressed in memory,
/// whatever their extension. Empty fields are read as nulls. No type is inferred: the
/// cleaners convert the columns they use, so a late value never fails the whole read.
pub fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame, IngestError> {
    let raw = std::fs::read(path).map_err(|e| IngestError::FileRead(path.to_path_buf(), e))?;
    let bytes = if raw.starts_with(&GZIP_MAGIC) {
        let mut decompressed = Vec::with_capacity(raw.len() * 4);
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decompressed)
            .map_err(|e| IngestError::Gzip(path.to_path_buf(), e))?;
        debug!(
            "Decompressed {} ({} -> {} bytes)",
            path.display(),
            raw.len(),
            decompressed.len()
        );
        decompressed
    } else {
        raw
    };

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| options.with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| IngestError::CsvParse(path.to_path_buf(), e))
}
