use crate::cleaning::error::TransformError;
use crate::cleaning::frame::string_values;
use deunicode::deunicode;
use polars::prelude::*;

const ELISION_PREFIX: &str = "L'";

/// Normalises a municipality name for joining: uppercase, diacritics stripped and any leading
/// `L'` article removed.
///
/// Typographic apostrophes are folded to `'` before the article is looked for. The function
/// is idempotent.
///
/// # Examples
///
/// ```
/// use raindust::normalize_municipality_name;
///
/// assert_eq!(normalize_municipality_name("L'Île-Rousse"), "ILE-ROUSSE");
/// assert_eq!(normalize_municipality_name("Saint-Étienne"), "SAINT-ETIENNE");
/// ```
pub fn normalize_municipality_name(name: &str) -> String {
    // Uppercase first so that letters like 'ß' expand before transliteration
    let mut normalized = deunicode(&name.to_uppercase()).to_uppercase();
    loop {
        let trimmed = normalized.trim();
        let stripped = trimmed.strip_prefix(ELISION_PREFIX).unwrap_or(trimmed);
        if stripped.len() == normalized.len() {
            return normalized;
        }
        normalized = stripped.to_string();
    }
}

/// Replaces the text of `column` by its normalised form. Nulls stay null.
pub fn normalize_name_column(df: &DataFrame, column: &str) -> Result<DataFrame, TransformError> {
    let names: Vec<Option<String>> = string_values(df, column)?
        .into_iter()
        .map(|name| name.map(normalize_municipality_name))
        .collect();
    let mut df = df.clone();
    df.with_column(Series::new(column.into(), names))?;
    Ok(df)
}
