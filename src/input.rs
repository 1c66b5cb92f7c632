//! ASIN input file parsing and normalization.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::models::Asin;

/// Read candidate tokens from a CSV file.
///
/// A header row naming an `asin` column (case-insensitive) restricts
/// parsing to that column. Without one, every cell of every row is a
/// candidate token, which covers the historical unheaded layout.
pub fn read_tokens(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("input file read error: {}", path.display()))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("input file read error: {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let asin_column = rows.first().and_then(|header| {
        header
            .iter()
            .position(|cell| cell.trim().eq_ignore_ascii_case("asin"))
    });

    let tokens = match asin_column {
        Some(column) => rows
            .into_iter()
            .skip(1)
            .filter_map(|mut row| (column < row.len()).then(|| row.swap_remove(column)))
            .collect(),
        None => rows.into_iter().flatten().collect(),
    };

    Ok(tokens)
}

/// Validate and deduplicate raw tokens into well-formed ASINs.
///
/// Blank tokens are discarded silently; malformed tokens are reported and
/// dropped without aborting the batch. First-occurrence order is kept.
pub fn normalize(tokens: &[String]) -> Vec<Asin> {
    let mut seen = HashSet::new();
    let mut asins = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match Asin::parse(token) {
            Some(asin) => {
                if seen.insert(asin.clone()) {
                    asins.push(asin);
                }
            }
            None => warn!("not a valid ASIN: {token}"),
        }
    }

    asins
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn normalize_drops_invalid_and_blank() {
        let tokens = strings(&["B000TESTAB", "short", "  ", "VALID12345"]);
        let asins = normalize(&tokens);
        let keys: Vec<&str> = asins.iter().map(Asin::as_str).collect();
        assert_eq!(keys, ["B000TESTAB", "VALID12345"]);
    }

    #[test]
    fn normalize_dedups_preserving_first_occurrence_order() {
        let tokens = strings(&["B000TESTAB", "VALID12345", "B000TESTAB"]);
        let asins = normalize(&tokens);
        let keys: Vec<&str> = asins.iter().map(Asin::as_str).collect();
        assert_eq!(keys, ["B000TESTAB", "VALID12345"]);
    }

    #[test]
    fn read_tokens_uses_named_asin_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("asins.csv");
        fs::write(&path, "note,ASIN\nfirst,B000TESTAB\nsecond,VALID12345\n").unwrap();

        let tokens = read_tokens(&path).unwrap();
        assert_eq!(tokens, ["B000TESTAB", "VALID12345"]);
    }

    #[test]
    fn read_tokens_flattens_unheaded_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("asins.csv");
        fs::write(&path, "B000TESTAB\nVALID12345,EXTRA00000\n").unwrap();

        let tokens = read_tokens(&path).unwrap();
        assert_eq!(tokens, ["B000TESTAB", "VALID12345", "EXTRA00000"]);
    }

    #[test]
    fn read_tokens_reports_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(read_tokens(&path).is_err());
    }
}
