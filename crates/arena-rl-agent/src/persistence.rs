//! Line-oriented text persistence for the Q-table and exploration rate
//!
//! The first line holds epsilon, followed by one cell per line in storage
//! order (x, y, bearing, distance, action).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use arena_rl_core::{ArenaError, Result, TableShape};

use crate::q_table::QTable;

/// Table and exploration rate as read back from disk
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    /// Q-values
    pub table: QTable,
    /// Exploration rate at save time
    pub epsilon: f64,
}

/// Round half away from zero to `decimals` places.
///
/// Ties are decided on the exact stored value, not on the rounded product
/// `value * 10^decimals`: `2.675` is stored just below the tie and becomes
/// `2.67`, while an exactly representable `0.125` becomes `0.13`.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let magnitude = value.abs();
    let scaled = magnitude * factor;
    if !scaled.is_finite() || scaled >= MAX_EXACT_SCALED {
        return value;
    }

    // scaled + residual is the exact product
    let residual = magnitude.mul_add(factor, -scaled);
    let whole = scaled.floor();
    let excess = scaled - whole - 0.5;
    let rounded = if excess > 0.0 || (excess == 0.0 && residual >= 0.0) {
        whole + 1.0
    } else {
        whole
    };
    (rounded / factor).copysign(value)
}

/// Products at or above this have no fractional part left to round
const MAX_EXACT_SCALED: f64 = 4_503_599_627_370_496.0;

/// Render the table and epsilon in the save file format
#[must_use]
pub fn serialize(table: &QTable, epsilon: f64, decimals: u32) -> String {
    let precision = decimals as usize;
    let mut out = String::with_capacity(table.len() * (precision + 4) + 24);
    let _ = writeln!(out, "{epsilon}");
    for &cell in table.cells() {
        let _ = writeln!(out, "{:.*}", precision, round_to(cell, decimals));
    }
    out
}

/// Parse the save file format for a table of the given shape.
///
/// Exactly `shape.cell_count()` values must follow the epsilon line; blank
/// trailing lines are ignored.
pub fn deserialize(text: &str, shape: TableShape) -> Result<PersistedState> {
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line.trim()));

    let epsilon = match lines.next() {
        Some((line, token)) => parse_value(line, token)?,
        None => return Err(ArenaError::malformed(1, "missing exploration rate")),
    };
    if !(0.0..=1.0).contains(&epsilon) {
        return Err(ArenaError::malformed(
            1,
            format!("exploration rate {epsilon} outside [0, 1]"),
        ));
    }

    let expected = shape.cell_count();
    let mut cells = Vec::with_capacity(expected);
    for _ in 0..expected {
        match lines.next() {
            Some((line, token)) => cells.push(parse_value(line, token)?),
            None => {
                return Err(ArenaError::malformed(
                    cells.len() + 2,
                    format!("expected {expected} values, found {}", cells.len()),
                ))
            }
        }
    }

    if let Some((line, _)) = lines.find(|(_, token)| !token.is_empty()) {
        return Err(ArenaError::malformed(
            line,
            format!("unexpected data after {expected} values"),
        ));
    }

    let table = QTable::from_cells(shape, cells)
        .ok_or_else(|| ArenaError::malformed(expected + 1, "cell count mismatch"))?;
    Ok(PersistedState { table, epsilon })
}

fn parse_value(line: usize, token: &str) -> Result<f64> {
    let value: f64 = token
        .parse()
        .map_err(|_| ArenaError::malformed(line, format!("not a number: {token:?}")))?;
    if !value.is_finite() {
        return Err(ArenaError::malformed(line, format!("non-finite value: {token:?}")));
    }
    Ok(value)
}

/// Write the save file, replacing any previous one only once fully written
pub async fn save(path: &Path, table: &QTable, epsilon: f64, decimals: u32) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    let written = match tokio::fs::write(&tmp, serialize(table, epsilon, decimals)).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    tracing::info!(path = %path.display(), epsilon, cells = table.len(), "saved Q-table");
    Ok(())
}

/// Read the save file. A missing file is `Ok(None)`.
pub async fn load(path: &Path, shape: TableShape) -> Result<Option<PersistedState>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no saved Q-table, starting fresh");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let text = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
        ArenaError::malformed(line, "not valid UTF-8")
    })?;

    let state = deserialize(&text, shape)?;
    tracing::info!(path = %path.display(), epsilon = state.epsilon, "loaded Q-table");
    Ok(Some(state))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_shape() -> TableShape {
        TableShape {
            x_buckets: 2,
            y_buckets: 1,
            bearing_buckets: 1,
            distance_buckets: 1,
            actions: 2,
        }
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(1.005_000_1, 2), 1.01);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(0.123, 2), 0.12);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-0.125, 2), -0.13);
    }

    #[test]
    fn test_round_uses_stored_value_near_ties() {
        // each literal is stored slightly below the written tie
        assert_eq!(round_to(1.115, 2), 1.11);
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(8.345, 2), 8.34);
        assert_eq!(round_to(-8.345, 2), -8.34);
        assert_eq!(round_to(1.005, 2), 1.0);
        assert_eq!(round_to(0.285, 2), 0.28);
        assert_eq!(round_to(1.0e300, 2), 1.0e300);
    }

    #[test]
    fn test_serialize_layout() {
        let shape = tiny_shape();
        let table = QTable::from_cells(shape, vec![1.0, -2.346, 0.004, 99.99]).unwrap();
        let text = serialize(&table, 0.5, 2);
        assert_eq!(text, "0.5\n1.00\n-2.35\n0.00\n99.99\n");
    }

    #[test]
    fn test_deserialize_roundtrip() {
        let shape = tiny_shape();
        let table = QTable::from_cells(shape, vec![1.234, -7.0, 0.0, 55.556]).unwrap();
        let loaded = deserialize(&serialize(&table, 0.99999, 2), shape).unwrap();

        assert_eq!(loaded.epsilon, 0.99999);
        assert_eq!(loaded.table.cells(), &[1.23, -7.0, 0.0, 55.56]);
    }

    #[test]
    fn test_deserialize_rejects_short_input() {
        let err = deserialize("0.5\n1.0\n2.0\n", tiny_shape()).unwrap_err();
        assert!(matches!(err, ArenaError::MalformedPersistedState { line: 4, .. }));

        let err = deserialize("", tiny_shape()).unwrap_err();
        assert!(matches!(err, ArenaError::MalformedPersistedState { line: 1, .. }));
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let err = deserialize("0.5\n1.0\nabc\n2.0\n3.0\n", tiny_shape()).unwrap_err();
        assert!(matches!(err, ArenaError::MalformedPersistedState { line: 3, .. }));

        assert!(deserialize("0.5\n1.0\nNaN\n2.0\n3.0\n", tiny_shape()).is_err());
        assert!(deserialize("1.5\n1.0\n1.0\n2.0\n3.0\n", tiny_shape()).is_err());
        assert!(deserialize("0.5\n1.0\n1.0\n2.0\n3.0\n4.0\n", tiny_shape()).is_err());
    }

    #[test]
    fn test_deserialize_tolerates_trailing_blank_lines() {
        let loaded = deserialize("0.5\n1\n2\n3\n4\n\n\n", tiny_shape()).unwrap();
        assert_eq!(loaded.table.cells(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("q_values.data");
        let shape = tiny_shape();
        let table = QTable::from_cells(shape, vec![0.5, 0.25, -1.0, 3.0]).unwrap();

        save(&path, &table, 0.42, 2).await.unwrap();
        assert!(!temp_path(&path).exists());

        let loaded = load(&path, shape).await.unwrap().unwrap();
        assert_eq!(loaded.epsilon, 0.42);
        assert_eq!(loaded.table, table);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load(&dir.path().join("absent.data"), tiny_shape()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q_values.data");
        tokio::fs::write(&path, "0.5\n1.0\n").await.unwrap();

        let err = load(&path, tiny_shape()).await.unwrap_err();
        assert!(matches!(err, ArenaError::MalformedPersistedState { .. }));
    }

    #[tokio::test]
    async fn test_load_non_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q_values.data");
        tokio::fs::write(&path, b"0.5\n\xff\xfe\n").await.unwrap();

        let err = load(&path, tiny_shape()).await.unwrap_err();
        assert!(matches!(err, ArenaError::MalformedPersistedState { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q_values.data");
        // a non-empty directory in the target's place makes the rename fail
        tokio::fs::create_dir(&path).await.unwrap();
        tokio::fs::write(path.join("keep"), "x").await.unwrap();
        let table = QTable::new(tiny_shape());

        assert!(save(&path, &table, 0.5, 2).await.is_err());
        assert!(!temp_path(&path).exists());
        assert!(path.join("keep").exists());
    }
}
