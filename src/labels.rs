//! Well labels
//!
//! A label is a run of row letters followed by a 1-based column number:
//! `A1`, `C12`, `AA3`. Rows use bijective base-26 letters (A..Z, AA..AZ,
//! BA.., ZZ, AAA..) in both directions, so every row index has exactly one
//! label and every label parses back to the row it came from.

use crate::errors::WellPathError;
use crate::types::{GridIndex, GridSize};
use regex::Regex;

lazy_static::lazy_static! {
    static ref LABEL_PATTERN: Regex =
        Regex::new(r"^([A-Z]+)([0-9]+)$").expect("well label pattern is valid");
}

/// Row letters for a 0-based row index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn row_letters(row: usize) -> String {
    let mut letters = Vec::new();
    let mut n = row + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    // Only ASCII uppercase bytes were pushed.
    letters.into_iter().map(char::from).collect()
}

/// Decode a run of row letters back to a 0-based row index.
///
/// Returns `None` for empty input, non `A-Z` characters, or overflow.
pub fn parse_row_letters(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut value: usize = 0;
    for b in letters.bytes() {
        if !b.is_ascii_uppercase() {
            return None;
        }
        let digit = (b - b'A') as usize + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    Some(value - 1)
}

/// Label for a 0-based `(row, col)`.
pub fn label_for(row: usize, col: usize) -> String {
    format!("{}{}", row_letters(row), col + 1)
}

/// Labels for every well of a `width` × `depth` grid, row-major.
///
/// `labels[row * width + col] == label_for(row, col)`, matching the order of
/// [`crate::interpolate::generate_grid`].
pub fn generate_labels(width: usize, depth: usize) -> Result<Vec<String>, WellPathError> {
    let grid = GridSize::new(width, depth)?;
    Ok(labels_for_grid(grid))
}

pub(crate) fn labels_for_grid(grid: GridSize) -> Vec<String> {
    let mut labels = Vec::with_capacity(grid.well_count());
    for row in 0..grid.depth() {
        let letters = row_letters(row);
        for col in 0..grid.width() {
            labels.push(format!("{}{}", letters, col + 1));
        }
    }
    labels
}

/// Split a well-formed label into its row-letter and column-number parts.
pub fn split_label(label: &str) -> Option<(&str, &str)> {
    let caps = LABEL_PATTERN.captures(label)?;
    let letters = caps.get(1)?.as_str();
    let digits = caps.get(2)?.as_str();
    Some((letters, digits))
}

/// Recover `(row, col)` from a label, both 0-based.
///
/// Accepts only `^[A-Z]+[0-9]+$`. Column `0` (e.g. `A0`) is rejected since it
/// has no 0-based counterpart.
pub fn parse_label(label: &str) -> Option<(usize, usize)> {
    let (letters, digits) = split_label(label)?;
    let row = parse_row_letters(letters)?;
    let col_number: usize = digits.parse().ok()?;
    let col = col_number.checked_sub(1)?;
    Some((row, col))
}

/// Like [`parse_label`], but a malformed label is an error naming `field`.
pub fn parse_label_strict(label: &str, field: &str) -> Result<GridIndex, WellPathError> {
    parse_label(label)
        .map(|(row, col)| GridIndex::new(row, col))
        .ok_or_else(|| {
            WellPathError::validation(
                field,
                format!(
                    "malformed well label `{}` (expected row letters then a column number, e.g. `B7`)",
                    label
                ),
            )
        })
}
