//! Conversions between spreadsheet-style addresses (`"B3:A2"`, `"A:C"`, `"3:7"`) and
//! coordinates.
//!
//! Columns are written in bijective base-26: there is no zero letter, so `A` is 1, `Z` is
//! 26 and `AA` is 27.

use crate::error::{ErrorContext, XlError, XlErrorKind, XlResult};

use super::{AddressMatrix, Coord, MAX_COLUMNS, MAX_ROWS};

const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Renders a 1-based column index as letters: 1 is `A`, 27 is `AA`.
pub fn column_to_letters(column: u32) -> XlResult<String> {
    if column < 1 {
        return Err(XlErrorKind::InvalidCoordinate(format!(
            "column index should be at least 1, got {column}"
        ))
        .into());
    }

    let mut letters = Vec::new();
    let mut remaining = column;
    while remaining > 0 {
        letters.push(ALPHABET[((remaining - 1) % 26) as usize]);
        remaining = (remaining - 1) / 26;
    }
    Ok(letters.into_iter().rev().collect())
}

/// Parses column letters (case insensitive) into a 1-based column index.
pub fn letters_to_column(letters: &str) -> XlResult<u32> {
    use XlErrorKind::InvalidAddress;

    if letters.is_empty() {
        return Err(InvalidAddress(
            "a column should have at least one letter, got none".to_string(),
        )
        .into());
    }

    letters.chars().try_fold(0u32, |acc, chr| {
        let upper = chr.to_ascii_uppercase();
        let pos_in_alphabet = ALPHABET
            .iter()
            .position(|letter| *letter == upper)
            .ok_or_else(|| {
                XlError::from(InvalidAddress(format!(
                    "char is not a valid column letter: {chr}"
                )))
            })?;

        acc.checked_mul(26)
            .and_then(|shifted| shifted.checked_add(pos_in_alphabet as u32 + 1))
            .ok_or_else(|| InvalidAddress(format!("column \"{letters}\" is too large")).into())
    })
}

/// Encodes one or two coordinates into an address string.
///
/// Absent components are left out, so a pair of column-only coordinates encodes to `"A:C"`
/// and a pair of row-only coordinates to `"3:7"`.
pub fn encode(coords: &[Coord]) -> XlResult<String> {
    if coords.is_empty() || coords.len() > 2 {
        return Err(XlErrorKind::InvalidCoordinate(format!(
            "expected 1 or 2 coordinates, got {}",
            coords.len()
        ))
        .into());
    }

    coords
        .iter()
        .map(encode_unit)
        .collect::<XlResult<Vec<_>>>()
        .map(|units| units.join(":"))
}

fn encode_unit(coord: &Coord) -> XlResult<String> {
    use XlErrorKind::InvalidCoordinate;

    let mut unit = String::new();
    if let Some(column) = coord.column {
        if column > MAX_COLUMNS {
            return Err(InvalidCoordinate(format!(
                "column {column} is beyond the sheet limit of {MAX_COLUMNS}"
            ))
            .into());
        }
        unit.push_str(&column_to_letters(column)?);
    }
    if let Some(row) = coord.row {
        if !(1..=MAX_ROWS).contains(&row) {
            return Err(
                InvalidCoordinate(format!("row should be in [1, {MAX_ROWS}], got {row}")).into(),
            );
        }
        unit.push_str(&row.to_string());
    }

    if unit.is_empty() {
        return Err(InvalidCoordinate("a coordinate needs a row or a column".to_string()).into());
    }
    Ok(unit)
}

/// Decodes an address string into a coordinate matrix.
///
/// `$` markers are ignored. The result is not normalized: `"B3:A2"` decodes to the span
/// `(3, 2) -> (2, 1)`.
pub fn decode(address: &str) -> XlResult<AddressMatrix> {
    let cleaned: String = address.trim().chars().filter(|chr| *chr != '$').collect();
    let units = cleaned.split(':').collect::<Vec<_>>();

    let matrix = match units.as_slice() {
        [unit] => decode_unit(unit).map(AddressMatrix::Point),
        [first, last] => Ok(AddressMatrix::Span(decode_unit(first)?, decode_unit(last)?)),
        _ => Err(XlErrorKind::InvalidAddress(format!(
            "expected at most 2 units, got {n_units}",
            n_units = units.len()
        ))
        .into()),
    };
    matrix.with_context(|| format!("could not decode address \"{address}\""))
}

fn decode_unit(unit: &str) -> XlResult<Coord> {
    use XlErrorKind::InvalidAddress;

    let split_at = unit
        .find(|chr: char| !chr.is_ascii_alphabetic())
        .unwrap_or(unit.len());
    let (letters, digits) = unit.split_at(split_at);

    if letters.is_empty() && digits.is_empty() {
        return Err(InvalidAddress("empty address unit".to_string()).into());
    }
    if !digits.chars().all(|chr| chr.is_ascii_digit()) {
        return Err(InvalidAddress(format!("malformed token \"{unit}\"")).into());
    }

    let column = if letters.is_empty() {
        None
    } else {
        let column = letters_to_column(letters)?;
        if column > MAX_COLUMNS {
            return Err(InvalidAddress(format!(
                "column \"{letters}\" is beyond the sheet limit of {MAX_COLUMNS}"
            ))
            .into());
        }
        Some(column)
    };

    let row = if digits.is_empty() {
        None
    } else {
        let row = digits
            .parse::<u32>()
            .map_err(|err| XlError::from(InvalidAddress(format!("row \"{digits}\": {err}"))))?;
        if !(1..=MAX_ROWS).contains(&row) {
            return Err(InvalidAddress(format!("row should be in [1, {MAX_ROWS}], got {row}")).into());
        }
        Some(row)
    };

    Ok(Coord { row, column })
}
