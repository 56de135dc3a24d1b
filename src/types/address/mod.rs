pub mod codec;

use std::{fmt::Display, str::FromStr};

use crate::error::{ErrorContext, XlError, XlErrorKind, XlResult};

/// Number of rows in a worksheet.
pub const MAX_ROWS: u32 = 1_048_576;
/// Number of columns in a worksheet.
pub const MAX_COLUMNS: u32 = 16_384;

/// A 1-based `(row, column)` coordinate. An absent component stands for a whole line:
/// a coordinate without a column describes a whole row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coord {
    pub row: Option<u32>,
    pub column: Option<u32>,
}

impl Coord {
    /// Builds a coordinate, treating `0` as an absent component.
    pub fn new(row: u32, column: u32) -> Self {
        Self {
            row: (row > 0).then_some(row),
            column: (column > 0).then_some(column),
        }
    }

    pub fn whole_row(row: u32) -> Self {
        Self::new(row, 0)
    }

    pub fn whole_column(column: u32) -> Self {
        Self::new(0, column)
    }
}

impl From<(u32, u32)> for Coord {
    fn from((row, column): (u32, u32)) -> Self {
        Self::new(row, column)
    }
}

/// One coordinate, or two opposite corners of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMatrix {
    Point(Coord),
    Span(Coord, Coord),
}

fn ordered(first: Option<u32>, last: Option<u32>) -> (Option<u32>, Option<u32>) {
    match (first, last) {
        (Some(first), Some(last)) => (Some(first.min(last)), Some(first.max(last))),
        other => other,
    }
}

impl AddressMatrix {
    /// Reorders a span so that its first corner is the top-left one.
    pub fn normalized(self) -> Self {
        match self {
            Self::Point(coord) => Self::Point(coord),
            Self::Span(first, last) => {
                let (top, bottom) = ordered(first.row, last.row);
                let (left, right) = ordered(first.column, last.column);
                Self::Span(
                    Coord {
                        row: top,
                        column: left,
                    },
                    Coord {
                        row: bottom,
                        column: right,
                    },
                )
            }
        }
    }

    pub fn first(&self) -> Coord {
        match self {
            Self::Point(coord) | Self::Span(coord, _) => *coord,
        }
    }

    pub fn last(&self) -> Coord {
        match self {
            Self::Point(coord) | Self::Span(_, coord) => *coord,
        }
    }

    pub fn coords(&self) -> Vec<Coord> {
        match self {
            Self::Point(coord) => vec![*coord],
            Self::Span(first, last) => vec![*first, *last],
        }
    }

    /// Resolves one axis into inclusive 1-based bounds, absent bounds stretching to `limit`.
    fn bounds(&self, component: fn(&Coord) -> Option<u32>, limit: u32) -> (u32, u32) {
        match self {
            Self::Point(coord) => match component(coord) {
                Some(at) => (at, at),
                None => (1, limit),
            },
            Self::Span(first, last) => match (component(first), component(last)) {
                (Some(first), Some(last)) => (first, last),
                (Some(first), None) => (first, limit),
                (None, Some(last)) => (1, last),
                (None, None) => (1, limit),
            },
        }
    }
}

impl From<Coord> for AddressMatrix {
    fn from(coord: Coord) -> Self {
        Self::Point(coord)
    }
}

impl From<(Coord, Coord)> for AddressMatrix {
    fn from((first, last): (Coord, Coord)) -> Self {
        Self::Span(first, last)
    }
}

impl From<(u32, u32)> for AddressMatrix {
    fn from(coord: (u32, u32)) -> Self {
        Self::Point(coord.into())
    }
}

impl From<((u32, u32), (u32, u32))> for AddressMatrix {
    fn from((first, last): ((u32, u32), (u32, u32))) -> Self {
        Self::Span(first.into(), last.into())
    }
}

/// An immutable, normalized spreadsheet address.
///
/// Built from exactly one of an address string or a coordinate matrix. Opposite corners may
/// be given in any order: `"B3:A2"` and `"A2:B3"` are the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    matrix: AddressMatrix,
}

impl Address {
    pub fn new(address: Option<&str>, matrix: Option<AddressMatrix>) -> XlResult<Self> {
        match (address, matrix) {
            (Some(_), Some(_)) => Err(XlErrorKind::ConflictingInput.into()),
            (None, None) => Err(XlErrorKind::MissingInput.into()),
            (Some(address), None) => Self::parse(address),
            (None, Some(matrix)) => Self::from_matrix(matrix),
        }
    }

    pub fn parse(address: &str) -> XlResult<Self> {
        Ok(Self {
            matrix: codec::decode(address)?.normalized(),
        })
    }

    pub fn from_matrix(matrix: impl Into<AddressMatrix>) -> XlResult<Self> {
        let matrix = matrix.into().normalized();
        // Out-of-limit and empty coordinates are rejected by the encoder
        codec::encode(&matrix.coords()).with_context(|| format!("invalid matrix {matrix:?}"))?;
        Ok(Self { matrix })
    }

    /// A fully bounded address from inclusive 1-based bounds already known to be valid.
    pub(crate) fn from_bounds(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        let matrix = if top == bottom && left == right {
            AddressMatrix::Point(Coord::new(top, left))
        } else {
            AddressMatrix::Span(Coord::new(top, left), Coord::new(bottom, right))
        };
        Self {
            matrix: matrix.normalized(),
        }
    }

    pub fn coord(&self) -> AddressMatrix {
        self.matrix
    }

    pub fn row(&self) -> u32 {
        self.matrix.first().row.unwrap_or(1)
    }

    pub fn column(&self) -> u32 {
        self.matrix.first().column.unwrap_or(1)
    }

    fn row_bounds(&self) -> (u32, u32) {
        self.matrix.bounds(|coord| coord.row, MAX_ROWS)
    }

    fn column_bounds(&self) -> (u32, u32) {
        self.matrix.bounds(|coord| coord.column, MAX_COLUMNS)
    }

    /// Number of rows covered. Stretches to the last sheet row when the bottom bound is absent.
    pub fn row_count(&self) -> u32 {
        let (top, bottom) = self.row_bounds();
        bottom - top + 1
    }

    /// Number of columns covered. Stretches to the last sheet column when the right bound is
    /// absent.
    pub fn column_count(&self) -> u32 {
        let (left, right) = self.column_bounds();
        right - left + 1
    }

    pub fn last_row(&self) -> u32 {
        self.row_bounds().1
    }

    pub fn last_column(&self) -> u32 {
        self.column_bounds().1
    }

    pub fn count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.column_count())
    }

    /// Whether this address only describes rows, such as `"3:7"`.
    pub fn is_row(&self) -> bool {
        self.matrix.first().column.is_none()
    }

    /// Whether this address only describes columns, such as `"A:C"`.
    pub fn is_column(&self) -> bool {
        self.matrix.first().row.is_none()
    }

    pub fn is_single_cell(&self) -> bool {
        self.row_count() == 1 && self.column_count() == 1
    }

    /// Ordinal of a cell within this address, counting left to right then top to bottom from 1.
    ///
    /// With `absolute` set, `coord` is a sheet coordinate, otherwise it is relative to the
    /// top-left corner of this address.
    pub fn index_of(&self, coord: (u32, u32), absolute: bool) -> XlResult<u64> {
        let (row, column) = coord;
        let relative = if absolute {
            row.checked_sub(self.row() - 1)
                .zip(column.checked_sub(self.column() - 1))
        } else {
            Some(coord)
        };

        match relative {
            Some((rel_row, rel_column))
                if (1..=self.row_count()).contains(&rel_row)
                    && (1..=self.column_count()).contains(&rel_column) =>
            {
                Ok(u64::from(rel_row - 1) * u64::from(self.column_count()) + u64::from(rel_column))
            }
            _ => Err(XlErrorKind::IndexOutOfRange(format!(
                "coordinate ({row}, {column}) is outside of {self}"
            ))
            .into()),
        }
    }

    /// Relative `(row, column)` of the cell at `index`, the inverse of [`Address::index_of`].
    pub fn coord_of(&self, index: u64) -> XlResult<(u32, u32)> {
        if index < 1 || index > self.count() {
            return Err(XlErrorKind::IndexOutOfRange(format!(
                "index {index} should be in [1, {count}]",
                count = self.count()
            ))
            .into());
        }
        let columns = u64::from(self.column_count());
        // Both quotient and remainder are bounded by the row and column counts
        let row = ((index - 1) / columns + 1) as u32;
        let column = ((index - 1) % columns + 1) as u32;
        Ok((row, column))
    }

    pub fn contains(&self, other: &Address) -> bool {
        self.row() <= other.row()
            && self.column() <= other.column()
            && other.last_row() <= self.last_row()
            && other.last_column() <= self.last_column()
    }

    /// Resolves `relative`, read with this address's top-left cell as `A1`, into sheet
    /// coordinates.
    ///
    /// Absent components of `relative` stretch to this address's edges, so `"2:3"` selects the
    /// second and third rows across the full width.
    pub fn offset(&self, relative: &Address) -> XlResult<Address> {
        let (top, bottom) = relative
            .matrix
            .bounds(|coord| coord.row, self.row_count());
        let (left, right) = relative
            .matrix
            .bounds(|coord| coord.column, self.column_count());

        // An open end stretches to this frame's edge, so a start may lie past the end
        let (top, bottom) = (top.min(bottom), top.max(bottom));
        let (left, right) = (left.min(right), left.max(right));

        if bottom > self.row_count() {
            return Err(XlErrorKind::IndexOutOfRange(format!(
                "row {bottom} of {relative} exceeds the {count} rows of {self}",
                count = self.row_count()
            ))
            .into());
        }
        if right > self.column_count() {
            return Err(XlErrorKind::IndexOutOfRange(format!(
                "column {right} of {relative} exceeds the {count} columns of {self}",
                count = self.column_count()
            ))
            .into());
        }

        Ok(Self::from_bounds(
            self.row() + top - 1,
            self.column() + left - 1,
            self.row() + bottom - 1,
            self.column() + right - 1,
        ))
    }

    /// Smallest fully bounded address covering both addresses.
    pub fn bounding(&self, other: &Address) -> Address {
        Self::from_bounds(
            self.row().min(other.row()),
            self.column().min(other.column()),
            self.last_row().max(other.last_row()),
            self.last_column().max(other.last_column()),
        )
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoded = codec::encode(&self.matrix.coords()).map_err(|_| std::fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl FromStr for Address {
    type Err = XlError;

    fn from_str(s: &str) -> XlResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<AddressMatrix> for Address {
    type Error = XlError;

    fn try_from(matrix: AddressMatrix) -> XlResult<Self> {
        Self::from_matrix(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn construction_needs_exactly_one_input() {
        let err = Address::new(Some("A1"), Some(Coord::new(1, 1).into())).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::ConflictingInput));

        let err = Address::new(None, None).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::MissingInput));

        assert_eq!(
            Address::new(Some("B2"), None).unwrap(),
            Address::new(None, Some(Coord::new(2, 2).into())).unwrap()
        );
    }

    #[test]
    fn corners_are_normalized() {
        let reversed = Address::parse("B3:A2").unwrap();
        let ordered = Address::parse("A2:B3").unwrap();
        assert_eq!(reversed.coord(), ordered.coord());
        assert_eq!(
            reversed.coord(),
            AddressMatrix::Span(Coord::new(2, 1), Coord::new(3, 2))
        );
        assert_eq!(reversed.to_string(), "A2:B3");

        let from_matrix = Address::from_matrix((Coord::new(5, 1), Coord::new(2, 4))).unwrap();
        assert_eq!(from_matrix.to_string(), "A2:D5");
    }

    #[rstest]
    #[case("A1", 1, 1, 1, 1)]
    #[case("B3:D7", 3, 2, 5, 3)]
    #[case("3:7", 3, 1, 5, MAX_COLUMNS)]
    #[case("B:C", 1, 2, MAX_ROWS, 2)]
    #[case("C", 1, 3, MAX_ROWS, 1)]
    #[case("5", 5, 1, 1, MAX_COLUMNS)]
    #[case("B2:C", 2, 2, MAX_ROWS - 1, 2)]
    fn extents(
        #[case] address: &str,
        #[case] row: u32,
        #[case] column: u32,
        #[case] row_count: u32,
        #[case] column_count: u32,
    ) {
        let address = Address::parse(address).unwrap();
        assert_eq!(
            (
                address.row(),
                address.column(),
                address.row_count(),
                address.column_count()
            ),
            (row, column, row_count, column_count)
        );
    }

    #[rstest]
    #[case("3:7", true, false)]
    #[case("A:C", false, true)]
    #[case("A1:C3", false, false)]
    fn row_and_column_descriptors(
        #[case] address: &str,
        #[case] is_row: bool,
        #[case] is_column: bool,
    ) {
        let address = Address::parse(address).unwrap();
        assert_eq!((address.is_row(), address.is_column()), (is_row, is_column));
    }

    #[test]
    fn index_and_coord_are_inverse() {
        let address = Address::parse("C4:F9").unwrap();
        for index in 1..=address.count() {
            let coord = address.coord_of(index).unwrap();
            assert_eq!(address.index_of(coord, false).unwrap(), index);
        }
    }

    #[test]
    fn index_of_absolute_coordinates() {
        let address = Address::parse("C4:F9").unwrap();
        // D5 is the second cell of the second row
        assert_eq!(address.index_of((5, 4), true).unwrap(), 6);
        assert_eq!(address.index_of((2, 2), false).unwrap(), 6);

        let err = address.index_of((3, 3), true).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));
    }

    #[rstest]
    #[case(0)]
    #[case(25)]
    fn coord_of_out_of_range(#[case] index: u64) {
        let err = Address::parse("C4:F9").unwrap().coord_of(index).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));
    }

    #[rstest]
    #[case("A1", "C4")]
    #[case("B2:C3", "D5:E6")]
    #[case("2:3", "C5:F6")]
    #[case("B:B", "D4:D9")]
    fn offset_within_frame(#[case] relative: &str, #[case] expected: &str) {
        let frame = Address::parse("C4:F9").unwrap();
        let relative = Address::parse(relative).unwrap();
        assert_eq!(frame.offset(&relative).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("A7")]
    #[case("E1")]
    #[case("1:8")]
    #[case("A8:B")]
    #[case("E1:1")]
    fn offset_outside_frame(#[case] relative: &str) {
        let frame = Address::parse("C4:F9").unwrap();
        let err = frame
            .offset(&Address::parse(relative).unwrap())
            .unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));
    }

    #[test]
    fn bounding_and_contains() {
        let first = Address::parse("B2:C3").unwrap();
        let second = Address::parse("E1").unwrap();
        let bounding = first.bounding(&second);
        assert_eq!(bounding.to_string(), "B1:E3");
        assert!(bounding.contains(&first));
        assert!(bounding.contains(&second));
        assert!(!first.contains(&bounding));
    }
}
