use std::fmt::Debug;

use log::debug;

use crate::{
    error::{ErrorContext, XlErrorKind, XlResult},
    host::Worksheet,
    types::{
        address::{Address, MAX_COLUMNS, MAX_ROWS},
        cell::{CellValue, RangeValue},
        color::Rgb,
    },
};

/// What a view is a collection of, deciding how ordinals and spans are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Cells,
    Rows,
    Columns,
}

/// Bounds of a slice. A `None` start or stop defaults to the first or last item.
///
/// Steps are accepted so that they can be rejected: a view is always contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Ordinal {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    Coordinate {
        start: Option<(i64, i64)>,
        stop: Option<(i64, i64)>,
        step: Option<i64>,
    },
}

impl Span {
    pub fn ordinals(start: i64, stop: i64) -> Self {
        Self::Ordinal {
            start: Some(start),
            stop: Some(stop),
            step: None,
        }
    }

    pub fn coordinates(start: (i64, i64), stop: (i64, i64)) -> Self {
        Self::Coordinate {
            start: Some(start),
            stop: Some(stop),
            step: None,
        }
    }
}

/// An argument of [`RangeView::cells`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellArg {
    Index(i64),
    Pair(i64, i64),
}

/// Resolves a 1-based ordinal that may count from the end (`-1` is the last item).
fn resolve_ordinal(index: i64, count: u64, what: &str) -> XlResult<u64> {
    let magnitude = index.unsigned_abs();
    let resolved = if index == 0 || magnitude > count {
        None
    } else if index > 0 {
        Some(magnitude)
    } else {
        Some(count + 1 - magnitude)
    };
    resolved.ok_or_else(|| {
        XlErrorKind::IndexOutOfRange(format!(
            "{what} {index} should be in [1, {count}] or [-{count}, -1]"
        ))
        .into()
    })
}

/// Same as [`resolve_ordinal`] for an axis whose count fits in a `u32`.
fn resolve_axis(index: i64, count: u32, what: &str) -> XlResult<u32> {
    // The result is bounded by `count`
    resolve_ordinal(index, u64::from(count), what).map(|resolved| resolved as u32)
}

/// A bounded rectangular window over a worksheet.
///
/// The view owns no cells: values and fills are read and written through the worksheet.
/// Its extent is captured when it is built and never re-queried.
#[derive(Clone)]
pub struct RangeView<'s> {
    sheet: &'s dyn Worksheet,
    address: Address,
    row_count: u32,
    column_count: u32,
    kind: ViewKind,
}

impl Debug for RangeView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeView")
            .field("sheet", &self.sheet.name())
            .field("address", &self.address.to_string())
            .field("kind", &self.kind)
            .finish()
    }
}

impl<'s> RangeView<'s> {
    /// A view over `address`. Row or column descriptors (`"3:7"`, `"A:C"`) stretch to the
    /// sheet edges.
    pub fn new(sheet: &'s dyn Worksheet, address: Address) -> Self {
        Self::with_kind(
            sheet,
            Address::from_bounds(
                address.row(),
                address.column(),
                address.last_row(),
                address.last_column(),
            ),
            ViewKind::Cells,
        )
    }

    fn with_kind(sheet: &'s dyn Worksheet, address: Address, kind: ViewKind) -> Self {
        Self {
            sheet,
            address,
            row_count: address.row_count(),
            column_count: address.column_count(),
            kind,
        }
    }

    pub fn parse(sheet: &'s dyn Worksheet, address: &str) -> XlResult<Self> {
        Address::parse(address)
            .map(|address| Self::new(sheet, address))
            .with_context(|| format!("on sheet \"{}\"", sheet.name()))
    }

    pub fn whole_sheet(sheet: &'s dyn Worksheet) -> Self {
        Self::new(sheet, Address::from_bounds(1, 1, MAX_ROWS, MAX_COLUMNS))
    }

    /// The view over the sheet's used cells, `None` for an empty sheet.
    pub fn used_range(sheet: &'s dyn Worksheet) -> Option<Self> {
        sheet.used_range().map(|address| Self::new(sheet, address))
    }

    pub fn sheet(&self) -> &'s dyn Worksheet {
        self.sheet
    }

    /// The sheet address covered by this view, always fully bounded.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn row(&self) -> u32 {
        self.address.row()
    }

    pub fn column(&self) -> u32 {
        self.address.column()
    }

    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    fn last_row(&self) -> u32 {
        self.row() + self.row_count - 1
    }

    fn last_column(&self) -> u32 {
        self.column() + self.column_count - 1
    }

    /// Number of items: cells, rows or columns depending on the view kind.
    pub fn count(&self) -> u64 {
        match self.kind {
            ViewKind::Cells => u64::from(self.row_count) * u64::from(self.column_count),
            ViewKind::Rows => u64::from(self.row_count),
            ViewKind::Columns => u64::from(self.column_count),
        }
    }

    /// The same window, seen as cells.
    pub fn as_cells(&self) -> Self {
        Self::with_kind(self.sheet, self.address, ViewKind::Cells)
    }

    /// The same window, seen as a collection of rows.
    pub fn rows(&self) -> Self {
        Self::with_kind(self.sheet, self.address, ViewKind::Rows)
    }

    /// The same window, seen as a collection of columns.
    pub fn columns(&self) -> Self {
        Self::with_kind(self.sheet, self.address, ViewKind::Columns)
    }

    fn sub_view(&self, top: u32, left: u32, bottom: u32, right: u32, kind: ViewKind) -> Self {
        Self::with_kind(
            self.sheet,
            Address::from_bounds(top, left, bottom, right),
            kind,
        )
    }

    fn cell(&self, row: u32, column: u32) -> Self {
        let (row, column) = (self.row() + row - 1, self.column() + column - 1);
        self.sub_view(row, column, row, column, ViewKind::Cells)
    }

    /// Item at a resolved ordinal in `[1, count]`.
    fn item(&self, index: u64) -> Self {
        // Ordinals are bounded by `count`, so row and column offsets fit in a `u32`
        match self.kind {
            ViewKind::Cells => {
                let columns = u64::from(self.column_count);
                let row = ((index - 1) / columns + 1) as u32;
                let column = ((index - 1) % columns + 1) as u32;
                self.cell(row, column)
            }
            ViewKind::Rows => {
                let row = self.row() + index as u32 - 1;
                self.sub_view(row, self.column(), row, self.last_column(), ViewKind::Cells)
            }
            ViewKind::Columns => {
                let column = self.column() + index as u32 - 1;
                self.sub_view(self.row(), column, self.last_row(), column, ViewKind::Cells)
            }
        }
    }

    /// The cell, row or column at a 1-based ordinal. Negative ordinals count from the end.
    pub fn by_ordinal(&self, index: i64) -> XlResult<Self> {
        let resolved = resolve_ordinal(index, self.count(), "ordinal")
            .with_context(|| format!("in {self:?}"))?;
        Ok(self.item(resolved))
    }

    /// The cell at a 1-based `(row, column)` relative to this view.
    pub fn by_coordinate(&self, row: i64, column: i64) -> XlResult<Self> {
        let row = resolve_axis(row, self.row_count, "row").with_context(|| format!("in {self:?}"))?;
        let column = resolve_axis(column, self.column_count, "column")
            .with_context(|| format!("in {self:?}"))?;
        Ok(self.cell(row, column))
    }

    /// The sub-range at `address`, read with this view's top-left cell as `A1`.
    ///
    /// Row and column collections keep their kind when given a pure row or column
    /// descriptor (`"2:3"` on rows, `"B:C"` on columns).
    pub fn by_address(&self, address: &str) -> XlResult<Self> {
        let relative = Address::parse(address)?;
        let resolved = self
            .address
            .offset(&relative)
            .with_context(|| format!("in {self:?}"))?;
        let kind = match self.kind {
            ViewKind::Rows if relative.is_row() => ViewKind::Rows,
            ViewKind::Columns if relative.is_column() => ViewKind::Columns,
            _ => ViewKind::Cells,
        };
        debug!("resolved \"{address}\" to {resolved} in {self:?}");
        Ok(Self::with_kind(self.sheet, resolved, kind))
    }

    /// The smallest sub-range covering both ends of `span`.
    ///
    /// Ordinal spans on row or column collections select whole rows or columns.
    pub fn by_span(&self, span: Span) -> XlResult<Self> {
        let sliced = match span {
            Span::Ordinal { step: Some(_), .. } | Span::Coordinate { step: Some(_), .. } => {
                Err(XlErrorKind::UnsupportedSlice.into())
            }
            Span::Ordinal { start, stop, .. } => {
                let count = self.count();
                let start = match start {
                    Some(start) => resolve_ordinal(start, count, "span start")?,
                    None => 1,
                };
                let stop = match stop {
                    Some(stop) => resolve_ordinal(stop, count, "span stop")?,
                    None => count,
                };
                let (first, last) = (start.min(stop), start.max(stop));
                // Both ends are bounded by `count`
                Ok(match self.kind {
                    ViewKind::Cells => self.item(first).address.bounding(&self.item(last).address),
                    ViewKind::Rows => Address::from_bounds(
                        self.row() + first as u32 - 1,
                        self.column(),
                        self.row() + last as u32 - 1,
                        self.last_column(),
                    ),
                    ViewKind::Columns => Address::from_bounds(
                        self.row(),
                        self.column() + first as u32 - 1,
                        self.last_row(),
                        self.column() + last as u32 - 1,
                    ),
                })
                .map(|address| Self::with_kind(self.sheet, address, self.kind))
            }
            Span::Coordinate { start, stop, .. } => {
                let start = match start {
                    Some(start) => self.by_coordinate(start.0, start.1)?,
                    None => self.cell(1, 1),
                };
                let stop = match stop {
                    Some(stop) => self.by_coordinate(stop.0, stop.1)?,
                    None => self.cell(self.row_count, self.column_count),
                };
                Ok(Self::with_kind(
                    self.sheet,
                    start.address.bounding(&stop.address),
                    ViewKind::Cells,
                ))
            }
        };
        sliced.with_context(|| format!("could not slice {self:?} with {span:?}"))
    }

    /// Absolute cell access.
    ///
    /// No argument selects the whole view, one or two indices select one cell by ordinal or
    /// by `(row, column)`, one or two pairs select a cell or a rectangle between two cells.
    pub fn cells(&self, args: &[CellArg]) -> XlResult<Self> {
        let cells = self.as_cells();
        match args {
            [] => Ok(cells),
            [CellArg::Index(index)] => cells.by_ordinal(*index),
            [CellArg::Index(row), CellArg::Index(column)] | [CellArg::Pair(row, column)] => {
                cells.by_coordinate(*row, *column)
            }
            [CellArg::Pair(top, left), CellArg::Pair(bottom, right)] => {
                cells.by_span(Span::coordinates((*top, *left), (*bottom, *right)))
            }
            [_, _] => Err(XlErrorKind::InvalidArguments(
                "indices and pairs can not be mixed".to_string(),
            )
            .into()),
            _ => Err(XlErrorKind::InvalidArguments(format!(
                "expected at most 2 arguments, got {}",
                args.len()
            ))
            .into()),
        }
    }

    /// Cells, rows or columns of this view, in order.
    pub fn iter(&self) -> impl Iterator<Item = RangeView<'s>> + '_ {
        (1..=self.count()).map(|index| self.item(index))
    }

    /// A scalar for a single cell, rows of columns otherwise.
    pub fn value(&self) -> RangeValue {
        let rows = self.sheet.read(&self.address);
        if self.address.is_single_cell() {
            rows.into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .unwrap_or_default()
                .into()
        } else {
            rows.into()
        }
    }

    /// Hands `value` to the worksheet, which distributes it over the view.
    pub fn set_value(&self, value: impl Into<RangeValue>) {
        self.sheet.write(&self.address, &value.into());
    }

    /// Displayed text of the top-left cell.
    pub fn text(&self) -> String {
        self.sheet
            .read(&Address::from_bounds(
                self.row(),
                self.column(),
                self.row(),
                self.column(),
            ))
            .into_iter()
            .flatten()
            .next()
            .map(|value| value.to_text())
            .unwrap_or_default()
    }

    /// Trimmed text of every cell of the first row.
    pub fn texts(&self) -> Vec<String> {
        self.value().first_row_text()
    }

    /// Whether every cell of the view is empty.
    pub fn is_empty(&self) -> bool {
        self.sheet
            .read(&self.address)
            .iter()
            .flatten()
            .all(CellValue::is_empty)
    }

    /// Fill of the top-left cell.
    pub fn color(&self) -> Option<Rgb> {
        self.sheet.fill(self.row(), self.column())
    }

    /// Fills the whole view, `None` clearing the fill.
    pub fn set_color(&self, color: Option<Rgb>) {
        self.sheet.set_fill(&self.address, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemorySheet;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn sheet() -> MemorySheet {
        let sheet = MemorySheet::new("Data");
        for row in 1..=6 {
            for column in 1..=4 {
                sheet.set(row, column, format!("r{row}c{column}"));
            }
        }
        sheet
    }

    fn address_of(view: XlResult<RangeView<'_>>) -> String {
        view.unwrap().address().to_string()
    }

    #[rstest]
    fn whole_lines_stretch_to_the_sheet(sheet: MemorySheet) {
        let view = RangeView::parse(&sheet, "2:3").unwrap();
        assert_eq!(view.address().to_string(), "A2:XFD3");
        assert_eq!((view.row_count(), view.column_count()), (2, MAX_COLUMNS));
    }

    #[rstest]
    #[case(1, "B2")]
    #[case(3, "D2")]
    #[case(4, "B3")]
    #[case(12, "D5")]
    #[case(-1, "D5")]
    #[case(-12, "B2")]
    fn ordinals(sheet: MemorySheet, #[case] index: i64, #[case] expected: &str) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        assert_eq!(address_of(view.by_ordinal(index)), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(13)]
    #[case(-13)]
    fn ordinals_out_of_range(sheet: MemorySheet, #[case] index: i64) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        let err = view.by_ordinal(index).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));
    }

    #[rstest]
    fn collection_ordinals(sheet: MemorySheet) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        assert_eq!(view.rows().count(), 4);
        assert_eq!(address_of(view.rows().by_ordinal(2)), "B3:D3");
        assert_eq!(address_of(view.columns().by_ordinal(-1)), "D2:D5");
    }

    #[rstest]
    fn coordinates(sheet: MemorySheet) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        assert_eq!(address_of(view.by_coordinate(2, 3)), "D3");
        assert_eq!(address_of(view.by_coordinate(-1, -3)), "B5");

        let err = view.by_coordinate(5, 1).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));
    }

    #[rstest]
    fn address_and_coordinate_spans_agree(sheet: MemorySheet) {
        let view = RangeView::whole_sheet(&sheet);
        let by_address = view.by_address("A1:B2").unwrap();
        let by_span = view.by_span(Span::coordinates((1, 1), (2, 2))).unwrap();
        assert_eq!(by_address.address(), by_span.address());
    }

    #[rstest]
    fn address_descriptors_keep_collections(sheet: MemorySheet) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();

        let rows = view.rows().by_address("2:3").unwrap();
        assert_eq!(
            (rows.kind(), rows.address().to_string()),
            (ViewKind::Rows, "B3:D4".to_string())
        );

        let cells = view.rows().by_address("A1:B1").unwrap();
        assert_eq!(cells.kind(), ViewKind::Cells);

        let columns = view.columns().by_address("B:C").unwrap();
        assert_eq!(
            (columns.kind(), columns.address().to_string()),
            (ViewKind::Columns, "C2:D5".to_string())
        );
    }

    #[rstest]
    #[case(Span::ordinals(1, 5), "B2:C3")]
    #[case(Span::ordinals(5, 1), "B2:C3")]
    #[case(Span::ordinals(-1, 3), "D2:D5")]
    #[case(Span::Ordinal { start: None, stop: Some(2), step: None }, "B2:C2")]
    #[case(Span::coordinates((2, 2), (3, 3)), "C3:D4")]
    #[case(Span::Coordinate { start: Some((3, 1)), stop: None, step: None }, "B4:D5")]
    fn spans(sheet: MemorySheet, #[case] span: Span, #[case] expected: &str) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        assert_eq!(address_of(view.by_span(span)), expected);
    }

    #[rstest]
    fn row_spans_select_whole_rows(sheet: MemorySheet) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        let rows = view.rows().by_span(Span::ordinals(2, 3)).unwrap();
        assert_eq!(rows.kind(), ViewKind::Rows);
        assert_eq!(rows.address().to_string(), "B3:D4");
        assert_eq!(rows.iter().count(), 2);
    }

    #[rstest]
    #[case(Span::Ordinal { start: Some(1), stop: Some(4), step: Some(2) })]
    #[case(Span::Coordinate { start: None, stop: None, step: Some(1) })]
    fn stepped_spans_are_unsupported(sheet: MemorySheet, #[case] span: Span) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        let err = view.by_span(span).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::UnsupportedSlice));
    }

    #[rstest]
    fn spans_past_the_counts(sheet: MemorySheet) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        let err = view.by_span(Span::coordinates((1, 1), (5, 3))).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));
        let err = view.by_address("A1:D1").unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));
    }

    #[rstest]
    #[case(&[], "B2:D5")]
    #[case(&[CellArg::Index(5)], "C3")]
    #[case(&[CellArg::Index(2), CellArg::Index(1)], "B3")]
    #[case(&[CellArg::Pair(2, 1)], "B3")]
    #[case(&[CellArg::Pair(1, 2), CellArg::Pair(2, 3)], "C2:D3")]
    fn cells_arguments(sheet: MemorySheet, #[case] args: &[CellArg], #[case] expected: &str) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        assert_eq!(address_of(view.cells(args)), expected);
    }

    #[rstest]
    #[case(&[CellArg::Index(1), CellArg::Pair(1, 1)])]
    #[case(&[CellArg::Index(1), CellArg::Index(1), CellArg::Index(1)])]
    fn invalid_cells_arguments(sheet: MemorySheet, #[case] args: &[CellArg]) {
        let view = RangeView::parse(&sheet, "B2:D5").unwrap();
        let err = view.cells(args).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::InvalidArguments(_)));
    }

    #[rstest]
    fn values_go_through_the_sheet(sheet: MemorySheet) {
        let view = RangeView::parse(&sheet, "B2:C3").unwrap();
        assert_eq!(
            view.value(),
            RangeValue::Matrix(vec![
                vec!["r2c2".into(), "r2c3".into()],
                vec!["r3c2".into(), "r3c3".into()],
            ])
        );

        let cell = view.by_ordinal(1).unwrap();
        assert_eq!(cell.value(), RangeValue::from("r2c2"));
        cell.set_value("new");
        assert_eq!(sheet.get(2, 2), CellValue::from("new"));
        assert_eq!(view.text(), "new");
        assert_eq!(view.texts(), vec!["new", "r2c3"]);
    }

    #[rstest]
    fn colors_go_through_the_sheet(sheet: MemorySheet) {
        let view = RangeView::parse(&sheet, "A1:B2").unwrap();
        assert_eq!(view.color(), None);

        view.set_color(Some(Rgb(1, 2, 3)));
        assert_eq!(view.color(), Some(Rgb(1, 2, 3)));
        assert_eq!(sheet.fill(2, 2), Some(Rgb(1, 2, 3)));

        view.set_color(None);
        assert_eq!(sheet.fill(2, 2), None);
    }

    #[rstest]
    fn used_range_view(sheet: MemorySheet) {
        let view = RangeView::used_range(&sheet).unwrap();
        assert_eq!(view.address().to_string(), "A1:D6");
        assert!(RangeView::used_range(&MemorySheet::new("Empty")).is_none());
    }
}
