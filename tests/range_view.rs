mod utils;

use anyhow::Result;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use xlmigrate::{
    CellArg, CellValue, MemorySheet, RangeValue, RangeView, Rgb, Span, ViewKind, Worksheet,
    XlErrorKind,
};

use crate::utils::text_rows;

#[fixture]
fn sheet() -> MemorySheet {
    MemorySheet::from_rows(
        "Grid",
        text_rows(&[
            &["a1", "b1", "c1", "d1"],
            &["a2", "b2", "c2", "d2"],
            &["a3", "b3", "c3", "d3"],
            &["a4", "b4", "c4", "d4"],
        ]),
    )
}

fn texts(view: &RangeView<'_>) -> Vec<String> {
    view.iter().map(|cell| cell.text()).collect()
}

#[rstest]
fn used_range_is_the_default_frame(sheet: MemorySheet) -> Result<()> {
    let used = RangeView::used_range(&sheet).expect("sheet has values");
    assert_eq!(used.address().to_string(), "A1:D4");
    assert_eq!(used.count(), 16);
    assert_eq!(used.rows().count(), 4);
    assert_eq!(used.columns().count(), 4);
    Ok(())
}

#[rstest]
fn string_and_coordinate_spans_agree(sheet: MemorySheet) -> Result<()> {
    let used = RangeView::used_range(&sheet).expect("sheet has values");
    let by_address = used.by_address("A1:B2")?;
    let by_coordinates = used.by_span(Span::coordinates((1, 1), (2, 2)))?;
    let by_cells = used.cells(&[CellArg::Pair(1, 1), CellArg::Pair(2, 2)])?;
    assert_eq!(by_address.address(), by_coordinates.address());
    assert_eq!(by_address.address(), by_cells.address());
    assert_eq!(texts(&by_address), vec!["a1", "b1", "a2", "b2"]);
    Ok(())
}

#[rstest]
fn reversed_address_resolves_to_the_same_box(sheet: MemorySheet) -> Result<()> {
    let used = RangeView::used_range(&sheet).expect("sheet has values");
    assert_eq!(
        used.by_address("B3:A2")?.address(),
        used.by_span(Span::coordinates((3, 2), (2, 1)))?.address()
    );
    Ok(())
}

#[rstest]
fn nested_views_resolve_relative_to_their_frame(sheet: MemorySheet) -> Result<()> {
    let inner = RangeView::parse(&sheet, "B2:D4")?;
    assert_eq!(inner.by_ordinal(1)?.text(), "b2");
    assert_eq!(inner.by_coordinate(3, 3)?.text(), "d4");
    assert_eq!(inner.by_address("B1")?.text(), "c2");
    assert_eq!(inner.by_ordinal(-1)?.text(), "d4");
    Ok(())
}

#[rstest]
fn row_and_column_collections(sheet: MemorySheet) -> Result<()> {
    let used = RangeView::used_range(&sheet).expect("sheet has values");

    let rows = used.rows().by_span(Span::Ordinal {
        start: None,
        stop: Some(3),
        step: None,
    })?;
    assert_eq!(rows.kind(), ViewKind::Rows);
    assert_eq!(rows.count(), 3);
    assert_eq!(rows.by_ordinal(2)?.texts(), vec!["a2", "b2", "c2", "d2"]);

    let columns = used.columns().by_span(Span::Ordinal {
        start: Some(2),
        stop: None,
        step: None,
    })?;
    assert_eq!(columns.address().to_string(), "B1:D4");
    assert_eq!(
        columns.iter().map(|column| column.text()).collect::<Vec<_>>(),
        vec!["b1", "c1", "d1"]
    );
    Ok(())
}

#[rstest]
fn slicing_errors(sheet: MemorySheet) -> Result<()> {
    let used = RangeView::used_range(&sheet).expect("sheet has values");

    let err = used
        .by_span(Span::Ordinal {
            start: Some(1),
            stop: Some(4),
            step: Some(2),
        })
        .unwrap_err();
    assert!(matches!(err.kind, XlErrorKind::UnsupportedSlice));

    let err = used.by_span(Span::ordinals(1, 17)).unwrap_err();
    assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));

    let err = used.rows().by_address("5:5").unwrap_err();
    assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)));

    // Open-ended sub-addresses starting past the frame stay out of it
    let frame = RangeView::parse(&sheet, "C4:F9")?;
    for address in ["A8:B", "E1:1"] {
        let err = frame.by_address(address).unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::IndexOutOfRange(_)), "{address}: {err}");
    }

    let err = used
        .cells(&[CellArg::Index(1), CellArg::Index(1), CellArg::Index(1)])
        .unwrap_err();
    assert!(matches!(err.kind, XlErrorKind::InvalidArguments(_)));
    Ok(())
}

#[rstest]
fn values_and_colors_round_trip(sheet: MemorySheet) -> Result<()> {
    let block = RangeView::parse(&sheet, "C3:D4")?;
    block.set_value(RangeValue::Matrix(text_rows(&[&["x", "y"], &["z", ""]])));
    assert_eq!(sheet.get(3, 4), CellValue::from("y"));
    assert_eq!(sheet.get(4, 4), CellValue::Empty);

    block.set_color(Some(Rgb(155, 87, 189)));
    assert_eq!(block.color(), Some(Rgb(155, 87, 189)));
    assert_eq!(sheet.fill(4, 4), Some(Rgb(155, 87, 189)));
    assert_eq!(block.color().map(Rgb::packed), Some(155 + 87 * 256 + 189 * 65536));

    block.set_color(None);
    assert_eq!(block.color(), None);
    Ok(())
}
