mod utils;

use std::{cell::RefCell, rc::Rc};

use anyhow::Result;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use serde_json::Value;
use xlmigrate::{
    EXIT_CALLBACK, Instruction, MemoryHost, MigrationOptions, MigrationPayload, Phase,
    RESULT_CALLBACK, XlController, XlErrorKind,
};

use crate::utils::{add_sheet, payload};

#[fixture]
fn host() -> MemoryHost {
    let host = MemoryHost::new();
    add_sheet(
        &host,
        "inventory.xlsx",
        "Stock",
        &[
            &["Sku", "Qty"],
            &["A-1", "4"],
            &["A-2", "0"],
            &["A-3", "12"],
        ],
    );
    add_sheet(
        &host,
        "orders.xlsx",
        "Pending",
        &[&["Sku", "Qty"], &["A-1", ""], &["A-3", "12"], &["B-7", ""]],
    );
    host
}

fn stock_to_pending() -> MigrationPayload {
    payload(
        false,
        Instruction::new("orders.xlsx", "Pending", "A1", "B1"),
        vec![Instruction::new("inventory.xlsx", "Stock", "A1", "B1")],
    )
}

#[rstest]
fn encoded_payload_runs_to_completion(host: MemoryHost) -> Result<()> {
    let results = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&results);
    host.on_macro(RESULT_CALLBACK, move |args| {
        recorded.borrow_mut().push(args.to_vec());
        Ok(Value::Null)
    });

    let encoded = stock_to_pending().to_base64()?;
    let mut controller =
        XlController::with_macro_callbacks(&host, MigrationOptions::new().with_batch_size(1));
    let status = controller.execute(MigrationPayload::from_base64(&encoded)?);
    assert_eq!(status, 0);

    let results = results.borrow();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0][0], Value::from(0));
    let summary: Value = serde_json::from_str(results[0][1].as_str().unwrap_or_default())?;
    assert_eq!(summary["Filled-in"], 1);
    assert_eq!(summary["Ignored"], 1);
    assert_eq!(summary["Mismatched"], 1);
    assert_eq!(summary["Unused"], 2);

    let report = controller.last_report().expect("successful runs keep their report");
    assert_eq!(report.found, 3);

    assert_eq!(
        host.macro_calls()
            .iter()
            .map(|call| call.name.as_str())
            .collect::<Vec<_>>(),
        vec![RESULT_CALLBACK, EXIT_CALLBACK]
    );
    assert!(!host.is_connected());
    Ok(())
}

#[rstest]
fn progress_is_reported_per_batch(host: MemoryHost) {
    let phases = RefCell::new(Vec::new());
    let statuses = RefCell::new(Vec::new());
    let mut controller = XlController::new(
        &host,
        MigrationOptions::new().with_batch_size(2),
        |progress| phases.borrow_mut().push((progress.phase, progress.rows_processed)),
        |status| statuses.borrow_mut().push(status),
    );

    assert_eq!(controller.execute(stock_to_pending()), 0);
    drop(controller);

    assert_eq!(
        phases.into_inner(),
        vec![
            (Phase::Read, 2),
            (Phase::Write, 4),
            (Phase::Write, 6),
            (Phase::Done, 6),
        ]
    );
    assert_eq!(statuses.into_inner(), vec![0]);
}

#[rstest]
fn unreachable_host_exits_with_1(host: MemoryHost) {
    host.set_locked(true);
    let mut controller = XlController::with_macro_callbacks(&host, MigrationOptions::default());

    assert_eq!(controller.execute(stock_to_pending()), 1);
    assert!(controller.last_report().is_none());
    assert_eq!(
        host.macro_calls()
            .iter()
            .map(|call| call.name.as_str())
            .collect::<Vec<_>>(),
        vec![EXIT_CALLBACK]
    );
}

#[rstest]
fn failing_result_callback_exits_with_2(host: MemoryHost) {
    host.on_macro(RESULT_CALLBACK, |_| {
        Err(XlErrorKind::InvalidArguments("the workbook is read-only".to_string()).into())
    });
    let statuses = RefCell::new(Vec::new());
    let mut controller = XlController::new(
        &host,
        MigrationOptions::default(),
        |_| {},
        |status| statuses.borrow_mut().push(status),
    );

    let err = controller.run(stock_to_pending()).unwrap_err();
    assert!(err.to_string().contains("could not report the migration summary"));
    assert_eq!(controller.execute(stock_to_pending()), 2);
    drop(controller);
    assert_eq!(statuses.into_inner(), vec![2]);
}
