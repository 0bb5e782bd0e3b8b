//! Inventory workflows, mostly against the in-memory store.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use equip_inventory::config::InventoryDefaults;
use equip_inventory::models::{
    Allocation, AllocationRequest, ApprovalStage, DueState, NewInvoice, NewLineItem, Payment,
    ScrapRequest, ScrappedRecord, SerialStatus, Setting, Settings,
};
use equip_inventory::{create_pool, InventoryService, MemoryStore, RecordStore, ServiceError, SqliteStore};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

fn service() -> InventoryService<MemoryStore> {
    InventoryService::new(MemoryStore::new(), InventoryDefaults::default())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn line(item: &str, model: &str, qty: u32, unit_price: i64, tax: i64) -> NewLineItem {
    NewLineItem {
        item_name: item.to_string(),
        model_name: model.to_string(),
        qty,
        unit_price: BigDecimal::from(unit_price),
        tax: BigDecimal::from(tax),
        warranty: "1 year".to_string(),
        serials: Vec::new(),
    }
}

fn new_invoice(number: &str, lines: Vec<NewLineItem>) -> NewInvoice {
    NewInvoice {
        date: date(2024, 5, 10),
        po_number: "PO-88".to_string(),
        invoice_number: number.to_string(),
        supplier_name: "Acme Traders".to_string(),
        currency: String::new(),
        lines,
    }
}

fn alloc(user: &str, serial: &str) -> AllocationRequest {
    AllocationRequest {
        user_name: user.to_string(),
        serial: serial.to_string(),
        item_name: String::new(),
        model_name: String::new(),
    }
}

#[tokio::test]
async fn creating_an_invoice_issues_serials_and_payments() {
    let service = service();
    let detail = service
        .create_invoice(new_invoice(
            "INV1",
            vec![line("Laptop", "X1 Carbon", 2, 1000, 150), line("Mouse", "M720", 1, 25, 5)],
        ))
        .await
        .unwrap();

    assert_eq!(detail.invoice.currency, "LKR");
    assert_eq!(detail.invoice.grand_total, BigDecimal::from(2180));
    assert_eq!(detail.items.len(), 2);

    let serials: Vec<&str> = detail.serials.iter().map(|r| r.serial.as_str()).collect();
    assert_eq!(serials, vec!["ZRX-2024-INV1-0001", "ZRX-2024-INV1-0002", "ZRX-2024-INV1-0003"]);
    assert!(detail.serials.iter().all(|r| r.status == SerialStatus::Available));

    let payments: Vec<Payment> = service.store().get_all().await.unwrap();
    assert_eq!(payments.len(), 2);
    for payment in &payments {
        assert_eq!(payment.due_date, date(2024, 6, 9));
        assert_eq!(payment.invoice_id, detail.invoice.id);
        assert!(ApprovalStage::ALL.iter().all(|stage| !payment.stage_done(*stage)));
    }
    let laptop = payments.iter().find(|p| p.item_name == "Laptop").unwrap();
    assert_eq!(laptop.total_ex_tax, BigDecimal::from(2000));
    assert_eq!(laptop.grand_total, BigDecimal::from(2150));
}

#[tokio::test]
async fn serials_stay_unique_across_invoices() {
    let service = service();
    service
        .save_settings(Settings {
            credit_days: 14,
            serial_pattern: "EQ-{ITEM}-{SEQ}".to_string(),
        })
        .await
        .unwrap();

    let first = service
        .create_invoice(new_invoice("A-1", vec![line("Dock", "TB4", 2, 10, 0)]))
        .await
        .unwrap();
    let second = service
        .create_invoice(new_invoice("A-2", vec![line("Dock", "TB4", 2, 10, 0)]))
        .await
        .unwrap();

    let first: Vec<String> = first.serials.into_iter().map(|r| r.serial).collect();
    let second: Vec<String> = second.serials.into_iter().map(|r| r.serial).collect();
    assert_eq!(first, vec!["EQ-Dock-0001", "EQ-Dock-0002"]);
    assert_eq!(second, vec!["EQ-Dock-0003", "EQ-Dock-0004"]);

    let all = service.serial_statuses(None).await.unwrap();
    let unique: HashSet<&str> = all.iter().map(|r| r.serial.as_str()).collect();
    assert_eq!(unique.len(), all.len());
}

#[tokio::test]
async fn manual_serials_are_kept_and_the_rest_filled_in() {
    let service = service();
    let mut laptop = line("Laptop", "X1", 3, 1000, 0);
    laptop.serials = vec!["SN-A".to_string(), "  ".to_string()];
    let detail = service.create_invoice(new_invoice("INV9", vec![laptop])).await.unwrap();

    assert_eq!(detail.items[0].serials, vec!["SN-A", "ZRX-2024-INV9-0001", "ZRX-2024-INV9-0002"]);

    let mut clash = line("Laptop", "X1", 1, 1000, 0);
    clash.serials = vec!["SN-A".to_string()];
    let err = service.create_invoice(new_invoice("INV10", vec![clash])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn invoice_validation() {
    let service = service();
    let err = service.create_invoice(new_invoice("  ", vec![line("A", "B", 1, 1, 0)])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = service.create_invoice(new_invoice("INV1", vec![])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = service.create_invoice(new_invoice("INV1", vec![line("", "B", 1, 1, 0)])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn allocation_lifecycle() {
    let service = service();
    service
        .create_invoice(new_invoice("INV1", vec![line("Laptop", "X1", 2, 1000, 0)]))
        .await
        .unwrap();

    let allocation = service.allocate(alloc("nimal", "ZRX-2024-INV1-0001")).await.unwrap();
    assert_eq!(allocation.item_name, "Laptop");
    assert_eq!(allocation.unit_price, BigDecimal::from(1000));

    let available = service.available_serials("Laptop", "X1").await.unwrap();
    assert_eq!(available, vec!["ZRX-2024-INV1-0002"]);

    let err = service.allocate(alloc("sunil", "ZRX-2024-INV1-0001")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let err = service.allocate(alloc("sunil", "NOPE")).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let mut wrong_model = alloc("sunil", "ZRX-2024-INV1-0002");
    wrong_model.model_name = "T14".to_string();
    let err = service.allocate(wrong_model).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    service.unallocate(&allocation.id).await.unwrap();
    let rows = service.serial_statuses(None).await.unwrap();
    assert!(rows.iter().all(|r| r.status == SerialStatus::Available));

    let err = service.unallocate(&allocation.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn scrapping_requires_an_available_serial() {
    let service = service();
    service
        .create_invoice(new_invoice("INV1", vec![line("Phone", "P8", 2, 300, 0)]))
        .await
        .unwrap();

    service.allocate(alloc("nimal", "ZRX-2024-INV1-0001")).await.unwrap();
    let err = service
        .scrap(ScrapRequest {
            serial: "ZRX-2024-INV1-0001".to_string(),
            comment: "dropped".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let record = service
        .scrap(ScrapRequest {
            serial: "ZRX-2024-INV1-0002".to_string(),
            comment: " water damage ".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(record.item_name, "Phone");
    assert_eq!(record.comment, "water damage");

    let err = service.allocate(alloc("sunil", "ZRX-2024-INV1-0002")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let rows = service.serial_statuses(None).await.unwrap();
    assert_eq!(rows[0].status, SerialStatus::Allocated);
    assert_eq!(rows[1].status, SerialStatus::Scrapped);
    assert!(service.integrity_report().await.unwrap().is_clean());
}

#[tokio::test]
async fn deleting_an_invoice_removes_items_and_payments() {
    let service = service();
    let keep = service
        .create_invoice(new_invoice("KEEP", vec![line("Laptop", "X1", 1, 10, 0)]))
        .await
        .unwrap();
    let doomed = service
        .create_invoice(new_invoice("DROP", vec![line("Mouse", "M1", 2, 5, 0), line("Pad", "P1", 1, 2, 0)]))
        .await
        .unwrap();

    let deleted = service.delete_invoice(&doomed.invoice.id).await.unwrap();
    assert_eq!(deleted.line_items, 2);
    assert_eq!(deleted.payments, 2);

    let invoices = service.search_invoices("").await.unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].id, keep.invoice.id);
    let payments = service.list_payments("", date(2024, 5, 10)).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(service.serial_statuses(None).await.unwrap().len(), 1);

    let err = service.delete_invoice(&doomed.invoice.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn invoice_search_covers_headers_and_serials() {
    let service = service();
    let mut older = new_invoice("OLD-1", vec![line("Router", "AX3000", 1, 80, 0)]);
    older.date = date(2024, 1, 2);
    older.supplier_name = "Globex".to_string();
    service.create_invoice(older).await.unwrap();
    service
        .create_invoice(new_invoice("NEW-1", vec![line("Laptop", "X1", 1, 10, 0)]))
        .await
        .unwrap();

    let all = service.search_invoices("").await.unwrap();
    let numbers: Vec<&str> = all.iter().map(|i| i.invoice_number.as_str()).collect();
    assert_eq!(numbers, vec!["NEW-1", "OLD-1"]);

    let by_supplier = service.search_invoices("globex").await.unwrap();
    assert_eq!(by_supplier.len(), 1);
    let by_model = service.search_invoices("ax3000").await.unwrap();
    assert_eq!(by_model[0].invoice_number, "OLD-1");
    let by_serial = service.search_invoices("zrx-2024-new-1").await.unwrap();
    assert_eq!(by_serial[0].invoice_number, "NEW-1");
    assert!(service.search_invoices("nothing-like-this").await.unwrap().is_empty());

    let detail = service.invoice_detail(&by_serial[0].id).await.unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.serials.len(), 1);
}

#[tokio::test]
async fn payments_track_stages_and_due_dates() {
    let service = service();
    service
        .save_settings(Settings {
            credit_days: 10,
            serial_pattern: String::new(),
        })
        .await
        .unwrap();
    assert_eq!(service.settings().await.unwrap().serial_pattern, "ZRX-{YYYY}-{INV}-{SEQ}");

    service
        .create_invoice(new_invoice("INV1", vec![line("Laptop", "X1", 1, 10, 0)]))
        .await
        .unwrap();
    let mut later = new_invoice("INV2", vec![line("Monitor", "U27", 1, 10, 0)]);
    later.date = date(2024, 6, 1);
    service.create_invoice(later).await.unwrap();

    let views = service.list_payments("", date(2024, 5, 25)).await.unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].payment.due_date, date(2024, 5, 20));
    assert_eq!(views[0].days_until_due, -5);
    assert_eq!(views[0].due_state, DueState::Overdue);
    assert_eq!(views[1].days_until_due, 17);
    assert_eq!(views[1].due_state, DueState::OnTrack);

    let filtered = service.list_payments("monitor", date(2024, 5, 25)).await.unwrap();
    assert_eq!(filtered.len(), 1);

    let id = views[0].payment.id.clone();
    service.set_payment_stage(&id, ApprovalStage::GrnDone, true).await.unwrap();
    let updated = service.set_payment_stage(&id, ApprovalStage::Paid, true).await.unwrap();
    assert!(updated.stage_done(ApprovalStage::GrnDone));
    assert!(updated.stage_done(ApprovalStage::Paid));
    assert!(!updated.stage_done(ApprovalStage::FinApproved));

    let err = service.set_payment_stage("pay_missing", ApprovalStage::Paid, true).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn settings_fall_back_to_defaults() {
    let service = service();
    assert_eq!(
        service.settings().await.unwrap(),
        Settings {
            credit_days: 30,
            serial_pattern: "ZRX-{YYYY}-{INV}-{SEQ}".to_string(),
        }
    );

    let err = service
        .save_settings(Settings {
            credit_days: -1,
            serial_pattern: "X-{SEQ}".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn suggestions_are_distinct_and_sorted() {
    let service = service();
    service
        .create_invoice(new_invoice("INV1", vec![line("Mouse", "M1", 1, 1, 0), line("Laptop", "X1", 2, 1, 0)]))
        .await
        .unwrap();
    service
        .create_invoice(new_invoice("INV2", vec![line("Laptop", "X1", 1, 1, 0)]))
        .await
        .unwrap();
    service.allocate(alloc("sunil", "ZRX-2024-INV1-0001")).await.unwrap();
    service.allocate(alloc("amara", "ZRX-2024-INV1-0002")).await.unwrap();

    let suggestions = service.suggestions().await.unwrap();
    assert_eq!(suggestions.suppliers, vec!["Acme Traders"]);
    assert_eq!(suggestions.items, vec!["Laptop", "Mouse"]);
    assert_eq!(suggestions.models, vec!["M1", "X1"]);
    assert_eq!(suggestions.users, vec!["amara", "sunil"]);
}

#[tokio::test]
async fn preview_uses_saved_pattern_unless_overridden() {
    let service = service();
    let ctx = equip_inventory::service::SerialContext {
        inv: Some("INV7".to_string()),
        year: Some(2025),
        seq: Some(12),
        ..Default::default()
    };
    assert_eq!(service.preview_serial(None, &ctx).await.unwrap(), "ZRX-2025-INV7-0012");
    assert_eq!(service.preview_serial(Some("{INV}/{SEQ}"), &ctx).await.unwrap(), "INV7/0012");
}

#[tokio::test]
async fn lenient_amounts_from_json_input() {
    let service = service();
    let body = serde_json::json!({
        "date": "2024-05-10",
        "invoice_number": "JSON-1",
        "lines": [
            { "item_name": "Cable", "model_name": "C1", "qty": "2", "unit_price": "4.50", "tax": "oops" },
            { "item_name": "Hub", "model_name": "H1", "qty": -3, "unit_price": 20 }
        ]
    });
    let new_invoice: NewInvoice = serde_json::from_value(body).unwrap();
    let detail = service.create_invoice(new_invoice).await.unwrap();

    assert_eq!(detail.invoice.grand_total, BigDecimal::from_str("9").unwrap());
    assert_eq!(detail.items[0].serials.len(), 2);
    assert!(detail.items[1].serials.is_empty());
}

#[tokio::test]
async fn credit_terms_beyond_the_date_range_are_rejected() {
    let service = service();
    let err = service
        .save_settings(Settings {
            credit_days: 200_000_000_000_000,
            serial_pattern: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(service.settings().await.unwrap().credit_days, 30);

    service
        .save_settings(Settings {
            credit_days: 3650,
            serial_pattern: String::new(),
        })
        .await
        .unwrap();

    // a value written outside save_settings must not crash invoice creation
    service
        .store()
        .put(&Setting {
            key: "creditDays".to_string(),
            value: serde_json::json!(200_000_000_000_000i64),
        })
        .await
        .unwrap();
    let err = service
        .create_invoice(new_invoice("INV1", vec![line("Laptop", "X1", 1, 10, 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(service.search_invoices("").await.unwrap().is_empty());
}

#[tokio::test]
async fn line_quantity_is_capped() {
    let service = service();
    let huge: NewLineItem = serde_json::from_value(serde_json::json!({
        "item_name": "Cable",
        "model_name": "C1",
        "qty": "4000000000",
        "unit_price": 1
    }))
    .unwrap();
    assert_eq!(huge.qty, 4_000_000_000);
    let err = service.create_invoice(new_invoice("BIG", vec![huge])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(service.serial_statuses(None).await.unwrap().is_empty());

    let small = InventoryService::new(
        MemoryStore::new(),
        InventoryDefaults {
            max_line_qty: 3,
            ..InventoryDefaults::default()
        },
    );
    let detail = small
        .create_invoice(new_invoice("OK", vec![line("Dock", "D1", 3, 1, 0)]))
        .await
        .unwrap();
    assert_eq!(detail.serials.len(), 3);
    let err = small
        .create_invoice(new_invoice("OVER", vec![line("Dock", "D1", 4, 1, 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_for_one_serial_admit_a_single_writer() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("inventory.db").display());
    let pool = create_pool(&url, 4).await.unwrap();
    let service = Arc::new(InventoryService::new(SqliteStore::new(pool), InventoryDefaults::default()));
    service
        .create_invoice(new_invoice("INV1", vec![line("Laptop", "X1", 2, 1000, 0)]))
        .await
        .unwrap();

    let serial = "ZRX-2024-INV1-0001";
    let mut handles = Vec::new();
    for user in ["nimal", "sunil", "amara", "kamal"] {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.allocate(alloc(user, serial)).await.map(|_| ())
        }));
    }
    for comment in ["cracked", "lost"] {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .scrap(ScrapRequest {
                    serial: serial.to_string(),
                    comment: comment.to_string(),
                })
                .await
                .map(|_| ())
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(err) => assert!(matches!(err, ServiceError::Conflict(_)), "unexpected error: {}", err),
        }
    }
    assert_eq!(succeeded, 1);

    let allocations: Vec<Allocation> = service.store().get_all().await.unwrap();
    let scrapped: Vec<ScrappedRecord> = service.store().get_all().await.unwrap();
    assert_eq!(allocations.len() + scrapped.len(), 1);
    assert!(service.integrity_report().await.unwrap().is_clean());
}
