use crate::models::{
    Allocation, IntegrityReport, InvoiceLineItem, ScrappedRecord, SerialCount, SerialStatus,
    SerialStatusRow,
};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Derives the status of every issued serial from the three record collections.
///
/// Membership only: a serial allocated twice is reported the same as one allocated once.
/// Rows follow the order of `line_items` and their serials.
pub fn resolve_statuses(
    line_items: &[InvoiceLineItem],
    allocations: &[Allocation],
    scrapped: &[ScrappedRecord],
) -> Vec<SerialStatusRow> {
    let allocated: HashSet<&str> = allocations.iter().map(|a| a.serial.as_str()).collect();
    let retired: HashSet<&str> = scrapped.iter().map(|s| s.serial.as_str()).collect();

    let mut rows = Vec::with_capacity(line_items.iter().map(|i| i.serials.len()).sum());
    for item in line_items {
        for serial in &item.serials {
            let status = SerialStatus::derive(
                allocated.contains(serial.as_str()),
                retired.contains(serial.as_str()),
            );
            rows.push(SerialStatusRow {
                serial: serial.clone(),
                item_name: item.item_name.clone(),
                model_name: item.model_name.clone(),
                warranty: item.warranty.clone(),
                invoice_id: item.invoice_id.clone(),
                status,
            });
        }
    }
    rows
}

/// Status of a single serial under the same precedence as [`resolve_statuses`]
pub fn status_of(serial: &str, allocations: &[Allocation], scrapped: &[ScrappedRecord]) -> SerialStatus {
    SerialStatus::derive(
        allocations.iter().any(|a| a.serial == serial),
        scrapped.iter().any(|s| s.serial == serial),
    )
}

fn count_serials<'a>(serials: impl Iterator<Item = &'a str>) -> IndexMap<&'a str, usize> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for serial in serials {
        *counts.entry(serial).or_insert(0) += 1;
    }
    counts
}

fn repeated(counts: &IndexMap<&str, usize>) -> Vec<SerialCount> {
    counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(serial, &count)| SerialCount {
            serial: serial.to_string(),
            count,
        })
        .collect()
}

/// Lists the anomalies that `resolve_statuses` masks. Order follows first appearance.
pub fn integrity_report(
    line_items: &[InvoiceLineItem],
    allocations: &[Allocation],
    scrapped: &[ScrappedRecord],
) -> IntegrityReport {
    let issued = count_serials(line_items.iter().flat_map(|i| i.serials.iter().map(String::as_str)));
    let allocated = count_serials(allocations.iter().map(|a| a.serial.as_str()));
    let retired = count_serials(scrapped.iter().map(|s| s.serial.as_str()));

    let scrapped_while_allocated = retired
        .keys()
        .filter(|serial| allocated.contains_key(*serial))
        .map(|serial| serial.to_string())
        .collect();

    let mut unknown: IndexSet<&str> = IndexSet::new();
    for serial in allocated.keys().chain(retired.keys()) {
        if !issued.contains_key(serial) {
            unknown.insert(*serial);
        }
    }

    IntegrityReport {
        duplicate_serials: repeated(&issued),
        multiply_allocated: repeated(&allocated),
        scrapped_while_allocated,
        unknown_references: unknown.iter().map(|s| s.to_string()).collect(),
    }
}
