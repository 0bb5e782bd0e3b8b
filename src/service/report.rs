use crate::models::{Allocation, ApprovalStage, PaymentView, SerialStatusRow};
use csv::Writer;
use std::io::Write;

/// Serial status rows as CSV with a header line
pub fn write_serials<W: Write>(out: W, rows: &[SerialStatusRow]) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["serial", "item", "model", "status", "warranty", "invoice_id"])?;

    for row in rows {
        writer.write_record([
            row.serial.as_str(),
            row.item_name.as_str(),
            row.model_name.as_str(),
            row.status.as_str(),
            row.warranty.as_str(),
            row.invoice_id.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_allocations<W: Write>(out: W, allocations: &[Allocation]) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["dt", "user", "item", "model", "serial", "unit_price"])?;

    for allocation in allocations {
        writer.write_record(&[
            allocation.dt.to_rfc3339(),
            allocation.user_name.clone(),
            allocation.item_name.clone(),
            allocation.model_name.clone(),
            allocation.serial.clone(),
            allocation.unit_price.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Payments with one yes/no column per approval stage
pub fn write_payments<W: Write>(out: W, payments: &[PaymentView]) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(out);

    let mut header: Vec<String> = [
        "po_number",
        "invoice_number",
        "supplier",
        "item",
        "model",
        "qty",
        "currency",
        "unit_price",
        "total_ex_tax",
        "tax",
        "grand_total",
        "due_date",
        "days_until_due",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    header.extend(ApprovalStage::ALL.iter().map(|stage| stage.label().to_string()));
    writer.write_record(&header)?;

    for view in payments {
        let p = &view.payment;
        let mut record = vec![
            p.po_number.clone(),
            p.invoice_number.clone(),
            p.supplier_name.clone(),
            p.item_name.clone(),
            p.model_name.clone(),
            p.qty.to_string(),
            p.currency.clone(),
            p.unit_price.to_string(),
            p.total_ex_tax.to_string(),
            p.tax.to_string(),
            p.grand_total.to_string(),
            p.due_date.to_string(),
            view.days_until_due.to_string(),
        ];
        record.extend(
            ApprovalStage::ALL
                .iter()
                .map(|stage| if p.stage_done(*stage) { "yes" } else { "no" }.to_string()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
