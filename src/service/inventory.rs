use super::serial::{generate, has_sequence, SerialContext};
use super::status::{integrity_report, resolve_statuses, status_of};
use super::totals::{calc_grand, LineAmounts};
use crate::config::InventoryDefaults;
use crate::db::{Index, RecordStore};
use crate::error::{ServiceError, StoreError};
use crate::models::{
    new_id, Allocation, AllocationRequest, ApprovalStage, DeletedInvoice, DueState, IntegrityReport,
    Invoice, InvoiceDetail, InvoiceLineItem, NewInvoice, NewLineItem, Payment, PaymentView,
    ScrapRequest, ScrappedRecord, SerialStatus, SerialStatusRow, Setting, Settings, Suggestions,
    CREDIT_DAYS_KEY, SERIAL_PATTERN_KEY,
};
use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use std::collections::{BTreeSet, HashSet};
use tokio::sync::Mutex;

/// Upper bound on the payment term, ten years
const MAX_CREDIT_DAYS: i64 = 3650;

/// Inventory operations over a record store
pub struct InventoryService<S> {
    store: S,
    defaults: InventoryDefaults,
    /// Serializes check-then-write sequences that keep serials unique and singly held
    writes: Mutex<()>,
}

fn contains_query(fields: &[&str], query: &str) -> bool {
    fields.join(" ").to_lowercase().contains(query)
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Serials for one new line: manual entries first, then generated ones up to `qty`.
/// `seq` runs across the whole invoice; candidates already in `issued` are skipped.
fn issue_serials(
    pattern: &str,
    base: &SerialContext,
    line: &NewLineItem,
    issued: &mut HashSet<String>,
    seq: &mut u64,
) -> Result<Vec<String>, ServiceError> {
    let qty = line.qty as usize;
    let manual: Vec<&str> = line
        .serials
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if manual.len() > qty {
        return Err(ServiceError::Validation(format!(
            "{} serials given for {} {} with quantity {}",
            manual.len(),
            line.item_name,
            line.model_name,
            qty
        )));
    }

    let mut serials = Vec::new();
    for serial in manual {
        if !issued.insert(serial.to_string()) {
            return Err(ServiceError::Validation(format!("serial {} is already issued", serial)));
        }
        serials.push(serial.to_string());
    }

    let context = SerialContext {
        item: Some(line.item_name.trim().to_string()),
        model: Some(line.model_name.trim().to_string()),
        ..base.clone()
    };
    while serials.len() < qty {
        *seq += 1;
        let candidate = generate(
            pattern,
            &SerialContext {
                seq: Some(*seq),
                ..context.clone()
            },
        );
        if issued.insert(candidate.clone()) {
            serials.push(candidate);
        } else if !has_sequence(pattern) {
            return Err(ServiceError::Conflict(format!(
                "serial pattern {} has no {{SEQ}} placeholder and produced duplicate {}",
                pattern, candidate
            )));
        } else {
            tracing::debug!("Generated serial {} already issued, advancing sequence", candidate);
        }
    }

    Ok(serials)
}

impl<S: RecordStore> InventoryService<S> {
    pub fn new(store: S, defaults: InventoryDefaults) -> Self {
        Self {
            store,
            defaults,
            writes: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load_serial_sources(
        &self,
    ) -> Result<(Vec<InvoiceLineItem>, Vec<Allocation>, Vec<ScrappedRecord>), StoreError> {
        futures::try_join!(
            self.store.get_all::<InvoiceLineItem>(),
            self.store.get_all::<Allocation>(),
            self.store.get_all::<ScrappedRecord>(),
        )
    }

    /// Line item that issued `serial`, or NotFound
    fn owner_of<'a>(items: &'a [InvoiceLineItem], serial: &str) -> Result<&'a InvoiceLineItem, ServiceError> {
        items
            .iter()
            .find(|item| item.serials.iter().any(|s| s == serial))
            .ok_or_else(|| ServiceError::NotFound(format!("serial {} was never issued", serial)))
    }

    pub async fn settings(&self) -> Result<Settings, ServiceError> {
        let (credit_days, serial_pattern) = futures::try_join!(
            self.store.get::<Setting>(CREDIT_DAYS_KEY),
            self.store.get::<Setting>(SERIAL_PATTERN_KEY),
        )?;

        let credit_days = credit_days
            .and_then(|s| s.value.as_i64())
            .unwrap_or(self.defaults.credit_days);
        let serial_pattern = serial_pattern
            .and_then(|s| s.value.as_str().map(str::to_string))
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.defaults.serial_pattern.clone());

        Ok(Settings {
            credit_days,
            serial_pattern,
        })
    }

    pub async fn save_settings(&self, settings: Settings) -> Result<Settings, ServiceError> {
        if !(0..=MAX_CREDIT_DAYS).contains(&settings.credit_days) {
            return Err(ServiceError::Validation(format!(
                "credit days must be between 0 and {}, got {}",
                MAX_CREDIT_DAYS, settings.credit_days
            )));
        }
        let serial_pattern = if settings.serial_pattern.trim().is_empty() {
            self.defaults.serial_pattern.clone()
        } else {
            settings.serial_pattern
        };

        self.store
            .put(&Setting {
                key: CREDIT_DAYS_KEY.to_string(),
                value: serde_json::Value::from(settings.credit_days),
            })
            .await?;
        self.store
            .put(&Setting {
                key: SERIAL_PATTERN_KEY.to_string(),
                value: serde_json::Value::from(serial_pattern.clone()),
            })
            .await?;

        tracing::info!(
            "Settings saved: credit days {}, serial pattern {}",
            settings.credit_days,
            serial_pattern
        );
        Ok(Settings {
            credit_days: settings.credit_days,
            serial_pattern,
        })
    }

    /// Serial the current pattern would produce for `ctx`
    pub async fn preview_serial(&self, pattern: Option<&str>, ctx: &SerialContext) -> Result<String, ServiceError> {
        let pattern = match pattern.filter(|p| !p.trim().is_empty()) {
            Some(p) => p.to_string(),
            None => self.settings().await?.serial_pattern,
        };
        Ok(generate(&pattern, ctx))
    }

    /// Writes the invoice, its line items (with serials issued) and one payment row per line.
    pub async fn create_invoice(&self, new_invoice: NewInvoice) -> Result<InvoiceDetail, ServiceError> {
        let invoice_number = new_invoice.invoice_number.trim().to_string();
        if invoice_number.is_empty() {
            return Err(ServiceError::Validation("invoice number is required".to_string()));
        }
        if new_invoice.lines.is_empty() {
            return Err(ServiceError::Validation("an invoice needs at least one line".to_string()));
        }
        if let Some(line) = new_invoice
            .lines
            .iter()
            .find(|l| l.item_name.trim().is_empty() || l.model_name.trim().is_empty())
        {
            return Err(ServiceError::Validation(format!(
                "item and model are required (got item '{}', model '{}')",
                line.item_name, line.model_name
            )));
        }
        let max_qty = self.defaults.max_line_qty;
        if let Some(line) = new_invoice.lines.iter().find(|l| l.qty > max_qty) {
            return Err(ServiceError::Validation(format!(
                "quantity {} for {} {} exceeds the limit of {}",
                line.qty, line.item_name, line.model_name, max_qty
            )));
        }

        let settings = self.settings().await?;
        let due_date = Duration::try_days(settings.credit_days)
            .and_then(|term| new_invoice.date.checked_add_signed(term))
            .ok_or_else(|| {
                ServiceError::Validation(format!(
                    "credit days {} give no valid due date for {}",
                    settings.credit_days, new_invoice.date
                ))
            })?;

        let _writes = self.writes.lock().await;
        let existing = self.store.get_all::<InvoiceLineItem>().await?;
        let mut issued: HashSet<String> = existing.iter().flat_map(|i| i.serials.iter().cloned()).collect();

        let currency = match new_invoice.currency.trim() {
            "" => self.defaults.currency.clone(),
            c => c.to_string(),
        };
        let po_number = new_invoice.po_number.trim().to_string();
        let supplier_name = new_invoice.supplier_name.trim().to_string();
        let invoice_id = new_id("inv");
        let base = SerialContext {
            po: Some(po_number.clone()),
            inv: Some(invoice_number.clone()),
            year: Some(new_invoice.date.year()),
            ..Default::default()
        };

        let mut seq = 0u64;
        let mut grand_total = BigDecimal::zero();
        let mut items = Vec::with_capacity(new_invoice.lines.len());
        let mut payments = Vec::with_capacity(new_invoice.lines.len());

        for line in &new_invoice.lines {
            let serials = issue_serials(&settings.serial_pattern, &base, line, &mut issued, &mut seq)?;
            let totals = calc_grand(&LineAmounts::from(line));
            grand_total += &totals.grand;

            let item = InvoiceLineItem {
                id: new_id("item"),
                invoice_id: invoice_id.clone(),
                item_name: line.item_name.trim().to_string(),
                model_name: line.model_name.trim().to_string(),
                qty: line.qty,
                unit_price: line.unit_price.clone(),
                tax: line.tax.clone(),
                warranty: line.warranty.trim().to_string(),
                currency: currency.clone(),
                serials,
            };

            payments.push(Payment {
                id: new_id("pay"),
                invoice_id: invoice_id.clone(),
                po_number: po_number.clone(),
                invoice_number: invoice_number.clone(),
                supplier_name: supplier_name.clone(),
                item_name: item.item_name.clone(),
                model_name: item.model_name.clone(),
                qty: item.qty,
                currency: currency.clone(),
                unit_price: item.unit_price.clone(),
                total_ex_tax: totals.total_ex,
                tax: item.tax.clone(),
                grand_total: totals.grand,
                due_date,
                status: ApprovalStage::ALL.iter().map(|stage| (*stage, false)).collect(),
            });
            items.push(item);
        }

        let invoice = Invoice {
            id: invoice_id,
            date: new_invoice.date,
            po_number,
            invoice_number,
            supplier_name,
            currency,
            grand_total,
            created_at: Utc::now(),
        };

        self.store.put(&invoice).await?;
        for item in &items {
            self.store.put(item).await?;
        }
        for payment in &payments {
            self.store.put(payment).await?;
        }

        let serial_count: usize = items.iter().map(|i| i.serials.len()).sum();
        tracing::info!(
            "Invoice {} ({}) saved: {} lines, {} serials, due {}",
            invoice.invoice_number,
            invoice.id,
            items.len(),
            serial_count,
            due_date
        );

        let serials = resolve_statuses(&items, &[], &[]);
        Ok(InvoiceDetail {
            invoice,
            items,
            serials,
        })
    }

    /// Line items, payments, then the invoice itself. Not atomic.
    pub async fn delete_invoice(&self, invoice_id: &str) -> Result<DeletedInvoice, ServiceError> {
        if self.store.get::<Invoice>(invoice_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("invoice {}", invoice_id)));
        }

        let items = self
            .store
            .get_all_by_index::<InvoiceLineItem>(Index::ByInvoiceId, invoice_id)
            .await?;
        for item in &items {
            self.store.delete::<InvoiceLineItem>(&item.id).await?;
        }

        let payments: Vec<Payment> = self
            .store
            .get_all::<Payment>()
            .await?
            .into_iter()
            .filter(|p| p.invoice_id == invoice_id)
            .collect();
        for payment in &payments {
            self.store.delete::<Payment>(&payment.id).await?;
        }

        self.store.delete::<Invoice>(invoice_id).await?;

        tracing::info!(
            "Invoice {} deleted with {} line items and {} payments",
            invoice_id,
            items.len(),
            payments.len()
        );
        Ok(DeletedInvoice {
            invoice_id: invoice_id.to_string(),
            line_items: items.len(),
            payments: payments.len(),
        })
    }

    pub async fn invoice_detail(&self, invoice_id: &str) -> Result<InvoiceDetail, ServiceError> {
        let invoice = self
            .store
            .get::<Invoice>(invoice_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("invoice {}", invoice_id)))?;

        let mut items = self
            .store
            .get_all_by_index::<InvoiceLineItem>(Index::ByInvoiceId, invoice_id)
            .await?;
        items.sort_by(|a, b| a.item_name.cmp(&b.item_name));

        let serials = self.serial_statuses(Some(invoice_id)).await?;
        Ok(InvoiceDetail {
            invoice,
            items,
            serials,
        })
    }

    /// Newest first. A non-empty query matches invoice fields or any serial row on the invoice.
    pub async fn search_invoices(&self, query: &str) -> Result<Vec<Invoice>, ServiceError> {
        let mut invoices = self.store.get_all::<Invoice>().await?;
        invoices.sort_by(|a, b| b.date.cmp(&a.date));

        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(invoices);
        }

        let rows = self.serial_statuses(None).await?;
        Ok(invoices
            .into_iter()
            .filter(|inv| {
                let date = inv.date.to_string();
                let total = inv.grand_total.to_string();
                let header = [
                    date.as_str(),
                    inv.po_number.as_str(),
                    inv.invoice_number.as_str(),
                    inv.supplier_name.as_str(),
                    inv.currency.as_str(),
                    total.as_str(),
                ];
                contains_query(&header, &query)
                    || rows.iter().filter(|r| r.invoice_id == inv.id).any(|r| {
                        contains_query(
                            &[
                                r.item_name.as_str(),
                                r.model_name.as_str(),
                                r.serial.as_str(),
                                r.status.as_str(),
                                r.warranty.as_str(),
                            ],
                            &query,
                        )
                    })
            })
            .collect())
    }

    /// Derived rows sorted by serial, optionally limited to one invoice
    pub async fn serial_statuses(&self, invoice_id: Option<&str>) -> Result<Vec<SerialStatusRow>, ServiceError> {
        let (items, allocations, scrapped) = self.load_serial_sources().await?;
        let mut rows = resolve_statuses(&items, &allocations, &scrapped);
        if let Some(invoice_id) = invoice_id {
            rows.retain(|r| r.invoice_id == invoice_id);
        }
        rows.sort_by(|a, b| a.serial.cmp(&b.serial));
        Ok(rows)
    }

    pub async fn available_serials(&self, item_name: &str, model_name: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .serial_statuses(None)
            .await?
            .into_iter()
            .filter(|r| {
                r.item_name == item_name && r.model_name == model_name && r.status == SerialStatus::Available
            })
            .map(|r| r.serial)
            .collect())
    }

    pub async fn integrity_report(&self) -> Result<IntegrityReport, ServiceError> {
        let (items, allocations, scrapped) = self.load_serial_sources().await?;
        let report = integrity_report(&items, &allocations, &scrapped);
        if !report.is_clean() {
            tracing::warn!(
                "Integrity check: {} duplicate serials, {} multiply allocated, {} scrapped while allocated, {} unknown references",
                report.duplicate_serials.len(),
                report.multiply_allocated.len(),
                report.scrapped_while_allocated.len(),
                report.unknown_references.len()
            );
        }
        Ok(report)
    }

    /// Hands an Available serial to a user
    pub async fn allocate(&self, request: AllocationRequest) -> Result<Allocation, ServiceError> {
        let user_name = request.user_name.trim();
        let serial = request.serial.trim();
        if user_name.is_empty() || serial.is_empty() {
            return Err(ServiceError::Validation("user and serial are required".to_string()));
        }

        let _writes = self.writes.lock().await;
        let (items, allocations, scrapped) = self.load_serial_sources().await?;
        let owner = Self::owner_of(&items, serial)?;

        let item_name = request.item_name.trim();
        let model_name = request.model_name.trim();
        if (!item_name.is_empty() && item_name != owner.item_name)
            || (!model_name.is_empty() && model_name != owner.model_name)
        {
            return Err(ServiceError::Validation(format!(
                "serial {} belongs to {} {}",
                serial, owner.item_name, owner.model_name
            )));
        }

        match status_of(serial, &allocations, &scrapped) {
            SerialStatus::Available => {}
            status => {
                return Err(ServiceError::Conflict(format!("serial {} is {}", serial, status)));
            }
        }

        let allocation = Allocation {
            id: new_id("alloc"),
            dt: Utc::now(),
            user_name: user_name.to_string(),
            item_name: owner.item_name.clone(),
            model_name: owner.model_name.clone(),
            serial: serial.to_string(),
            unit_price: owner.unit_price.clone(),
        };
        self.store.put(&allocation).await?;

        tracing::info!("Serial {} allocated to {}", allocation.serial, allocation.user_name);
        Ok(allocation)
    }

    /// Removes an allocation; the serial resolves as Available again
    pub async fn unallocate(&self, allocation_id: &str) -> Result<Allocation, ServiceError> {
        let allocation = self
            .store
            .get::<Allocation>(allocation_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("allocation {}", allocation_id)))?;

        self.store.delete::<Allocation>(allocation_id).await?;
        tracing::info!("Serial {} unallocated from {}", allocation.serial, allocation.user_name);
        Ok(allocation)
    }

    pub async fn list_allocations(&self) -> Result<Vec<Allocation>, ServiceError> {
        let mut allocations = self.store.get_all::<Allocation>().await?;
        allocations.sort_by(|a, b| b.dt.cmp(&a.dt));
        Ok(allocations)
    }

    /// Retires an Available serial. Allocated serials must be unallocated first.
    pub async fn scrap(&self, request: ScrapRequest) -> Result<ScrappedRecord, ServiceError> {
        let serial = request.serial.trim();
        if serial.is_empty() {
            return Err(ServiceError::Validation("serial is required".to_string()));
        }

        let _writes = self.writes.lock().await;
        let (items, allocations, scrapped) = self.load_serial_sources().await?;
        let owner = Self::owner_of(&items, serial)?;

        match status_of(serial, &allocations, &scrapped) {
            SerialStatus::Available => {}
            status => {
                return Err(ServiceError::Conflict(format!("serial {} is {}", serial, status)));
            }
        }

        let record = ScrappedRecord {
            id: new_id("scrap"),
            dt: Utc::now(),
            item_name: owner.item_name.clone(),
            serial: serial.to_string(),
            comment: request.comment.trim().to_string(),
        };
        self.store.put(&record).await?;

        tracing::info!("Serial {} scrapped", record.serial);
        Ok(record)
    }

    pub async fn list_scrapped(&self) -> Result<Vec<ScrappedRecord>, ServiceError> {
        let mut scrapped = self.store.get_all::<ScrappedRecord>().await?;
        scrapped.sort_by(|a, b| b.dt.cmp(&a.dt));
        Ok(scrapped)
    }

    /// Earliest due first, with days remaining relative to `today`
    pub async fn list_payments(&self, query: &str, today: NaiveDate) -> Result<Vec<PaymentView>, ServiceError> {
        let query = query.trim().to_lowercase();
        let mut payments: Vec<Payment> = self
            .store
            .get_all::<Payment>()
            .await?
            .into_iter()
            .filter(|p| {
                query.is_empty()
                    || contains_query(
                        &[
                            p.po_number.as_str(),
                            p.invoice_number.as_str(),
                            p.supplier_name.as_str(),
                            p.item_name.as_str(),
                            p.model_name.as_str(),
                        ],
                        &query,
                    )
            })
            .collect();
        payments.sort_by(|a, b| a.due_date.cmp(&b.due_date));

        Ok(payments
            .into_iter()
            .map(|payment| {
                let days_until_due = (payment.due_date - today).num_days();
                PaymentView {
                    payment,
                    days_until_due,
                    due_state: DueState::from_days(days_until_due),
                }
            })
            .collect())
    }

    /// Re-reads the payment and flips one stage. Last write wins.
    pub async fn set_payment_stage(
        &self,
        payment_id: &str,
        stage: ApprovalStage,
        done: bool,
    ) -> Result<Payment, ServiceError> {
        let mut payment = self
            .store
            .get::<Payment>(payment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("payment {}", payment_id)))?;

        payment.status.insert(stage, done);
        self.store.put(&payment).await?;

        tracing::info!("Payment {} stage {} set to {}", payment_id, stage, done);
        Ok(payment)
    }

    pub async fn suggestions(&self) -> Result<Suggestions, ServiceError> {
        let (invoices, items, allocations) = futures::try_join!(
            self.store.get_all::<Invoice>(),
            self.store.get_all::<InvoiceLineItem>(),
            self.store.get_all::<Allocation>(),
        )?;

        Ok(Suggestions {
            suppliers: distinct_sorted(invoices.iter().map(|i| i.supplier_name.as_str())),
            items: distinct_sorted(items.iter().map(|i| i.item_name.as_str())),
            models: distinct_sorted(items.iter().map(|i| i.model_name.as_str())),
            users: distinct_sorted(allocations.iter().map(|a| a.user_name.as_str())),
        })
    }
}
