use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::line_item::{
    parse_price, price_delta, sum_impacts, LineItem, LineItemChange, LineItemId, PicklistOption,
    SubstituteProduct,
};
use crate::domain::opportunity::OpportunityId;
use crate::errors::ValidationError;
use crate::wizard::events::PanelEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridField {
    NewProduct,
    NewPrice,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BulkEditError {
    #[error("Please set bulk new product or price before applying")]
    NothingToApply,
    #[error("Please select at least one product to apply bulk changes")]
    NoRowsSelected,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BulkApplied {
    pub event: PanelEvent,
    pub affected: usize,
}

/// One editable line item with its original values and in-progress edits.
#[derive(Clone, Debug, PartialEq)]
pub struct GridRow {
    pub item: LineItem,
    pub available_products: Vec<SubstituteProduct>,
    pub new_product: String,
    pub new_price: String,
    pub checked: bool,
    pub is_modified: bool,
}

impl GridRow {
    fn new(item: LineItem) -> Self {
        Self {
            item,
            available_products: Vec::new(),
            new_product: String::new(),
            new_price: String::new(),
            checked: false,
            is_modified: false,
        }
    }

    pub fn original_price(&self) -> Decimal {
        self.item.original_price()
    }

    pub fn impact(&self) -> Decimal {
        price_delta(parse_price(&self.new_price), self.original_price())
    }

    pub fn is_partial(&self) -> bool {
        self.is_modified && (self.new_product.trim().is_empty() != self.new_price.trim().is_empty())
    }

    fn set(&mut self, field: GridField, value: &str) {
        match field {
            GridField::NewProduct => self.new_product = value.to_owned(),
            GridField::NewPrice => self.new_price = value.to_owned(),
        }
        self.refresh_modified();
    }

    fn apply_bulk(&mut self, new_product: &str, new_price: &str) {
        if !new_product.trim().is_empty() {
            self.new_product = new_product.to_owned();
        }
        if !new_price.trim().is_empty() {
            self.new_price = new_price.to_owned();
        }
        self.refresh_modified();
    }

    fn reset(&mut self) {
        self.new_product.clear();
        self.new_price.clear();
        self.is_modified = false;
    }

    fn refresh_modified(&mut self) {
        self.is_modified =
            !self.new_product.trim().is_empty() || !self.new_price.trim().is_empty();
    }

    fn to_change(&self) -> LineItemChange {
        LineItemChange {
            line_item_id: self.item.id.clone(),
            opportunity_name: self.item.opportunity_name.clone(),
            original_product: self.item.product_name.clone(),
            original_price: self.original_price(),
            original_unit_price: self.item.unit_price,
            original_lease_rate: self.item.lease_rate,
            is_recurring_revenue: self.item.is_recurring_revenue,
            new_product: self.new_product.clone(),
            new_price: self.new_price.clone(),
        }
    }
}

/// Editable grid of line items with per-row and bulk edits.
#[derive(Clone, Debug, Default)]
pub struct LineItemGridEditor {
    rows: Vec<GridRow>,
    products_by_opportunity: BTreeMap<OpportunityId, Vec<SubstituteProduct>>,
    machine_types: Vec<PicklistOption>,
    loaded_for: Option<Vec<OpportunityId>>,
}

impl LineItemGridEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rows and re-applies any previously recorded changes.
    pub fn load_rows(
        &mut self,
        items: Vec<LineItem>,
        existing: &[LineItemChange],
        loaded_for: &[OpportunityId],
    ) {
        self.rows = items.into_iter().map(GridRow::new).collect();
        self.products_by_opportunity.clear();
        self.loaded_for = Some(loaded_for.to_vec());
        self.on_input(existing);
    }

    pub fn needs_reload(&self, selection: &[OpportunityId]) -> bool {
        self.loaded_for.as_deref() != Some(selection)
    }

    /// Opportunities that own at least one row, in row order.
    pub fn opportunity_groups(&self) -> Vec<OpportunityId> {
        let mut groups: Vec<OpportunityId> = Vec::new();
        for row in &self.rows {
            if !groups.contains(&row.item.opportunity_id) {
                groups.push(row.item.opportunity_id.clone());
            }
        }
        groups
    }

    pub fn set_substitute_products(
        &mut self,
        opportunity_id: &OpportunityId,
        products: Vec<SubstituteProduct>,
    ) {
        for row in self.rows.iter_mut().filter(|row| &row.item.opportunity_id == opportunity_id) {
            row.available_products = products.clone();
        }
        self.products_by_opportunity.insert(opportunity_id.clone(), products);
    }

    pub fn set_machine_types(&mut self, machine_types: Vec<PicklistOption>) {
        self.machine_types = machine_types;
    }

    /// Pushes the controller's recorded changes back into the rows.
    pub fn on_input(&mut self, changes: &[LineItemChange]) {
        for row in &mut self.rows {
            match changes.iter().find(|change| change.line_item_id == row.item.id) {
                Some(change) => {
                    row.new_product = change.new_product.clone();
                    row.new_price = change.new_price.clone();
                    row.refresh_modified();
                }
                None => row.reset(),
            }
        }
    }

    pub fn set_field(&mut self, row_id: &LineItemId, field: GridField, value: &str) -> Option<PanelEvent> {
        let row = self.rows.iter_mut().find(|row| &row.item.id == row_id)?;
        row.set(field, value);
        Some(self.changed())
    }

    pub fn set_checked(&mut self, row_id: &LineItemId, checked: bool) -> bool {
        match self.rows.iter_mut().find(|row| &row.item.id == row_id) {
            Some(row) => {
                row.checked = checked;
                true
            }
            None => false,
        }
    }

    pub fn check_all(&mut self, checked: bool) {
        for row in &mut self.rows {
            row.checked = checked;
        }
    }

    pub fn apply_to_selected(
        &mut self,
        new_product: &str,
        new_price: &str,
    ) -> Result<BulkApplied, BulkEditError> {
        ensure_bulk_values(new_product, new_price)?;
        let affected = self.checked_count();
        if affected == 0 {
            return Err(BulkEditError::NoRowsSelected);
        }
        for row in self.rows.iter_mut().filter(|row| row.checked) {
            row.apply_bulk(new_product, new_price);
        }
        Ok(BulkApplied { event: self.changed(), affected })
    }

    pub fn apply_to_all(
        &mut self,
        new_product: &str,
        new_price: &str,
    ) -> Result<BulkApplied, BulkEditError> {
        ensure_bulk_values(new_product, new_price)?;
        for row in &mut self.rows {
            row.apply_bulk(new_product, new_price);
        }
        Ok(BulkApplied { event: self.changed(), affected: self.rows.len() })
    }

    pub fn reset_all(&mut self) -> PanelEvent {
        for row in &mut self.rows {
            row.reset();
        }
        self.changed()
    }

    pub fn reset_row(&mut self, row_id: &LineItemId) -> Option<PanelEvent> {
        let row = self.rows.iter_mut().find(|row| &row.item.id == row_id)?;
        row.reset();
        Some(self.changed())
    }

    /// Modified rows only, projected for the outgoing request.
    pub fn changes(&self) -> Vec<LineItemChange> {
        self.rows.iter().filter(|row| row.is_modified).map(GridRow::to_change).collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let line_item_ids: Vec<LineItemId> =
            self.rows.iter().filter(|row| row.is_partial()).map(|row| row.item.id.clone()).collect();
        if line_item_ids.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::PartialLineItemChange { line_item_ids })
        }
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, row_id: &LineItemId) -> Option<&GridRow> {
        self.rows.iter().find(|row| &row.item.id == row_id)
    }

    pub fn products_for(&self, opportunity_id: &OpportunityId) -> &[SubstituteProduct] {
        self.products_by_opportunity.get(opportunity_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn machine_types(&self) -> &[PicklistOption] {
        &self.machine_types
    }

    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    pub fn modified_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_modified).count()
    }

    pub fn checked_count(&self) -> usize {
        self.rows.iter().filter(|row| row.checked).count()
    }

    pub fn all_checked(&self) -> bool {
        !self.rows.is_empty() && self.checked_count() == self.rows.len()
    }

    /// Sum of price deltas over modified rows that carry a new price.
    pub fn total_impact(&self) -> Decimal {
        sum_impacts(
            self.rows
                .iter()
                .filter(|row| row.is_modified && !row.new_price.trim().is_empty())
                .map(GridRow::impact),
        )
    }

    fn changed(&self) -> PanelEvent {
        PanelEvent::GridChanged { rows: self.changes() }
    }
}

fn ensure_bulk_values(new_product: &str, new_price: &str) -> Result<(), BulkEditError> {
    if new_product.trim().is_empty() && new_price.trim().is_empty() {
        return Err(BulkEditError::NothingToApply);
    }
    Ok(())
}
