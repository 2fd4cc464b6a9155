// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Entity-agnostic list controller: search, toggling sort and pagination
//! over an in-memory collection of JSON records.

use anyhow::{Result, anyhow, bail};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::ids::RecordId;
use crate::loan::parse_amount;

pub const ROWS_PER_PAGE_OPTIONS: [usize; 4] = [5, 10, 25, 50];
pub const DEFAULT_ROWS_PER_PAGE: usize = 10;
pub const DEFAULT_EMPTY_MESSAGE: &str = "no data available";

/// One row as delivered by the API. Carries an integer `id`; every other
/// field is schemaless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Record {
    id: RecordId,
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: RecordId) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_owned(), Value::from(id.get()));
        Self { id, fields }
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn decimal_field(&self, field: &str) -> Option<Decimal> {
        self.get(field).and_then(value_as_decimal)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        if field == "id" {
            if let Some(id) = id_from_value(&value) {
                self.id = RecordId::new(id);
            } else {
                return;
            }
        }
        self.fields.insert(field.to_owned(), value);
    }
}

impl TryFrom<Value> for Record {
    type Error = anyhow::Error;

    fn try_from(value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            bail!("record must be a JSON object");
        };
        let id = fields
            .get("id")
            .and_then(id_from_value)
            .ok_or_else(|| anyhow!("record is missing an integer id field"))?;
        Ok(Self {
            id: RecordId::new(id),
            fields,
        })
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.fields)
    }
}

fn id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Decodes a JSON array of records, rejecting the whole batch if any element
/// lacks an id.
pub fn records_from_value(value: Value) -> Result<Vec<Record>> {
    let Value::Array(items) = value else {
        bail!("expected a JSON array of records");
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            Record::try_from(item).map_err(|error| anyhow!("record {index}: {error}"))
        })
        .collect()
}

pub fn value_as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| number.as_f64().and_then(|raw| Decimal::try_from(raw).ok())),
        Value::String(text) => parse_amount(text),
        _ => None,
    }
}

/// Plain-text rendering of a field value. `null` renders empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(fields) => fields
            .values()
            .map(display_value)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

pub type FormatFn = fn(&Value, &Record) -> String;
pub type CompareFn = fn(&Record, &Record) -> Ordering;

/// Column configuration. `format` replaces the plain rendering of the cell;
/// `compare` replaces the value comparison used when sorting on this column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub id: &'static str,
    pub label: &'static str,
    pub align: Align,
    pub sortable: bool,
    pub format: Option<FormatFn>,
    pub compare: Option<CompareFn>,
    pub min_width: Option<u16>,
}

impl ColumnDef {
    pub const fn new(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            align: Align::Left,
            sortable: true,
            format: None,
            compare: None,
            min_width: None,
        }
    }

    pub const fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub const fn format(mut self, format: FormatFn) -> Self {
        self.format = Some(format);
        self
    }

    pub const fn compare(mut self, compare: CompareFn) -> Self {
        self.compare = Some(compare);
        self
    }

    pub const fn min_width(mut self, width: u16) -> Self {
        self.min_width = Some(width);
        self
    }

    /// A column whose field is absent from the record renders empty.
    pub fn render(&self, record: &Record) -> String {
        match record.get(self.id) {
            None => String::new(),
            Some(value) => match self.format {
                Some(format) => format(value, record),
                None => display_value(value),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub order_by: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub rows_per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.rows_per_page.max(1))
    }

    pub fn last_page(&self, total: usize) -> usize {
        self.page_count(total).saturating_sub(1)
    }

    fn bounds(&self, total: usize) -> (usize, usize) {
        let start = self.page.saturating_mul(self.rows_per_page).min(total);
        let end = start.saturating_add(self.rows_per_page).min(total);
        (start, end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
    pub order_by: String,
    pub order: SortOrder,
    pub rows_per_page: usize,
    pub empty_message: String,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            order_by: "id".to_owned(),
            order: SortOrder::Asc,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            empty_message: DEFAULT_EMPTY_MESSAGE.to_owned(),
        }
    }
}

impl ListConfig {
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by = field.to_owned();
        self.order = order;
        self
    }

    pub fn rows_per_page(mut self, rows: usize) -> Self {
        self.rows_per_page = rows;
        self
    }

    pub fn empty_message(mut self, message: &str) -> Self {
        self.empty_message = message.to_owned();
        self
    }
}

/// One rendered page of the filtered, sorted collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<'a> {
    pub rows: Vec<&'a Record>,
    pub filtered_count: usize,
    pub page: usize,
    pub page_count: usize,
    pub first_row: usize,
    pub last_row: usize,
}

impl ListPage<'_> {
    /// `from-to of count`, one-based.
    pub fn range_label(&self) -> String {
        format!(
            "{}-{} of {}",
            self.first_row, self.last_row, self.filtered_count
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListPresentation<'a> {
    Loading,
    Error(&'a str),
    Empty(&'a str),
    Rows(ListPage<'a>),
}

#[derive(Debug, Clone)]
pub struct ListController {
    columns: Vec<ColumnDef>,
    search: String,
    sort: SortState,
    pagination: Pagination,
    empty_message: String,
}

impl ListController {
    pub fn new(columns: Vec<ColumnDef>, config: ListConfig) -> Self {
        let rows_per_page = if ROWS_PER_PAGE_OPTIONS.contains(&config.rows_per_page) {
            config.rows_per_page
        } else {
            DEFAULT_ROWS_PER_PAGE
        };
        Self {
            columns,
            search: String::new(),
            sort: SortState {
                order_by: config.order_by,
                order: config.order,
            },
            pagination: Pagination {
                page: 0,
                rows_per_page,
            },
            empty_message: config.empty_message,
        }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn empty_message(&self) -> &str {
        &self.empty_message
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_owned();
        self.pagination.page = 0;
    }

    /// Returns `false` when the field belongs to a column declared
    /// unsortable; sort state is left untouched in that case.
    pub fn request_sort(&mut self, field: &str) -> bool {
        if self
            .columns
            .iter()
            .any(|column| column.id == field && !column.sortable)
        {
            return false;
        }
        if self.sort.order_by == field {
            self.sort.order = self.sort.order.flip();
        } else {
            self.sort = SortState {
                order_by: field.to_owned(),
                order: SortOrder::Asc,
            };
        }
        true
    }

    pub fn set_page(&mut self, page: usize) {
        self.pagination.page = page;
    }

    /// Only the supported page sizes are accepted. Always resets to the
    /// first page on change.
    pub fn set_rows_per_page(&mut self, rows: usize) -> bool {
        if !ROWS_PER_PAGE_OPTIONS.contains(&rows) {
            return false;
        }
        self.pagination.rows_per_page = rows;
        self.pagination.page = 0;
        true
    }

    pub fn cycle_rows_per_page(&mut self) -> usize {
        let current = ROWS_PER_PAGE_OPTIONS
            .iter()
            .position(|rows| *rows == self.pagination.rows_per_page)
            .unwrap_or(0);
        let next = ROWS_PER_PAGE_OPTIONS[(current + 1) % ROWS_PER_PAGE_OPTIONS.len()];
        self.set_rows_per_page(next);
        next
    }

    pub fn next_page(&mut self, filtered_count: usize) {
        let last = self.pagination.last_page(filtered_count);
        self.pagination.page = self.pagination.page.saturating_add(1).min(last);
    }

    pub fn prev_page(&mut self) {
        self.pagination.page = self.pagination.page.saturating_sub(1);
    }

    pub fn last_page(&mut self, filtered_count: usize) {
        self.pagination.page = self.pagination.last_page(filtered_count);
    }

    /// Pulls the page back inside the collection after it shrank.
    pub fn clamp_page(&mut self, filtered_count: usize) {
        let last = self.pagination.last_page(filtered_count);
        if self.pagination.page > last {
            self.pagination.page = last;
        }
    }

    pub fn filter<'a>(&self, data: &'a [Record]) -> Vec<&'a Record> {
        if self.search.is_empty() {
            return data.iter().collect();
        }
        let needle = self.search.to_lowercase();
        data.iter()
            .filter(|record| {
                record
                    .fields()
                    .values()
                    .any(|value| value_contains(value, &needle))
            })
            .collect()
    }

    pub fn sort_rows(&self, rows: &mut Vec<&Record>) {
        let column_compare = self
            .columns
            .iter()
            .find(|column| column.id == self.sort.order_by)
            .and_then(|column| column.compare);
        let field = self.sort.order_by.as_str();
        let order = self.sort.order;
        stable_sort_by(rows, |left, right| {
            let ascending = match column_compare {
                Some(compare) => compare(left, right),
                None => compare_values(left.get(field), right.get(field)),
            };
            match order {
                SortOrder::Asc => ascending,
                SortOrder::Desc => ascending.reverse(),
            }
        });
    }

    /// Filter, then sort, without paging.
    pub fn arrange<'a>(&self, data: &'a [Record]) -> Vec<&'a Record> {
        let mut rows = self.filter(data);
        self.sort_rows(&mut rows);
        rows
    }

    pub fn view<'a>(&self, data: &'a [Record]) -> ListPage<'a> {
        let arranged = self.arrange(data);
        let filtered_count = arranged.len();
        let (start, end) = self.pagination.bounds(filtered_count);
        let rows = arranged[start..end].to_vec();
        let (first_row, last_row) = if rows.is_empty() {
            (0, 0)
        } else {
            (start + 1, start + rows.len())
        };
        ListPage {
            first_row,
            last_row,
            rows,
            filtered_count,
            page: self.pagination.page,
            page_count: self.pagination.page_count(filtered_count),
        }
    }

    /// Loading wins over an error, an error wins over an empty result.
    pub fn present<'a>(
        &'a self,
        loading: bool,
        error: Option<&'a str>,
        data: &'a [Record],
    ) -> ListPresentation<'a> {
        if loading {
            return ListPresentation::Loading;
        }
        if let Some(error) = error {
            return ListPresentation::Error(error);
        }
        let page = self.view(data);
        if page.filtered_count == 0 {
            return ListPresentation::Empty(&self.empty_message);
        }
        ListPresentation::Rows(page)
    }
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        Value::Object(fields) => fields.values().any(|item| value_contains(item, needle)),
        scalar => display_value(scalar).to_lowercase().contains(needle),
    }
}

/// Numbers compare numerically, strings lexicographically, booleans
/// false-first. Missing values and mixed kinds compare equal.
pub fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => compare_numbers(left, right),
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        _ => Ordering::Equal,
    }
}

/// Integers compare exactly; f64 is only the fallback for mixed or
/// fractional values.
fn compare_numbers(left: &serde_json::Number, right: &serde_json::Number) -> Ordering {
    fn integer(number: &serde_json::Number) -> Option<i128> {
        number
            .as_i64()
            .map(i128::from)
            .or_else(|| number.as_u64().map(i128::from))
    }
    if let (Some(left), Some(right)) = (integer(left), integer(right)) {
        return left.cmp(&right);
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        _ => Ordering::Equal,
    }
}

/// Top-down merge sort. Stable, and tolerant of comparators that are not a
/// total order (mixed JSON kinds compare equal), which `slice::sort_by` does
/// not guarantee.
pub fn stable_sort_by<T: Copy, F>(items: &mut Vec<T>, mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    let sorted = merge_sort(items, &mut compare);
    *items = sorted;
}

fn merge_sort<T: Copy, F>(items: &[T], compare: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return items.to_vec();
    }
    let middle = items.len() / 2;
    let left = merge_sort(&items[..middle], compare);
    let right = merge_sort(&items[middle..], compare);

    let mut merged = Vec::with_capacity(items.len());
    let (mut left_index, mut right_index) = (0, 0);
    while left_index < left.len() && right_index < right.len() {
        if compare(&right[right_index], &left[left_index]) == Ordering::Less {
            merged.push(right[right_index]);
            right_index += 1;
        } else {
            merged.push(left[left_index]);
            left_index += 1;
        }
    }
    merged.extend_from_slice(&left[left_index..]);
    merged.extend_from_slice(&right[right_index..]);
    merged
}
