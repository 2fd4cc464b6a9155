// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Read-only record pages: labelled sections built from a record and the
//! rows related to it.

use rust_decimal::Decimal;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::loan::{compute_monthly_payment, format_money, parse_term};
use crate::model::{ApplicationStatus, TabKind};
use crate::table::{Record, display_value, value_as_decimal};

const MISSING: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSection {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl DetailSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((label.into(), value.into()));
        self
    }

    fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDetail {
    pub title: String,
    pub sections: Vec<DetailSection>,
}

impl RecordDetail {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, section: DetailSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn find_section(&self, title: &str) -> Option<&DetailSection> {
        self.sections.iter().find(|section| section.title == title)
    }

    /// Value of `label` in the section titled `section`.
    pub fn value(&self, section: &str, label: &str) -> Option<&str> {
        self.find_section(section)?.value(label)
    }

    /// Text rendering: section titles flush left, rows indented with the
    /// labels of each section padded to a common width.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (index, section) in self.sections.iter().enumerate() {
            if index > 0 {
                lines.push(String::new());
            }
            lines.push(section.title.clone());
            let width = section
                .rows
                .iter()
                .map(|(label, _)| label.chars().count())
                .max()
                .unwrap_or(0);
            for (label, value) in &section.rows {
                if label.is_empty() {
                    lines.push(format!("  {value}"));
                } else {
                    lines.push(format!("  {:<width$}  {value}", label, width = width));
                }
            }
        }
        lines
    }
}

/// Per-client application tallies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientStats {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
    pub requested: Decimal,
}

impl ClientStats {
    pub fn from_applications(applications: &[Record]) -> Self {
        let mut stats = Self {
            total: applications.len(),
            ..Self::default()
        };
        for application in applications {
            match application_status(application) {
                Some(ApplicationStatus::Approved) => stats.approved += 1,
                Some(ApplicationStatus::Rejected) => stats.rejected += 1,
                Some(ApplicationStatus::Pending | ApplicationStatus::Review) => stats.pending += 1,
                None => {}
            }
            if let Some(amount) = application.decimal_field("loanAmount") {
                stats.requested += amount;
            }
        }
        stats
    }
}

/// Picks the page builder for `tab`. `related` is only read for clients,
/// where it holds the client's applications.
pub fn detail_for(tab: TabKind, record: &Record, related: &[Record]) -> RecordDetail {
    match tab {
        TabKind::Agents => agent_detail(record),
        TabKind::Campaigns => campaign_detail(record),
        TabKind::Clients => client_detail(record, related),
        TabKind::Applications => application_detail(record),
        TabKind::Policies => policy_detail(record),
    }
}

pub fn agent_detail(record: &Record) -> RecordDetail {
    let interactions = match record.get("max_interactions").and_then(Value::as_i64) {
        Some(max) => format!("{} of {max}", text(record, "interactions_count")),
        None => text(record, "interactions_count"),
    };
    RecordDetail::new(format!("agent {}", record.id())).section(
        DetailSection::new("agent")
            .row("name", text(record, "name"))
            .row("type", words(record, "agent_type"))
            .row("status", words(record, "status"))
            .row("interactions", interactions)
            .row("created", date(record, "created_at"))
            .row("description", text(record, "description")),
    )
}

pub fn campaign_detail(record: &Record) -> RecordDetail {
    let agent = match record.get("agent") {
        Some(Value::Object(agent)) => agent
            .get("name")
            .map(display_value)
            .unwrap_or_else(|| MISSING.to_owned()),
        _ => match record.get("agent_id") {
            Some(id) if !id.is_null() => format!("agent {}", display_value(id)),
            _ => MISSING.to_owned(),
        },
    };
    RecordDetail::new(format!("campaign {}", record.id()))
        .section(
            DetailSection::new("campaign")
                .row("name", text(record, "name"))
                .row("type", words(record, "campaign_type"))
                .row("status", words(record, "status"))
                .row("agent", agent)
                .row("scheduled", date(record, "scheduled_at"))
                .row("interactions", text(record, "interactions_count"))
                .row("description", text(record, "description")),
        )
        .section(
            DetailSection::new("message")
                .row("audience", text(record, "target_audience"))
                .row("template", text(record, "template")),
        )
}

pub fn client_detail(record: &Record, applications: &[Record]) -> RecordDetail {
    let name = format!(
        "{} {}",
        record.str_field("first_name").unwrap_or_default(),
        record.str_field("last_name").unwrap_or_default()
    )
    .trim()
    .to_owned();
    let stats = ClientStats::from_applications(applications);

    let mut history = DetailSection::new("applications");
    if applications.is_empty() {
        history = history.row("", "no applications yet");
    }
    for application in applications {
        history = history.row(
            format!("#{}", application.id()),
            format!(
                "{} over {} months, {} ({})",
                money(application, "loanAmount"),
                text(application, "term"),
                status_label(application),
                date(application, "createdAt"),
            ),
        );
    }

    RecordDetail::new(format!("client {}", record.id()))
        .section(
            DetailSection::new("client")
                .row("name", if name.is_empty() { MISSING.to_owned() } else { name })
                .row("email", text(record, "email"))
                .row("phone", text(record, "phone"))
                .row("identification", text(record, "identification"))
                .row("address", text(record, "address"))
                .row("created", date(record, "created_at")),
        )
        .section(
            DetailSection::new("employment")
                .row("status", words(record, "employment_status"))
                .row("monthly income", money(record, "monthly_income"))
                .row("years", text(record, "employment_years")),
        )
        .section(
            DetailSection::new("summary")
                .row("applications", stats.total.to_string())
                .row("approved", stats.approved.to_string())
                .row("pending", stats.pending.to_string())
                .row("rejected", stats.rejected.to_string())
                .row("requested", format_money(stats.requested)),
        )
        .section(history)
}

/// Full application page. A missing or unparseable `monthlyPayment` is
/// recomputed from the stored terms.
pub fn application_detail(record: &Record) -> RecordDetail {
    let principal = record.decimal_field("loanAmount");
    let rate = record.decimal_field("interestRate");
    let months = record.get("term").and_then(|value| match value {
        Value::Number(number) => number.as_u64().and_then(|raw| u32::try_from(raw).ok()),
        Value::String(raw) => parse_term(raw),
        _ => None,
    });
    let payment = record
        .decimal_field("monthlyPayment")
        .or_else(|| compute_monthly_payment(principal, rate, months));
    let total = payment
        .zip(months)
        .and_then(|(payment, months)| payment.checked_mul(Decimal::from(months)));
    let interest = total.zip(principal).map(|(total, principal)| total - principal);

    let loan = DetailSection::new("loan")
        .row("status", status_label(record))
        .row("amount", money(record, "loanAmount"))
        .row(
            "term",
            months
                .map(|months| format!("{months} months"))
                .unwrap_or_else(|| MISSING.to_owned()),
        )
        .row(
            "rate",
            rate.map(|rate| format!("{}%", rate.normalize()))
                .unwrap_or_else(|| MISSING.to_owned()),
        )
        .row("payment", optional_money(payment))
        .row("total repaid", optional_money(total))
        .row("total interest", optional_money(interest))
        .row("purpose", words(record, "purpose"))
        .row("policy", nested(record, "creditPolicy", &["name"]))
        .row("submitted", date(record, "createdAt"));

    let client = DetailSection::new("client")
        .row("name", nested(record, "client", &["firstName", "lastName"]))
        .row("email", nested(record, "client", &["email"]))
        .row("phone", nested(record, "client", &["phone"]));

    let mut detail = RecordDetail::new(format!("application {}", record.id()))
        .section(loan)
        .section(client);

    let comments = text(record, "additionalComments");
    if comments != MISSING {
        detail = detail.section(DetailSection::new("comments").row("", comments));
    }

    if let Some(review) = review_section(record) {
        detail = detail.section(review);
    }

    let mut activity = DetailSection::new("activity");
    for entry in array(record, "activityHistory") {
        let when = entry
            .get("timestamp")
            .map(format_timestamp)
            .unwrap_or_else(|| MISSING.to_owned());
        let mut line = object_text(entry, "action");
        let user = object_text(entry, "user");
        if user != MISSING {
            line = format!("{line} by {user}");
        }
        let comments = object_text(entry, "comments");
        if comments != MISSING {
            line = format!("{line}: {comments}");
        }
        activity = activity.row(when, line);
    }
    if !activity.rows.is_empty() {
        detail = detail.section(activity);
    }

    let mut documents = DetailSection::new("documents");
    for document in array(record, "documents") {
        let size = document
            .get("size")
            .and_then(Value::as_u64)
            .map(format_size)
            .unwrap_or_default();
        documents = documents.row(object_text(document, "name"), size);
    }
    if documents.rows.is_empty() {
        documents = documents.row("", "no documents attached");
    }
    detail.section(documents)
}

pub fn policy_detail(record: &Record) -> RecordDetail {
    let active = match record.get("is_active").and_then(Value::as_bool) {
        Some(true) => "yes".to_owned(),
        Some(false) => "no".to_owned(),
        None => MISSING.to_owned(),
    };
    let rate = record
        .decimal_field("base_interest_rate")
        .map(|rate| format!("{}%", rate.normalize()))
        .unwrap_or_else(|| MISSING.to_owned());
    RecordDetail::new(format!("credit policy {}", record.id())).section(
        DetailSection::new("policy")
            .row("name", text(record, "name"))
            .row("version", text(record, "version"))
            .row("active", active)
            .row("base rate", rate)
            .row("max loan", money(record, "max_loan_amount"))
            .row("description", text(record, "description")),
    )
}

/// Approval or rejection details, falling back to the flat review fields
/// for records that only carry those.
fn review_section(record: &Record) -> Option<DetailSection> {
    let status = application_status(record);
    let (details, by_key) = match status {
        Some(ApplicationStatus::Approved) => (record.get("approvalDetails"), "approvedBy"),
        Some(ApplicationStatus::Rejected) => (record.get("rejectionDetails"), "rejectedBy"),
        _ => (None, ""),
    };
    let mut section = DetailSection::new("review");
    match details {
        Some(details) if details.is_object() => {
            let when = details
                .get("date")
                .map(format_timestamp)
                .unwrap_or_else(|| MISSING.to_owned());
            section = section
                .row("date", when)
                .row("by", object_text(details, by_key));
            let reason = object_text(details, "reason");
            if reason != MISSING {
                section = section.row("reason", reason);
            }
            section = section.row("comments", object_text(details, "comments"));
        }
        _ => {
            let comments = text(record, "reviewComments");
            let reviewed_at = date(record, "reviewedAt");
            if comments == MISSING && reviewed_at == MISSING {
                return None;
            }
            section = section
                .row("date", reviewed_at)
                .row("by", text(record, "reviewedBy"))
                .row("comments", comments);
        }
    }
    Some(section)
}

fn application_status(record: &Record) -> Option<ApplicationStatus> {
    record.str_field("status").and_then(ApplicationStatus::parse)
}

fn status_label(record: &Record) -> String {
    match application_status(record) {
        Some(status) => status.label().to_owned(),
        None => text(record, "status"),
    }
}

fn text(record: &Record, field: &str) -> String {
    record.get(field).map(non_empty).unwrap_or_else(|| MISSING.to_owned())
}

fn words(record: &Record, field: &str) -> String {
    text(record, field).to_lowercase().replace('_', " ")
}

fn money(record: &Record, field: &str) -> String {
    optional_money(record.get(field).and_then(value_as_decimal))
}

fn optional_money(value: Option<Decimal>) -> String {
    value.map(format_money).unwrap_or_else(|| MISSING.to_owned())
}

fn date(record: &Record, field: &str) -> String {
    record
        .get(field)
        .map(format_timestamp)
        .unwrap_or_else(|| MISSING.to_owned())
}

/// Fields of a nested object joined by spaces, e.g. a client's first and
/// last name.
fn nested(record: &Record, field: &str, keys: &[&str]) -> String {
    let Some(Value::Object(object)) = record.get(field) else {
        return MISSING.to_owned();
    };
    let joined = keys
        .iter()
        .filter_map(|key| object.get(*key))
        .map(display_value)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() { MISSING.to_owned() } else { joined }
}

fn array<'a>(record: &'a Record, field: &str) -> &'a [Value] {
    record
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn object_text(value: &Value, key: &str) -> String {
    value.get(key).map(non_empty).unwrap_or_else(|| MISSING.to_owned())
}

fn non_empty(value: &Value) -> String {
    let text = display_value(value);
    if text.trim().is_empty() {
        MISSING.to_owned()
    } else {
        text
    }
}

/// RFC 3339 timestamps render as `YYYY-MM-DD HH:MM`; anything else as-is.
fn format_timestamp(value: &Value) -> String {
    let raw = display_value(value);
    if raw.trim().is_empty() {
        return MISSING.to_owned();
    }
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .ok()
        .and_then(|parsed| parsed.format(format).ok())
        .unwrap_or(raw)
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    match bytes {
        0..KIB => format!("{bytes} B"),
        KIB..1_048_576 => format!("{:.1} KB", bytes as f64 / KIB as f64),
        _ => format!("{:.1} MB", bytes as f64 / 1_048_576.0),
    }
}
