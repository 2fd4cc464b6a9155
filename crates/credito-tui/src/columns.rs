// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use credito_app::{
    Align, ApplicationStatus, ColumnDef, ListConfig, ListController, Record, SortOrder, TabKind,
    display_value, format_money, value_as_decimal,
};
use serde_json::Value;
use std::cmp::Ordering;

pub fn list_for(tab: TabKind, rows_per_page: usize) -> ListController {
    let config = ListConfig::default()
        .rows_per_page(rows_per_page)
        .empty_message(empty_message(tab));
    let config = match tab {
        TabKind::Applications => config.order_by("createdAt", SortOrder::Desc),
        TabKind::Clients => config.order_by("last_name", SortOrder::Asc),
        _ => config,
    };
    ListController::new(columns_for(tab), config)
}

fn empty_message(tab: TabKind) -> &'static str {
    match tab {
        TabKind::Agents => "no agents yet -- press a to add one",
        TabKind::Campaigns => "no campaigns yet -- press a to add one",
        TabKind::Clients => "no clients yet -- press a to add one",
        TabKind::Applications => "no applications match",
        TabKind::Policies => "no credit policies yet -- press a to add one",
    }
}

pub fn columns_for(tab: TabKind) -> Vec<ColumnDef> {
    match tab {
        TabKind::Agents => vec![
            ColumnDef::new("id", "id").align(Align::Right).min_width(4),
            ColumnDef::new("name", "name").min_width(16),
            ColumnDef::new("agent_type", "type").format(format_snake),
            ColumnDef::new("status", "status").format(format_lower),
            ColumnDef::new("interactions_count", "interactions")
                .align(Align::Right)
                .format(format_interactions),
        ],
        TabKind::Campaigns => vec![
            ColumnDef::new("id", "id").align(Align::Right).min_width(4),
            ColumnDef::new("name", "name").min_width(16),
            ColumnDef::new("campaign_type", "type").format(format_lower),
            ColumnDef::new("agent", "agent")
                .format(format_agent)
                .compare(compare_agent),
            ColumnDef::new("status", "status").format(format_lower),
            ColumnDef::new("scheduled_at", "scheduled").format(format_date),
            ColumnDef::new("interactions_count", "interactions").align(Align::Right),
        ],
        TabKind::Clients => vec![
            ColumnDef::new("id", "id").align(Align::Right).min_width(4),
            ColumnDef::new("last_name", "name")
                .format(format_client_name)
                .min_width(18),
            ColumnDef::new("email", "email").min_width(20),
            ColumnDef::new("phone", "phone"),
            ColumnDef::new("identification", "identification"),
            ColumnDef::new("employment_status", "employment").format(format_snake),
            ColumnDef::new("monthly_income", "income")
                .align(Align::Right)
                .format(format_money_value),
        ],
        TabKind::Applications => vec![
            ColumnDef::new("id", "id").align(Align::Right).min_width(4),
            ColumnDef::new("client", "client")
                .format(format_applicant)
                .compare(compare_applicant)
                .min_width(18),
            ColumnDef::new("loanAmount", "amount")
                .align(Align::Right)
                .format(format_money_value),
            ColumnDef::new("term", "term")
                .align(Align::Right)
                .format(format_months),
            ColumnDef::new("monthlyPayment", "payment")
                .align(Align::Right)
                .format(format_money_value),
            ColumnDef::new("status", "status").format(format_application_status),
            ColumnDef::new("createdAt", "created").format(format_date),
        ],
        TabKind::Policies => vec![
            ColumnDef::new("id", "id").align(Align::Right).min_width(4),
            ColumnDef::new("name", "name").min_width(14),
            ColumnDef::new("version", "version"),
            ColumnDef::new("base_interest_rate", "base rate")
                .align(Align::Right)
                .format(format_percent),
            ColumnDef::new("max_loan_amount", "max loan")
                .align(Align::Right)
                .format(format_money_value),
            ColumnDef::new("is_active", "active").format(format_flag),
            ColumnDef::new("description", "description").unsortable(),
        ],
    }
}

fn format_lower(value: &Value, _: &Record) -> String {
    display_value(value).to_lowercase()
}

fn format_snake(value: &Value, _: &Record) -> String {
    display_value(value).to_lowercase().replace('_', " ")
}

fn format_money_value(value: &Value, _: &Record) -> String {
    value_as_decimal(value).map(format_money).unwrap_or_default()
}

fn format_percent(value: &Value, _: &Record) -> String {
    value_as_decimal(value)
        .map(|rate| format!("{}%", rate.normalize()))
        .unwrap_or_default()
}

fn format_months(value: &Value, _: &Record) -> String {
    match value.as_u64() {
        Some(1) => "1 month".to_owned(),
        Some(months) => format!("{months} months"),
        None => display_value(value),
    }
}

fn format_date(value: &Value, _: &Record) -> String {
    let text = display_value(value);
    text.get(..10).map(str::to_owned).unwrap_or(text)
}

fn format_flag(value: &Value, _: &Record) -> String {
    match value.as_bool() {
        Some(true) => "yes".to_owned(),
        Some(false) => "no".to_owned(),
        None => display_value(value),
    }
}

fn format_interactions(value: &Value, record: &Record) -> String {
    match record.get("max_interactions").and_then(Value::as_i64) {
        Some(max) => format!("{}/{max}", display_value(value)),
        None => display_value(value),
    }
}

fn format_application_status(value: &Value, _: &Record) -> String {
    value
        .as_str()
        .and_then(ApplicationStatus::parse)
        .map(|status| status.label().to_owned())
        .unwrap_or_else(|| display_value(value))
}

fn format_client_name(_: &Value, record: &Record) -> String {
    let first = record.str_field("first_name").unwrap_or_default();
    let last = record.str_field("last_name").unwrap_or_default();
    format!("{first} {last}").trim().to_owned()
}

fn applicant_name(record: &Record) -> String {
    let Some(client) = record.get("client") else {
        return String::new();
    };
    let part = |key: &str| client.get(key).and_then(Value::as_str).unwrap_or_default();
    format!("{} {}", part("firstName"), part("lastName"))
        .trim()
        .to_owned()
}

fn format_applicant(_: &Value, record: &Record) -> String {
    applicant_name(record)
}

fn compare_applicant(left: &Record, right: &Record) -> Ordering {
    applicant_name(left)
        .to_lowercase()
        .cmp(&applicant_name(right).to_lowercase())
}

fn agent_name(record: &Record) -> String {
    match record.get("agent") {
        Some(Value::Object(agent)) => agent
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| agent.get("id").map(|id| format!("#{}", display_value(id))))
            .unwrap_or_default(),
        _ => record
            .get("agent_id")
            .filter(|id| !id.is_null())
            .map(|id| format!("#{}", display_value(id)))
            .unwrap_or_default(),
    }
}

fn format_agent(_: &Value, record: &Record) -> String {
    agent_name(record)
}

fn compare_agent(left: &Record, right: &Record) -> Ordering {
    agent_name(left).cmp(&agent_name(right))
}
