// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Headline counts for the console's dashboard overlay.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detail::{DetailSection, RecordDetail};
use crate::loan::round_cents;
use crate::model::{AgentStatus, ApplicationStatus, CampaignStatus};
use crate::table::Record;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_interactions: u64,
    #[serde(default)]
    pub total_applications: u64,
    #[serde(default)]
    pub approved_applications: u64,
    /// Percentage of applications approved, two decimals.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub conversion_rate: Decimal,
    #[serde(default)]
    pub active_agents: u64,
    #[serde(default)]
    pub active_campaigns: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub statuses: Vec<StatusCount>,
}

/// `approved / total * 100`, rounded to cents; zero when nothing was filed.
pub fn conversion_rate(approved: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    let ratio = Decimal::from(approved) * Decimal::ONE_HUNDRED / Decimal::from(total);
    round_cents(ratio)
}

impl Dashboard {
    /// Builds the dashboard from already-loaded rows. Every application
    /// status is listed, including the empty ones.
    pub fn from_records(agents: &[Record], campaigns: &[Record], applications: &[Record]) -> Self {
        let status_of =
            |record: &Record| record.str_field("status").and_then(ApplicationStatus::parse);
        let statuses: Vec<StatusCount> = ApplicationStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: status.as_str().to_owned(),
                count: applications
                    .iter()
                    .filter(|record| status_of(record) == Some(*status))
                    .count() as u64,
            })
            .collect();

        let total_applications = applications.len() as u64;
        let approved_applications = applications
            .iter()
            .filter(|record| status_of(record) == Some(ApplicationStatus::Approved))
            .count() as u64;
        let total_interactions = agents
            .iter()
            .filter_map(|record| record.get("interactions_count").and_then(Value::as_u64))
            .sum();
        let active_agents = agents
            .iter()
            .filter(|record| {
                record.str_field("status").and_then(AgentStatus::parse) == Some(AgentStatus::Active)
            })
            .count() as u64;
        let active_campaigns = campaigns
            .iter()
            .filter(|record| {
                record.str_field("status").and_then(CampaignStatus::parse)
                    == Some(CampaignStatus::Active)
            })
            .count() as u64;

        Self {
            summary: DashboardSummary {
                total_interactions,
                total_applications,
                approved_applications,
                conversion_rate: conversion_rate(approved_applications, total_applications),
                active_agents,
                active_campaigns,
            },
            statuses,
        }
    }

    pub fn to_detail(&self) -> RecordDetail {
        let summary = &self.summary;
        let overview = DetailSection::new("overview")
            .row("interactions", summary.total_interactions.to_string())
            .row("applications", summary.total_applications.to_string())
            .row("approved", summary.approved_applications.to_string())
            .row(
                "conversion",
                format!("{}%", summary.conversion_rate.normalize()),
            )
            .row("active agents", summary.active_agents.to_string())
            .row("active campaigns", summary.active_campaigns.to_string());

        let mut by_status = DetailSection::new("applications by status");
        for entry in &self.statuses {
            let label = ApplicationStatus::parse(&entry.status)
                .map(|status| status.label().to_owned())
                .unwrap_or_else(|| entry.status.clone());
            by_status = by_status.row(label, entry.count.to_string());
        }
        if self.statuses.is_empty() {
            by_status = by_status.row("", "no applications yet");
        }

        RecordDetail::new("dashboard")
            .section(overview)
            .section(by_status)
    }
}
