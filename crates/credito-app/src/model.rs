// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::*;
use crate::loan::format_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
    Training,
}

impl AgentStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Inactive, Self::Training];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Training => "training",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "training" => Some(Self::Training),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignType {
    Whatsapp,
    Email,
    Sms,
}

impl CampaignType {
    pub const ALL: [Self; 3] = [Self::Whatsapp, Self::Email, Self::Sms];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Whatsapp => "whatsapp",
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "whatsapp" => Some(Self::Whatsapp),
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "scheduled" => Some(Self::Scheduled),
            "active" | "running" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub const fn can_start(self) -> bool {
        matches!(self, Self::Draft | Self::Scheduled | Self::Paused)
    }

    pub const fn can_stop(self) -> bool {
        matches!(self, Self::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Review,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Review, Self::Approved, Self::Rejected];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "review" => Some(Self::Review),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Review => "in review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Only undecided applications accept a review decision.
    pub const fn is_reviewable(self) -> bool {
        matches!(self, Self::Pending | Self::Review)
    }
}

/// Server-side status filter for the applications list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Only(ApplicationStatus::Pending),
            Self::Only(ApplicationStatus::Pending) => Self::Only(ApplicationStatus::Review),
            Self::Only(ApplicationStatus::Review) => Self::Only(ApplicationStatus::Approved),
            Self::Only(ApplicationStatus::Approved) => Self::Only(ApplicationStatus::Rejected),
            Self::Only(ApplicationStatus::Rejected) => Self::All,
        }
    }

    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(status.as_str()),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approved" | "approve" => Some(Self::Approved),
            "rejected" | "reject" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPurpose {
    Personal,
    Business,
    Education,
    Home,
    Vehicle,
    DebtConsolidation,
    Other,
}

impl LoanPurpose {
    pub const ALL: [Self; 7] = [
        Self::Personal,
        Self::Business,
        Self::Education,
        Self::Home,
        Self::Vehicle,
        Self::DebtConsolidation,
        Self::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Business => "business",
            Self::Education => "education",
            Self::Home => "home",
            Self::Vehicle => "vehicle",
            Self::DebtConsolidation => "debt_consolidation",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|purpose| purpose.as_str() == value.trim())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Business => "business",
            Self::Education => "education",
            Self::Home => "home",
            Self::Vehicle => "vehicle",
            Self::DebtConsolidation => "debt consolidation",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabKind {
    Agents,
    Campaigns,
    Clients,
    Applications,
    Policies,
}

impl TabKind {
    pub const ALL: [Self; 5] = [
        Self::Agents,
        Self::Campaigns,
        Self::Clients,
        Self::Applications,
        Self::Policies,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Campaigns => "campaigns",
            Self::Clients => "clients",
            Self::Applications => "applications",
            Self::Policies => "policies",
        }
    }

    /// Collection path segment under `/api`.
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Campaigns => "campaigns",
            Self::Clients => "clients",
            Self::Applications => "applications",
            Self::Policies => "credit-policies",
        }
    }

    pub const fn noun(self) -> &'static str {
        match self {
            Self::Agents => "agent",
            Self::Campaigns => "campaign",
            Self::Clients => "client",
            Self::Applications => "application",
            Self::Policies => "policy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "agents" => Some(Self::Agents),
            "campaigns" => Some(Self::Campaigns),
            "clients" => Some(Self::Clients),
            "applications" => Some(Self::Applications),
            "policies" | "credit-policies" => Some(Self::Policies),
            _ => None,
        }
    }

    pub const fn form_kind(self) -> Option<FormKind> {
        match self {
            Self::Agents => Some(FormKind::Agent),
            Self::Campaigns => Some(FormKind::Campaign),
            Self::Clients => Some(FormKind::Client),
            Self::Policies => Some(FormKind::Policy),
            Self::Applications => None,
        }
    }
}

/// Status transitions exposed as `POST /api/<resource>/{id}/<action>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Activate,
    Deactivate,
    Start,
    Stop,
}

impl LifecycleAction {
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Activate => "activated",
            Self::Deactivate => "deactivated",
            Self::Start => "started",
            Self::Stop => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Agent,
    Campaign,
    Client,
    Policy,
    Review,
}

impl FormKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Campaign => "campaign",
            Self::Client => "client",
            Self::Policy => "policy",
            Self::Review => "review",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Search,
    Form(FormKind),
    Wizard,
    Login,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditPolicy {
    pub id: PolicyId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, alias = "isActive")]
    pub is_active: bool,
    #[serde(alias = "baseInterestRate", alias = "interest_rate")]
    pub base_interest_rate: Decimal,
    #[serde(default, alias = "maxLoanAmount")]
    pub max_loan_amount: Option<Decimal>,
}

impl CreditPolicy {
    pub fn selector_label(&self) -> String {
        let max = self
            .max_loan_amount
            .map(format_money)
            .unwrap_or_else(|| "none".to_owned());
        format!(
            "{} - rate: {}% - max: {max}",
            self.name,
            self.base_interest_rate.normalize()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: ClientId,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl ClientSummary {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl CurrentUser {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}
