// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::loan::{parse_amount, parse_rate};
use crate::table::{Record, display_value};
use crate::{
    AgentId, AgentStatus, ApplicationId, CampaignStatus, CampaignType, FormKind, RecordId,
    ReviewDecision,
};

pub const AGENT_TYPES: [&str; 2] = ["credit_sales", "customer_support"];
pub const EMPLOYMENT_STATUSES: [&str; 4] = ["employed", "self_employed", "unemployed", "retired"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentFormInput {
    pub name: String,
    pub description: String,
    pub agent_type: String,
    pub max_interactions: i64,
    pub status: AgentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignFormInput {
    pub name: String,
    pub description: String,
    pub campaign_type: CampaignType,
    pub agent_id: Option<AgentId>,
    pub template: String,
    pub target_audience: String,
    pub status: CampaignStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientFormInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub identification: String,
    pub address: String,
    pub employment_status: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub monthly_income: Option<Decimal>,
    pub employment_years: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyFormInput {
    pub name: String,
    pub description: String,
    pub version: String,
    pub is_active: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub base_interest_rate: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub max_loan_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewFormInput {
    #[serde(skip)]
    pub application_id: ApplicationId,
    pub status: Option<ReviewDecision>,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Agent(AgentFormInput),
    Campaign(CampaignFormInput),
    Client(ClientFormInput),
    Policy(PolicyFormInput),
    Review(ReviewFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Agent(_) => FormKind::Agent,
            Self::Campaign(_) => FormKind::Campaign,
            Self::Client(_) => FormKind::Client,
            Self::Policy(_) => FormKind::Policy,
            Self::Review(_) => FormKind::Review,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Agent(agent) => agent.validate(),
            Self::Campaign(campaign) => campaign.validate(),
            Self::Client(client) => client.validate(),
            Self::Policy(policy) => policy.validate(),
            Self::Review(review) => review.validate(),
        }
    }

    /// JSON request body for create/update/review calls.
    pub fn to_body(&self) -> Result<Value> {
        let body = match self {
            Self::Agent(agent) => serde_json::to_value(agent),
            Self::Campaign(campaign) => serde_json::to_value(campaign),
            Self::Client(client) => serde_json::to_value(client),
            Self::Policy(policy) => serde_json::to_value(policy),
            Self::Review(review) => serde_json::to_value(review),
        };
        body.map_err(|error| anyhow!("encode {} form: {error}", self.kind().label()))
    }
}

impl AgentFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("agent name is required -- enter a name and retry");
        }
        if self.agent_type.trim().is_empty() {
            bail!("agent type is required -- choose a type and retry");
        }
        if self.max_interactions <= 0 {
            bail!("agent max interactions must be greater than 0");
        }
        Ok(())
    }
}

impl CampaignFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("campaign name is required -- enter a name and retry");
        }
        if self.agent_id.is_some_and(|agent| !agent.is_set()) {
            bail!("campaign agent id must be positive -- enter an agent id or leave it blank");
        }
        if self.template.trim().is_empty() {
            bail!("campaign message template is required -- enter a template and retry");
        }
        if self.target_audience.trim().is_empty() {
            bail!("campaign target audience is required -- enter a JSON audience and retry");
        }
        if serde_json::from_str::<Value>(&self.target_audience).is_err() {
            bail!("campaign target audience must be valid JSON, for example {{\"segment\":\"new\"}}");
        }
        Ok(())
    }
}

impl ClientFormInput {
    pub fn validate(&self) -> Result<()> {
        for (value, label) in [
            (&self.first_name, "first name"),
            (&self.last_name, "last name"),
            (&self.email, "email"),
            (&self.phone, "phone"),
            (&self.identification, "identification"),
            (&self.employment_status, "employment status"),
        ] {
            if value.trim().is_empty() {
                bail!("client {label} is required -- enter a {label} and retry");
            }
        }
        if !looks_like_email(&self.email) {
            bail!("client email {:?} is not a valid address", self.email);
        }
        match self.monthly_income {
            None => bail!("client monthly income is required -- enter an amount and retry"),
            Some(income) if income <= Decimal::ZERO => {
                bail!("client monthly income must be positive")
            }
            Some(_) => {}
        }
        match self.employment_years {
            None => bail!("client employment years is required -- enter 0 or more"),
            Some(years) if years < 0 => bail!("client employment years cannot be negative"),
            Some(_) => {}
        }
        Ok(())
    }
}

impl PolicyFormInput {
    pub fn validate(&self) -> Result<()> {
        for (value, label) in [
            (&self.name, "name"),
            (&self.description, "description"),
            (&self.version, "version"),
        ] {
            if value.trim().is_empty() {
                bail!("policy {label} is required -- enter a {label} and retry");
            }
        }
        if let Some(rate) = self.base_interest_rate
            && rate < Decimal::ZERO
        {
            bail!("policy base interest rate cannot be negative");
        }
        if let Some(max) = self.max_loan_amount
            && max <= Decimal::ZERO
        {
            bail!("policy max loan amount must be positive");
        }
        Ok(())
    }
}

impl ReviewFormInput {
    pub fn validate(&self) -> Result<()> {
        if !self.application_id.is_set() {
            bail!("review needs an application -- select an application and retry");
        }
        if self.status.is_none() {
            bail!("review decision is required -- choose approved or rejected");
        }
        if self.comments.trim().is_empty() {
            bail!("review comments are required -- explain the decision and retry");
        }
        Ok(())
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Amount,
    Choice(&'static [&'static str]),
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormFieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn field(key: &'static str, label: &'static str, kind: FieldKind) -> FormFieldSpec {
    FormFieldSpec { key, label, kind }
}

const AGENT_STATUS_CHOICES: [&str; 3] = ["active", "inactive", "training"];
const CAMPAIGN_TYPE_CHOICES: [&str; 3] = ["whatsapp", "email", "sms"];
const CAMPAIGN_STATUS_CHOICES: [&str; 6] = [
    "draft",
    "scheduled",
    "active",
    "paused",
    "completed",
    "cancelled",
];
const DECISION_CHOICES: [&str; 2] = ["approved", "rejected"];

const AGENT_FIELDS: [FormFieldSpec; 5] = [
    field("name", "name", FieldKind::Text),
    field("description", "description", FieldKind::Text),
    field("agent_type", "type", FieldKind::Choice(&AGENT_TYPES)),
    field("max_interactions", "max interactions", FieldKind::Integer),
    field("status", "status", FieldKind::Choice(&AGENT_STATUS_CHOICES)),
];

const CAMPAIGN_FIELDS: [FormFieldSpec; 7] = [
    field("name", "name", FieldKind::Text),
    field("description", "description", FieldKind::Text),
    field("campaign_type", "channel", FieldKind::Choice(&CAMPAIGN_TYPE_CHOICES)),
    field("agent_id", "agent id", FieldKind::Integer),
    field("template", "template", FieldKind::Text),
    field("target_audience", "audience (json)", FieldKind::Text),
    field("status", "status", FieldKind::Choice(&CAMPAIGN_STATUS_CHOICES)),
];

const CLIENT_FIELDS: [FormFieldSpec; 9] = [
    field("first_name", "first name", FieldKind::Text),
    field("last_name", "last name", FieldKind::Text),
    field("email", "email", FieldKind::Text),
    field("phone", "phone", FieldKind::Text),
    field("identification", "identification", FieldKind::Text),
    field("address", "address", FieldKind::Text),
    field(
        "employment_status",
        "employment",
        FieldKind::Choice(&EMPLOYMENT_STATUSES),
    ),
    field("monthly_income", "monthly income", FieldKind::Amount),
    field("employment_years", "years employed", FieldKind::Integer),
];

const POLICY_FIELDS: [FormFieldSpec; 6] = [
    field("name", "name", FieldKind::Text),
    field("description", "description", FieldKind::Text),
    field("version", "version", FieldKind::Text),
    field("base_interest_rate", "base rate %", FieldKind::Amount),
    field("max_loan_amount", "max loan", FieldKind::Amount),
    field("is_active", "active", FieldKind::Flag),
];

const REVIEW_FIELDS: [FormFieldSpec; 2] = [
    field("status", "decision", FieldKind::Choice(&DECISION_CHOICES)),
    field("comments", "comments", FieldKind::Text),
];

pub fn form_field_specs(kind: FormKind) -> &'static [FormFieldSpec] {
    match kind {
        FormKind::Agent => &AGENT_FIELDS,
        FormKind::Campaign => &CAMPAIGN_FIELDS,
        FormKind::Client => &CLIENT_FIELDS,
        FormKind::Policy => &POLICY_FIELDS,
        FormKind::Review => &REVIEW_FIELDS,
    }
}

/// Text buffers behind an entity form. Values stay raw until
/// [`FormDraft::to_payload`] parses and validates them, so a half-typed
/// number never loses keystrokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    kind: FormKind,
    target: Option<RecordId>,
    values: Vec<String>,
}

impl FormDraft {
    pub fn blank(kind: FormKind) -> Self {
        let values = form_field_specs(kind)
            .iter()
            .map(|spec| default_value(kind, spec).to_owned())
            .collect();
        Self {
            kind,
            target: None,
            values,
        }
    }

    /// Seeds an edit form from an existing row. Fields the row lacks keep
    /// their blank defaults.
    pub fn from_record(kind: FormKind, record: &Record) -> Self {
        let mut draft = Self::blank(kind);
        draft.target = Some(record.id());
        for (index, spec) in form_field_specs(kind).iter().enumerate() {
            if let Some(value) = record.get(spec.key) {
                let text = match (spec.kind, value) {
                    (FieldKind::Flag, Value::Bool(flag)) => flag_text(*flag).to_owned(),
                    (FieldKind::Choice(_), Value::String(text)) => text.to_ascii_lowercase(),
                    (_, other) => display_value(other),
                };
                draft.values[index] = text;
            }
        }
        draft
    }

    pub fn review(application_id: RecordId) -> Self {
        let mut draft = Self::blank(FormKind::Review);
        draft.target = Some(application_id);
        draft
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    /// Row being edited, or `None` for a create.
    pub fn target(&self) -> Option<RecordId> {
        self.target
    }

    pub fn specs(&self) -> &'static [FormFieldSpec] {
        form_field_specs(self.kind)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn set_value(&mut self, index: usize, value: &str) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value.to_owned();
        }
    }

    pub fn push_char(&mut self, index: usize, ch: char) {
        if let Some(slot) = self.values.get_mut(index) {
            slot.push(ch);
        }
    }

    pub fn pop_char(&mut self, index: usize) {
        if let Some(slot) = self.values.get_mut(index) {
            slot.pop();
        }
    }

    /// Rotates a choice or flag field. Returns the new value, or `None` for
    /// free-text fields.
    pub fn cycle_choice(&mut self, index: usize, delta: isize) -> Option<&str> {
        let spec = *self.specs().get(index)?;
        let options: &[&str] = match spec.kind {
            FieldKind::Choice(options) => options,
            FieldKind::Flag => &["yes", "no"],
            _ => return None,
        };
        let current = options
            .iter()
            .position(|option| *option == self.values[index])
            .map(|position| position as isize)
            .unwrap_or(-1);
        let len = options.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.values[index] = options[next].to_owned();
        Some(&self.values[index])
    }

    pub fn to_payload(&self) -> Result<FormPayload> {
        let payload = match self.kind {
            FormKind::Agent => FormPayload::Agent(AgentFormInput {
                name: self.text("name"),
                description: self.text("description"),
                agent_type: self.text("agent_type"),
                max_interactions: self.integer("max_interactions")?.unwrap_or(0),
                status: AgentStatus::parse(self.raw("status"))
                    .ok_or_else(|| anyhow!("agent status {:?} is unknown", self.raw("status")))?,
            }),
            FormKind::Campaign => FormPayload::Campaign(CampaignFormInput {
                name: self.text("name"),
                description: self.text("description"),
                campaign_type: CampaignType::parse(self.raw("campaign_type")).ok_or_else(
                    || anyhow!("campaign channel {:?} is unknown", self.raw("campaign_type")),
                )?,
                agent_id: self.integer("agent_id")?.map(AgentId::new),
                template: self.text("template"),
                target_audience: self.text("target_audience"),
                status: CampaignStatus::parse(self.raw("status"))
                    .ok_or_else(|| anyhow!("campaign status {:?} is unknown", self.raw("status")))?,
            }),
            FormKind::Client => FormPayload::Client(ClientFormInput {
                first_name: self.text("first_name"),
                last_name: self.text("last_name"),
                email: self.text("email"),
                phone: self.text("phone"),
                identification: self.text("identification"),
                address: self.text("address"),
                employment_status: self.text("employment_status"),
                monthly_income: self.amount("monthly_income")?,
                employment_years: self.integer("employment_years")?,
            }),
            FormKind::Policy => FormPayload::Policy(PolicyFormInput {
                name: self.text("name"),
                description: self.text("description"),
                version: self.text("version"),
                is_active: self.raw("is_active") == "yes",
                base_interest_rate: self.rate("base_interest_rate")?,
                max_loan_amount: self.amount("max_loan_amount")?,
            }),
            FormKind::Review => FormPayload::Review(ReviewFormInput {
                application_id: ApplicationId::new(self.target.map(RecordId::get).unwrap_or(0)),
                status: ReviewDecision::parse(self.raw("status")),
                comments: self.text("comments"),
            }),
        };
        payload.validate()?;
        Ok(payload)
    }

    fn raw(&self, key: &str) -> &str {
        self.specs()
            .iter()
            .position(|spec| spec.key == key)
            .map(|index| self.value(index))
            .unwrap_or("")
    }

    fn text(&self, key: &str) -> String {
        self.raw(key).trim().to_owned()
    }

    fn label(&self, key: &str) -> &'static str {
        self.specs()
            .iter()
            .find(|spec| spec.key == key)
            .map(|spec| spec.label)
            .unwrap_or("field")
    }

    fn integer(&self, key: &str) -> Result<Option<i64>> {
        let raw = self.raw(key).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<i64>().map(Some).map_err(|_| {
            anyhow!(
                "{} must be a whole number, got {raw:?}",
                self.label(key)
            )
        })
    }

    fn amount(&self, key: &str) -> Result<Option<Decimal>> {
        let raw = self.raw(key).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        parse_amount(raw)
            .map(Some)
            .ok_or_else(|| anyhow!("{} must be an amount, got {raw:?}", self.label(key)))
    }

    fn rate(&self, key: &str) -> Result<Option<Decimal>> {
        let raw = self.raw(key).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        parse_rate(raw)
            .map(Some)
            .ok_or_else(|| anyhow!("{} must be a percentage, got {raw:?}", self.label(key)))
    }
}

fn flag_text(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn default_value(kind: FormKind, spec: &FormFieldSpec) -> &'static str {
    match (kind, spec.key) {
        (FormKind::Agent, "agent_type") => "credit_sales",
        (FormKind::Agent, "max_interactions") => "100",
        (FormKind::Agent, "status") => "active",
        (FormKind::Campaign, "campaign_type") => "whatsapp",
        (FormKind::Campaign, "status") => "draft",
        (FormKind::Campaign, "target_audience") => "{}",
        (FormKind::Client, "employment_status") => "employed",
        (FormKind::Policy, "version") => "1.0",
        (FormKind::Policy, "is_active") => "yes",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AgentFormInput, CampaignFormInput, ClientFormInput, FormDraft, FormPayload,
        PolicyFormInput, ReviewFormInput,
    };
    use crate::{
        AgentId, AgentStatus, ApplicationId, CampaignStatus, CampaignType, FormKind, Record,
        ReviewDecision,
    };
    use anyhow::Result;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn valid_client() -> ClientFormInput {
        ClientFormInput {
            first_name: "Lucia".to_owned(),
            last_name: "Reyes".to_owned(),
            email: "lucia@example.com".to_owned(),
            phone: "555-0101".to_owned(),
            identification: "ID-991".to_owned(),
            address: String::new(),
            employment_status: "employed".to_owned(),
            monthly_income: Some(dec!(2500)),
            employment_years: Some(0),
        }
    }

    #[test]
    fn agent_validation_rejects_non_positive_interactions() {
        let payload = FormPayload::Agent(AgentFormInput {
            name: "Sofia".to_owned(),
            description: String::new(),
            agent_type: "credit_sales".to_owned(),
            max_interactions: 0,
            status: AgentStatus::Active,
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn campaign_validation_requires_json_audience() {
        let mut campaign = CampaignFormInput {
            name: "Spring".to_owned(),
            description: String::new(),
            campaign_type: CampaignType::Email,
            agent_id: Some(AgentId::new(2)),
            template: "Hola {{name}}".to_owned(),
            target_audience: "not json".to_owned(),
            status: CampaignStatus::Draft,
        };
        let error = campaign.validate().expect_err("invalid json audience");
        assert!(error.to_string().contains("valid JSON"));

        campaign.target_audience = r#"{"segment":"new"}"#.to_owned();
        assert!(campaign.validate().is_ok());

        campaign.agent_id = None;
        assert!(campaign.validate().is_ok());

        campaign.agent_id = Some(AgentId::new(0));
        assert!(campaign.validate().is_err());
    }

    #[test]
    fn client_validation_checks_email_income_and_years() {
        assert!(valid_client().validate().is_ok());

        let mut client = valid_client();
        client.email = "lucia@localhost".to_owned();
        assert!(client.validate().is_err());

        let mut client = valid_client();
        client.monthly_income = Some(dec!(0));
        assert!(client.validate().is_err());

        let mut client = valid_client();
        client.employment_years = Some(-1);
        assert!(client.validate().is_err());
    }

    #[test]
    fn policy_validation_rejects_negative_rate() {
        let policy = PolicyFormInput {
            name: "Standard".to_owned(),
            description: "Default".to_owned(),
            version: "1.0".to_owned(),
            is_active: true,
            base_interest_rate: Some(dec!(-1)),
            max_loan_amount: None,
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn review_requires_comments() {
        let review = ReviewFormInput {
            application_id: ApplicationId::new(4),
            status: Some(ReviewDecision::Approved),
            comments: "  ".to_owned(),
        };
        assert!(review.validate().is_err());
    }

    #[test]
    fn review_body_carries_status_and_comments_only() -> Result<()> {
        let payload = FormPayload::Review(ReviewFormInput {
            application_id: ApplicationId::new(4),
            status: Some(ReviewDecision::Rejected),
            comments: "income too low".to_owned(),
        });
        assert_eq!(
            payload.to_body()?,
            json!({"status": "rejected", "comments": "income too low"})
        );
        Ok(())
    }

    #[test]
    fn client_body_encodes_amounts_as_numbers() -> Result<()> {
        let body = FormPayload::Client(valid_client()).to_body()?;
        assert_eq!(body["monthly_income"], json!(2500.0));
        assert_eq!(body["employment_years"], json!(0));
        Ok(())
    }

    #[test]
    fn blank_draft_carries_defaults() {
        let draft = FormDraft::blank(FormKind::Campaign);
        assert_eq!(draft.len(), draft.specs().len());
        assert_eq!(draft.value(2), "whatsapp");
        assert_eq!(draft.value(6), "draft");
        assert!(draft.target().is_none());
    }

    #[test]
    fn draft_parses_numbers_and_reports_bad_input() -> Result<()> {
        let mut draft = FormDraft::blank(FormKind::Client);
        for (index, value) in [
            "Lucia",
            "Reyes",
            "lucia@example.com",
            "555-0101",
            "ID-991",
            "",
        ]
        .into_iter()
        .enumerate()
        {
            draft.set_value(index, value);
        }
        draft.set_value(7, "$2,500");
        draft.set_value(8, "three");
        let error = draft.to_payload().expect_err("non-numeric years");
        assert!(error.to_string().contains("years employed must be a whole number"));

        draft.set_value(8, "3");
        let FormPayload::Client(client) = draft.to_payload()? else {
            panic!("client payload expected");
        };
        assert_eq!(client.monthly_income, Some(dec!(2500)));
        assert_eq!(client.employment_years, Some(3));
        Ok(())
    }

    #[test]
    fn draft_from_record_targets_row_and_lowercases_choices() -> Result<()> {
        let record = Record::try_from(json!({
            "id": 12,
            "name": "Camila",
            "agent_type": "customer_support",
            "max_interactions": 40,
            "status": "INACTIVE",
        }))?;
        let draft = FormDraft::from_record(FormKind::Agent, &record);
        assert_eq!(draft.target().map(|id| id.get()), Some(12));
        assert_eq!(draft.value(0), "Camila");
        assert_eq!(draft.value(3), "40");
        assert_eq!(draft.value(4), "inactive");
        assert!(draft.to_payload().is_ok());
        Ok(())
    }

    #[test]
    fn cycle_choice_wraps_and_ignores_text_fields() {
        let mut draft = FormDraft::review(crate::RecordId::new(3));
        assert_eq!(draft.cycle_choice(0, 1), Some("approved"));
        assert_eq!(draft.cycle_choice(0, 1), Some("rejected"));
        assert_eq!(draft.cycle_choice(0, 1), Some("approved"));
        assert_eq!(draft.cycle_choice(1, 1), None);

        let mut policy = FormDraft::blank(FormKind::Policy);
        assert_eq!(policy.cycle_choice(5, 1), Some("no"));
    }
}
