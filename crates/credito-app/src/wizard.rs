// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Multi-step credit-application entry.
//!
//! The wizard owns the raw text the user typed for amount, rate and term and
//! a [`LoanTerms`] that is reparsed on every keystroke, so the payment shown
//! on the review step is the one that gets submitted.

use anyhow::{Context, Result, anyhow, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::loan::{LoanTerms, format_money, parse_amount, parse_rate, parse_term};
use crate::table::{Record, value_as_decimal};
use crate::{ApplicationId, ClientId, ClientSummary, CreditPolicy, LoanPurpose, PolicyId};

pub const MIN_LOAN_AMOUNT: Decimal = dec!(1000);
pub const MAX_TERM_MONTHS: u32 = 60;
pub const MAX_DOCUMENTS: usize = 10;
pub const MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

const DEFAULT_TERM_MONTHS: &str = "12";
const DEFAULT_RATE_PERCENT: &str = "10";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Client,
    LoanDetails,
    Documents,
    Review,
}

impl WizardStep {
    pub const ALL: [Self; 4] = [
        Self::Client,
        Self::LoanDetails,
        Self::Documents,
        Self::Review,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::LoanDetails => "loan details",
            Self::Documents => "documents",
            Self::Review => "review",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|step| *step == self)
            .unwrap_or_default()
    }

    fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(|index| Self::ALL.get(index).copied())
    }
}

/// Free-text inputs on the loan-details step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanField {
    Amount,
    Rate,
    Term,
    Comments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DocumentAttachment {
    pub fn new(name: &str, size: u64, mime: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            bail!("document name is required");
        }
        if size > MAX_DOCUMENT_BYTES {
            bail!(
                "document {name:?} is {size} bytes; the limit is {} MiB",
                MAX_DOCUMENT_BYTES / (1024 * 1024)
            );
        }
        if !ACCEPTED_MIME_TYPES.contains(&mime) {
            bail!(
                "document {name:?} has unsupported type {mime:?} -- attach a PDF, JPEG, PNG or Word file"
            );
        }
        Ok(Self {
            id: None,
            name: name.to_owned(),
            size,
            mime: mime.to_owned(),
            url: None,
        })
    }

    /// Reads size and type from a local file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("read document {}", path.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a file -- choose a regular file", path.display());
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("document path {} has no file name", path.display()))?;
        let mime = mime_for_path(path).ok_or_else(|| {
            anyhow!(
                "document {name:?} has an unsupported extension -- use .pdf, .jpg, .png, .doc or .docx"
            )
        })?;
        Self::new(&name, metadata.len(), mime)
    }
}

const ACCEPTED_MIME_TYPES: [&str; 5] = [
    "application/pdf",
    "image/jpeg",
    "image/png",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "pdf" => ACCEPTED_MIME_TYPES[0],
        "jpg" | "jpeg" => ACCEPTED_MIME_TYPES[1],
        "png" => ACCEPTED_MIME_TYPES[2],
        "doc" => ACCEPTED_MIME_TYPES[3],
        "docx" => ACCEPTED_MIME_TYPES[4],
        _ => return None,
    };
    Some(mime)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub client_id: ClientId,
    #[serde(with = "rust_decimal::serde::float")]
    pub loan_amount: Decimal,
    pub term: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Decimal,
    pub purpose: LoanPurpose,
    pub credit_policy_id: PolicyId,
    pub additional_comments: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_payment: Decimal,
    pub documents: Vec<DocumentAttachment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationWizard {
    step: WizardStep,
    editing: Option<ApplicationId>,
    clients: Vec<ClientSummary>,
    policies: Vec<CreditPolicy>,
    client: Option<ClientId>,
    policy: Option<PolicyId>,
    purpose: Option<LoanPurpose>,
    amount_text: String,
    rate_text: String,
    term_text: String,
    comments: String,
    terms: LoanTerms,
    documents: Vec<DocumentAttachment>,
}

impl ApplicationWizard {
    pub fn new(clients: Vec<ClientSummary>, policies: Vec<CreditPolicy>) -> Self {
        let mut wizard = Self {
            step: WizardStep::Client,
            editing: None,
            clients,
            policies,
            client: None,
            policy: None,
            purpose: None,
            amount_text: String::new(),
            rate_text: DEFAULT_RATE_PERCENT.to_owned(),
            term_text: DEFAULT_TERM_MONTHS.to_owned(),
            comments: String::new(),
            terms: LoanTerms::default(),
            documents: Vec::new(),
        };
        wizard.reparse_terms();
        wizard
    }

    /// Seeds the wizard from an application row so the final submission
    /// updates that application. Accepts both nested (`client.id`) and flat
    /// (`clientId`) references.
    pub fn edit(
        record: &Record,
        clients: Vec<ClientSummary>,
        policies: Vec<CreditPolicy>,
    ) -> Result<Self> {
        let mut wizard = Self::new(clients, policies);
        wizard.editing = Some(ApplicationId::new(record.id().get()));

        if let Some(client_id) = nested_id(record, "client", "clientId") {
            wizard.client = Some(ClientId::new(client_id));
        }
        if let Some(policy_id) = nested_id(record, "creditPolicy", "creditPolicyId") {
            wizard.policy = Some(PolicyId::new(policy_id));
        }
        if let Some(amount) = record.get("loanAmount").and_then(value_as_decimal) {
            wizard.amount_text = amount.normalize().to_string();
        }
        if let Some(rate) = record.get("interestRate").and_then(value_as_decimal) {
            wizard.rate_text = rate.normalize().to_string();
        }
        if let Some(term) = record.get("term").and_then(value_as_decimal) {
            wizard.term_text = term.normalize().to_string();
        }
        wizard.purpose = record.str_field("purpose").and_then(LoanPurpose::parse);
        if let Some(comments) = record.str_field("additionalComments") {
            wizard.comments = comments.to_owned();
        }
        if let Some(documents) = record.get("documents") {
            wizard.documents = serde_json::from_value(documents.clone())
                .context("decode application documents")?;
        }
        wizard.reparse_terms();
        Ok(wizard)
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn editing(&self) -> Option<ApplicationId> {
        self.editing
    }

    pub fn clients(&self) -> &[ClientSummary] {
        &self.clients
    }

    pub fn policies(&self) -> &[CreditPolicy] {
        &self.policies
    }

    pub fn client(&self) -> Option<&ClientSummary> {
        let id = self.client?;
        self.clients.iter().find(|client| client.id == id)
    }

    pub fn policy(&self) -> Option<&CreditPolicy> {
        let id = self.policy?;
        self.policies.iter().find(|policy| policy.id == id)
    }

    pub fn purpose(&self) -> Option<LoanPurpose> {
        self.purpose
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn documents(&self) -> &[DocumentAttachment] {
        &self.documents
    }

    pub fn text(&self, field: LoanField) -> &str {
        match field {
            LoanField::Amount => &self.amount_text,
            LoanField::Rate => &self.rate_text,
            LoanField::Term => &self.term_text,
            LoanField::Comments => &self.comments,
        }
    }

    pub fn set_text(&mut self, field: LoanField, value: &str) {
        let slot = match field {
            LoanField::Amount => &mut self.amount_text,
            LoanField::Rate => &mut self.rate_text,
            LoanField::Term => &mut self.term_text,
            LoanField::Comments => &mut self.comments,
        };
        *slot = value.to_owned();
        self.reparse_terms();
    }

    pub fn push_char(&mut self, field: LoanField, ch: char) {
        let mut value = self.text(field).to_owned();
        value.push(ch);
        self.set_text(field, &value);
    }

    pub fn pop_char(&mut self, field: LoanField) {
        let mut value = self.text(field).to_owned();
        value.pop();
        self.set_text(field, &value);
    }

    pub fn select_client(&mut self, id: ClientId) -> Result<()> {
        if !self.clients.iter().any(|client| client.id == id) {
            bail!("client {id} is not in the loaded client list -- reload and retry");
        }
        self.client = Some(id);
        Ok(())
    }

    /// Moves the client selection by `delta`, wrapping at either end.
    pub fn cycle_client(&mut self, delta: isize) -> Option<&ClientSummary> {
        let ids: Vec<ClientId> = self.clients.iter().map(|client| client.id).collect();
        self.client = cycle_id(&ids, self.client, delta);
        self.client()
    }

    /// Selecting a policy copies its base rate into the rate field.
    pub fn select_policy(&mut self, id: PolicyId) -> Result<()> {
        let rate = self
            .policies
            .iter()
            .find(|policy| policy.id == id)
            .map(|policy| policy.base_interest_rate)
            .ok_or_else(|| anyhow!("credit policy {id} is not available -- reload and retry"))?;
        self.apply_policy(id, rate);
        Ok(())
    }

    pub fn cycle_policy(&mut self, delta: isize) -> Option<&CreditPolicy> {
        let ids: Vec<PolicyId> = self.policies.iter().map(|policy| policy.id).collect();
        let next = cycle_id(&ids, self.policy, delta)
            .and_then(|id| self.policies.iter().find(|policy| policy.id == id))
            .map(|policy| (policy.id, policy.base_interest_rate));
        if let Some((id, rate)) = next {
            self.apply_policy(id, rate);
        }
        self.policy()
    }

    fn apply_policy(&mut self, id: PolicyId, base_rate: Decimal) {
        self.policy = Some(id);
        self.rate_text = base_rate.normalize().to_string();
        self.reparse_terms();
    }

    pub fn set_purpose(&mut self, purpose: Option<LoanPurpose>) {
        self.purpose = purpose;
    }

    pub fn cycle_purpose(&mut self, delta: isize) -> LoanPurpose {
        let current = self
            .purpose
            .and_then(|purpose| LoanPurpose::ALL.iter().position(|p| *p == purpose))
            .map(|index| index as isize)
            .unwrap_or(-1);
        let len = LoanPurpose::ALL.len() as isize;
        let purpose = LoanPurpose::ALL[(current + delta).rem_euclid(len) as usize];
        self.purpose = Some(purpose);
        purpose
    }

    pub fn attach(&mut self, document: DocumentAttachment) -> Result<()> {
        if self.documents.len() >= MAX_DOCUMENTS {
            bail!("at most {MAX_DOCUMENTS} documents can be attached -- remove one first");
        }
        if self.documents.iter().any(|doc| doc.name == document.name) {
            bail!("document {:?} is already attached", document.name);
        }
        self.documents.push(document);
        Ok(())
    }

    pub fn attach_path(&mut self, path: &Path) -> Result<&DocumentAttachment> {
        let document = DocumentAttachment::from_path(path)?;
        self.attach(document)?;
        self.documents
            .last()
            .ok_or_else(|| anyhow!("attachment list is empty after attach"))
    }

    pub fn remove_document(&mut self, index: usize) -> Option<DocumentAttachment> {
        (index < self.documents.len()).then(|| self.documents.remove(index))
    }

    /// Validates the current step and advances. Stays put on the last step.
    pub fn next(&mut self) -> Result<WizardStep> {
        self.validate_step(self.step)?;
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    pub fn validate_step(&self, step: WizardStep) -> Result<()> {
        match step {
            WizardStep::Client => {
                if self.client().is_none() {
                    bail!("select a client to continue");
                }
            }
            WizardStep::LoanDetails => self.validate_loan_details()?,
            WizardStep::Documents => {
                if self.documents.len() > MAX_DOCUMENTS {
                    bail!("at most {MAX_DOCUMENTS} documents can be attached");
                }
            }
            WizardStep::Review => {
                if self.terms.monthly_payment().is_none() {
                    bail!("monthly payment is still being calculated -- check the loan details");
                }
            }
        }
        Ok(())
    }

    /// Validates every step and builds the request body.
    pub fn submission(&self) -> Result<ApplicationSubmission> {
        for step in WizardStep::ALL {
            self.validate_step(step)
                .with_context(|| format!("{} step is incomplete", step.label()))?;
        }
        let missing = || anyhow!("application is incomplete -- review the loan details");
        Ok(ApplicationSubmission {
            client_id: self.client.ok_or_else(missing)?,
            loan_amount: self.terms.principal().ok_or_else(missing)?,
            term: self.terms.term_months().ok_or_else(missing)?,
            interest_rate: self.terms.annual_rate_percent().ok_or_else(missing)?,
            purpose: self.purpose.ok_or_else(missing)?,
            credit_policy_id: self.policy.ok_or_else(missing)?,
            additional_comments: self.comments.trim().to_owned(),
            monthly_payment: self.terms.monthly_payment().ok_or_else(missing)?,
            documents: self.documents.clone(),
        })
    }

    /// One line per reviewed value, in display order.
    pub fn summary_lines(&self) -> Vec<(&'static str, String)> {
        let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_owned());
        vec![
            (
                "client",
                or_dash(self.client().map(ClientSummary::display_name)),
            ),
            ("amount", or_dash(self.terms.principal().map(format_money))),
            (
                "term",
                or_dash(self.terms.term_months().map(|months| {
                    if months == 1 {
                        "1 month".to_owned()
                    } else {
                        format!("{months} months")
                    }
                })),
            ),
            (
                "rate",
                or_dash(
                    self.terms
                        .annual_rate_percent()
                        .map(|rate| format!("{}%", rate.normalize())),
                ),
            ),
            (
                "purpose",
                or_dash(self.purpose.map(|purpose| purpose.label().to_owned())),
            ),
            ("policy", or_dash(self.policy().map(|policy| policy.name.clone()))),
            ("payment", self.terms.payment_label()),
            (
                "total",
                or_dash(self.terms.total_repayment().map(format_money)),
            ),
            ("documents", self.documents.len().to_string()),
        ]
    }

    fn validate_loan_details(&self) -> Result<()> {
        let amount = self
            .terms
            .principal()
            .ok_or_else(|| anyhow!("loan amount is required -- enter an amount of at least $1,000"))?;
        if amount < MIN_LOAN_AMOUNT {
            bail!(
                "loan amount must be at least {}",
                format_money(MIN_LOAN_AMOUNT)
            );
        }
        let term = self
            .terms
            .term_months()
            .ok_or_else(|| anyhow!("term is required -- enter a whole number of months"))?;
        if !(1..=MAX_TERM_MONTHS).contains(&term) {
            bail!("term must be between 1 and {MAX_TERM_MONTHS} months");
        }
        let rate = self
            .terms
            .annual_rate_percent()
            .ok_or_else(|| anyhow!("interest rate is required -- enter a percentage"))?;
        if rate.is_sign_negative() && !rate.is_zero() {
            bail!("interest rate cannot be negative");
        }
        if self.purpose.is_none() {
            bail!("loan purpose is required -- choose a purpose");
        }
        let policy = self
            .policy()
            .ok_or_else(|| anyhow!("credit policy is required -- choose a policy"))?;
        if let Some(max) = policy.max_loan_amount
            && amount > max
        {
            bail!(
                "loan amount {} exceeds the {} policy maximum of {}",
                format_money(amount),
                policy.name,
                format_money(max)
            );
        }
        Ok(())
    }

    fn reparse_terms(&mut self) {
        self.terms = LoanTerms::new(
            parse_amount(&self.amount_text),
            parse_rate(&self.rate_text),
            parse_term(&self.term_text),
        );
    }
}

fn nested_id(record: &Record, nested: &str, flat: &str) -> Option<i64> {
    record
        .get(nested)
        .and_then(|value| value.get("id"))
        .or_else(|| record.get(flat))
        .and_then(|value| match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
}

fn cycle_id<T: Copy + PartialEq>(ids: &[T], current: Option<T>, delta: isize) -> Option<T> {
    if ids.is_empty() {
        return None;
    }
    let position = current
        .and_then(|current| ids.iter().position(|id| *id == current))
        .map(|index| index as isize)
        .unwrap_or(-1);
    let len = ids.len() as isize;
    ids.get((position + delta).rem_euclid(len) as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::{
        ApplicationWizard, DocumentAttachment, LoanField, MAX_DOCUMENTS, WizardStep,
        mime_for_path,
    };
    use crate::{ClientId, ClientSummary, CreditPolicy, LoanPurpose, PolicyId, Record};
    use anyhow::Result;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::path::Path;

    fn clients() -> Vec<ClientSummary> {
        vec![
            ClientSummary {
                id: ClientId::new(1),
                first_name: "Lucia".to_owned(),
                last_name: "Reyes".to_owned(),
                email: "lucia@example.com".to_owned(),
            },
            ClientSummary {
                id: ClientId::new(2),
                first_name: "Mateo".to_owned(),
                last_name: "Vargas".to_owned(),
                email: "mateo@example.com".to_owned(),
            },
        ]
    }

    fn policies() -> Vec<CreditPolicy> {
        vec![CreditPolicy {
            id: PolicyId::new(7),
            name: "Standard".to_owned(),
            description: String::new(),
            version: "1.0".to_owned(),
            is_active: true,
            base_interest_rate: dec!(12.5),
            max_loan_amount: Some(dec!(50000)),
        }]
    }

    fn filled_wizard() -> Result<ApplicationWizard> {
        let mut wizard = ApplicationWizard::new(clients(), policies());
        wizard.select_client(ClientId::new(1))?;
        wizard.next()?;
        wizard.set_text(LoanField::Amount, "10000");
        wizard.select_policy(PolicyId::new(7))?;
        wizard.set_text(LoanField::Rate, "10");
        wizard.set_text(LoanField::Term, "12");
        wizard.set_purpose(Some(LoanPurpose::Vehicle));
        Ok(wizard)
    }

    #[test]
    fn client_step_blocks_until_a_client_is_selected() -> Result<()> {
        let mut wizard = ApplicationWizard::new(clients(), policies());
        assert!(wizard.next().is_err());
        assert_eq!(wizard.step(), WizardStep::Client);

        wizard.cycle_client(1);
        assert_eq!(wizard.next()?, WizardStep::LoanDetails);
        assert_eq!(wizard.back(), WizardStep::Client);
        assert_eq!(wizard.back(), WizardStep::Client);
        Ok(())
    }

    #[test]
    fn selecting_a_policy_prefills_rate_and_payment() -> Result<()> {
        let mut wizard = ApplicationWizard::new(clients(), policies());
        wizard.set_text(LoanField::Amount, "12000");
        wizard.select_policy(PolicyId::new(7))?;
        assert_eq!(wizard.text(LoanField::Rate), "12.5");
        assert_eq!(wizard.terms().annual_rate_percent(), Some(dec!(12.5)));
        assert!(wizard.terms().monthly_payment().is_some());
        assert!(wizard.select_policy(PolicyId::new(99)).is_err());
        Ok(())
    }

    #[test]
    fn cycling_policies_prefills_each_rate() {
        let mut extra = policies();
        let premium = CreditPolicy {
            id: PolicyId::new(9),
            name: "Premium".to_owned(),
            base_interest_rate: dec!(8),
            ..extra[0].clone()
        };
        extra.push(premium);
        let mut wizard = ApplicationWizard::new(clients(), extra);
        wizard.set_text(LoanField::Rate, "30");

        assert_eq!(wizard.cycle_policy(1).map(|policy| policy.id), Some(PolicyId::new(7)));
        assert_eq!(wizard.text(LoanField::Rate), "12.5");
        assert_eq!(wizard.cycle_policy(1).map(|policy| policy.id), Some(PolicyId::new(9)));
        assert_eq!(wizard.text(LoanField::Rate), "8");
        assert_eq!(wizard.cycle_policy(-1).map(|policy| policy.id), Some(PolicyId::new(7)));
        assert_eq!(wizard.terms().annual_rate_percent(), Some(dec!(12.5)));

        let mut empty = ApplicationWizard::new(clients(), Vec::new());
        empty.set_text(LoanField::Rate, "30");
        assert!(empty.cycle_policy(1).is_none());
        assert_eq!(empty.text(LoanField::Rate), "30");
    }

    #[test]
    fn typing_recomputes_payment_each_keystroke() {
        let mut wizard = ApplicationWizard::new(clients(), policies());
        wizard.set_text(LoanField::Rate, "10");
        for ch in "10000".chars() {
            wizard.push_char(LoanField::Amount, ch);
        }
        assert_eq!(wizard.terms().monthly_payment(), Some(dec!(879.16)));

        wizard.set_text(LoanField::Term, "");
        assert_eq!(wizard.terms().monthly_payment(), None);
        assert_eq!(wizard.terms().payment_label(), "calculating...");

        wizard.push_char(LoanField::Term, '6');
        wizard.pop_char(LoanField::Term);
        wizard.push_char(LoanField::Term, '1');
        wizard.push_char(LoanField::Term, '2');
        assert_eq!(wizard.terms().monthly_payment(), Some(dec!(879.16)));
    }

    #[test]
    fn loan_details_enforce_bounds_and_policy_maximum() -> Result<()> {
        let mut wizard = filled_wizard()?;
        wizard.validate_step(WizardStep::LoanDetails)?;

        wizard.set_text(LoanField::Amount, "999");
        assert!(wizard.next().is_err());

        wizard.set_text(LoanField::Amount, "60000");
        let error = wizard.next().expect_err("above policy maximum");
        assert!(error.to_string().contains("policy maximum"));

        wizard.set_text(LoanField::Amount, "10000");
        wizard.set_text(LoanField::Term, "61");
        assert!(wizard.next().is_err());
        wizard.set_text(LoanField::Term, "1.5");
        assert!(wizard.next().is_err());

        wizard.set_text(LoanField::Term, "12");
        wizard.set_purpose(None);
        assert!(wizard.next().is_err());
        Ok(())
    }

    #[test]
    fn explicit_zero_rate_is_accepted() -> Result<()> {
        let mut wizard = filled_wizard()?;
        wizard.set_text(LoanField::Rate, "0");
        assert_eq!(wizard.next()?, WizardStep::Documents);
        assert_eq!(wizard.terms().monthly_payment(), Some(dec!(833.33)));
        Ok(())
    }

    #[test]
    fn submission_is_camel_case_with_payment() -> Result<()> {
        let mut wizard = filled_wizard()?;
        wizard.set_text(LoanField::Comments, " first loan ");
        wizard.attach(DocumentAttachment::new("id.pdf", 2048, "application/pdf")?)?;
        let body = serde_json::to_value(wizard.submission()?)?;
        assert_eq!(
            body,
            json!({
                "clientId": 1,
                "loanAmount": 10000.0,
                "term": 12,
                "interestRate": 10.0,
                "purpose": "vehicle",
                "creditPolicyId": 7,
                "additionalComments": "first loan",
                "monthlyPayment": 879.16,
                "documents": [{"name": "id.pdf", "size": 2048, "type": "application/pdf"}],
            })
        );
        Ok(())
    }

    #[test]
    fn submission_refuses_incomplete_terms() -> Result<()> {
        let mut wizard = filled_wizard()?;
        wizard.set_text(LoanField::Term, "");
        assert!(wizard.submission().is_err());
        Ok(())
    }

    #[test]
    fn document_limits_are_enforced() -> Result<()> {
        assert!(DocumentAttachment::new("big.pdf", 6 * 1024 * 1024, "application/pdf").is_err());
        assert!(DocumentAttachment::new("song.mp3", 10, "audio/mpeg").is_err());

        let mut wizard = ApplicationWizard::new(clients(), policies());
        for index in 0..MAX_DOCUMENTS {
            wizard.attach(DocumentAttachment::new(
                &format!("page-{index}.png"),
                10,
                "image/png",
            )?)?;
        }
        assert!(
            wizard
                .attach(DocumentAttachment::new("extra.png", 10, "image/png")?)
                .is_err()
        );
        assert!(wizard.remove_document(0).is_some());
        assert!(wizard.remove_document(MAX_DOCUMENTS).is_none());
        Ok(())
    }

    #[test]
    fn attach_path_reads_size_and_type() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("Payslip.PDF");
        std::fs::write(&path, b"%PDF-1.4")?;

        let mut wizard = ApplicationWizard::new(clients(), policies());
        let document = wizard.attach_path(&path)?;
        assert_eq!(document.name, "Payslip.PDF");
        assert_eq!(document.size, 8);
        assert_eq!(document.mime, "application/pdf");

        assert!(wizard.attach_path(&dir.path().join("missing.pdf")).is_err());
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        Ok(())
    }

    #[test]
    fn edit_mode_seeds_from_record() -> Result<()> {
        let record = Record::try_from(json!({
            "id": 31,
            "client": {"id": 2, "firstName": "Mateo", "lastName": "Vargas"},
            "loanAmount": 15000,
            "term": 24,
            "interestRate": 9.5,
            "purpose": "education",
            "creditPolicyId": 7,
            "additionalComments": "renewal",
            "documents": [{"id": 4, "name": "id.png", "size": 100, "type": "image/png", "url": "/files/4"}],
        }))?;
        let wizard = ApplicationWizard::edit(&record, clients(), policies())?;
        assert_eq!(wizard.editing().map(|id| id.get()), Some(31));
        assert_eq!(wizard.client().map(|client| client.id), Some(ClientId::new(2)));
        assert_eq!(wizard.text(LoanField::Rate), "9.5");
        assert_eq!(wizard.purpose(), Some(LoanPurpose::Education));
        assert_eq!(wizard.documents().len(), 1);

        let submission = wizard.submission()?;
        assert_eq!(submission.term, 24);
        assert_eq!(submission.credit_policy_id, PolicyId::new(7));
        Ok(())
    }

    #[test]
    fn summary_lists_payment_and_total() -> Result<()> {
        let wizard = filled_wizard()?;
        let lines = wizard.summary_lines();
        assert!(lines.contains(&("payment", "$879.16".to_owned())));
        assert!(lines.contains(&("total", "$10,549.92".to_owned())));
        assert!(lines.contains(&("term", "12 months".to_owned())));
        Ok(())
    }
}
