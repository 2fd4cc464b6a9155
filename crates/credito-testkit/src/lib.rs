// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use credito_app::{
    AgentStatus, ApplicationStatus, CampaignStatus, CampaignType, ClientSummary, CreditPolicy,
    EMPLOYMENT_STATUSES, LoanPurpose, PolicyId, Record, RecordId, compute_monthly_payment,
    decimal_to_f64,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const FIRST_NAMES: [&str; 16] = [
    "Lucia", "Mateo", "Valentina", "Santiago", "Camila", "Diego", "Isabella", "Sebastian",
    "Sofia", "Nicolas", "Mariana", "Andres", "Gabriela", "Tomas", "Daniela", "Emilio",
];
const LAST_NAMES: [&str; 18] = [
    "Garcia", "Rodriguez", "Martinez", "Lopez", "Gonzalez", "Perez", "Sanchez", "Ramirez",
    "Torres", "Flores", "Rivera", "Gomez", "Diaz", "Reyes", "Morales", "Ortiz", "Castillo",
    "Vargas",
];
const CITIES: [&str; 10] = [
    "Bogota",
    "Medellin",
    "Cali",
    "Quito",
    "Lima",
    "Santiago",
    "Monterrey",
    "Guadalajara",
    "Cordoba",
    "Montevideo",
];
const STREET_NAMES: [&str; 12] = [
    "Bolivar",
    "Sucre",
    "Libertad",
    "Independencia",
    "Central",
    "Jardines",
    "Alameda",
    "Los Andes",
    "Del Rio",
    "San Martin",
    "Colon",
    "Miraflores",
];
const AGENT_PERSONAS: [&str; 8] = [
    "Aurora", "Brisa", "Cielo", "Delta", "Eco", "Faro", "Lumen", "Nova",
];
const CAMPAIGN_THEMES: [&str; 10] = [
    "Spring Rates",
    "Back to School",
    "Home Upgrade",
    "Debt Relief",
    "Small Business",
    "New Car",
    "Holiday Bonus",
    "Loyalty Renewal",
    "Student Starter",
    "Refinance Week",
];
const EMAIL_DOMAINS: [&str; 4] = ["example.com", "correo.test", "mail.test", "crm.test"];
const COMMENTS: [&str; 6] = [
    "Client prefers contact by WhatsApp.",
    "Payslips for the last three months attached.",
    "Renewal of a previous loan.",
    "Co-signer available if needed.",
    "Requested a quick decision.",
    "",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// A consistent set of rows: campaigns point at generated agents and
/// applications at generated clients and policies.
#[derive(Debug, Clone, PartialEq)]
pub struct CrmDataset {
    pub agents: Vec<Record>,
    pub campaigns: Vec<Record>,
    pub clients: Vec<Record>,
    pub applications: Vec<Record>,
    pub policies: Vec<CreditPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSize {
    pub agents: usize,
    pub campaigns: usize,
    pub clients: usize,
    pub applications: usize,
    pub policies: usize,
}

impl Default for DatasetSize {
    fn default() -> Self {
        Self {
            agents: 6,
            campaigns: 8,
            clients: 24,
            applications: 36,
            policies: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrmFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl CrmFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn policy(&mut self, id: i64) -> CreditPolicy {
        const TIERS: [(&str, i64, i64); 4] = [
            ("Standard", 125, 50_000),
            ("Preferred", 95, 100_000),
            ("Starter", 180, 10_000),
            ("Business", 110, 250_000),
        ];
        let (name, rate_tenths, max) = TIERS[(id.unsigned_abs() as usize + TIERS.len() - 1) % TIERS.len()];
        CreditPolicy {
            id: PolicyId::new(id),
            name: name.to_owned(),
            description: format!("{name} consumer credit terms"),
            version: format!("1.{}", self.int_range_i64(0, 4)),
            is_active: self.int_n(5) != 0,
            base_interest_rate: Decimal::new(rate_tenths, 1),
            max_loan_amount: Some(Decimal::from(max)),
        }
    }

    pub fn agent(&mut self, id: i64) -> Record {
        let status = AgentStatus::ALL[self.int_n(AgentStatus::ALL.len())];
        let agent_type = if self.int_n(4) == 0 {
            "customer_support"
        } else {
            "credit_sales"
        };
        let max = self.int_range_i64(5, 40) * 10;
        Record::new(RecordId::new(id))
            .with("name", format!("{} {}", self.pick(&AGENT_PERSONAS), id))
            .with("description", format!("Virtual {} agent", agent_type.replace('_', " ")))
            .with("agent_type", agent_type)
            .with("status", status.as_str())
            .with("max_interactions", max)
            .with("interactions_count", self.int_range_i64(0, max))
            .with("created_at", self.timestamp_within_days(365))
    }

    pub fn campaign(&mut self, id: i64, agent: Option<&Record>) -> Record {
        const STATUSES: [CampaignStatus; 5] = [
            CampaignStatus::Draft,
            CampaignStatus::Scheduled,
            CampaignStatus::Active,
            CampaignStatus::Completed,
            CampaignStatus::Cancelled,
        ];
        let kind = CampaignType::ALL[self.int_n(CampaignType::ALL.len())];
        let status = STATUSES[self.int_n(STATUSES.len())];
        let agent_ref = agent.map_or(Value::Null, |agent| {
            json!({
                "id": agent.id().get(),
                "name": agent.str_field("name").unwrap_or_default(),
            })
        });
        let scheduled = if status == CampaignStatus::Draft {
            Value::Null
        } else {
            Value::from(self.timestamp_within_days(90))
        };
        let interactions = if matches!(status, CampaignStatus::Draft | CampaignStatus::Scheduled) {
            0
        } else {
            self.int_range_i64(10, 900)
        };
        Record::new(RecordId::new(id))
            .with("name", self.pick(&CAMPAIGN_THEMES))
            .with("description", format!("{} outreach", kind.as_str()))
            .with("campaign_type", kind.as_str())
            .with("status", status.as_str())
            .with("agent_id", agent.map_or(Value::Null, |agent| Value::from(agent.id().get())))
            .with("agent", agent_ref)
            .with("template", "Hola {{first_name}}, tenemos una oferta para ti.")
            .with("target_audience", r#"{"segment":"prequalified"}"#)
            .with("scheduled_at", scheduled)
            .with("interactions_count", interactions)
    }

    pub fn client(&mut self, id: i64) -> Record {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let domain = self.pick(&EMAIL_DOMAINS);
        let income = Decimal::from(self.int_range_i64(8, 120) * 100);
        Record::new(RecordId::new(id))
            .with("first_name", first)
            .with("last_name", last)
            .with(
                "email",
                format!("{}.{}{id}@{domain}", first.to_lowercase(), last.to_lowercase()),
            )
            .with("phone", format!("+57 3{:02} {:07}", self.int_range_i64(0, 99), self.int_range_i64(0, 9_999_999)))
            .with("identification", format!("CC-{:08}", self.int_range_i64(1_000_000, 99_999_999)))
            .with(
                "address",
                format!(
                    "Calle {} #{}, {}",
                    self.pick(&STREET_NAMES),
                    self.int_range_i64(1, 199),
                    self.pick(&CITIES)
                ),
            )
            .with("employment_status", self.pick(&EMPLOYMENT_STATUSES))
            .with("monthly_income", decimal_to_f64(income))
            .with("employment_years", self.int_range_i64(0, 25))
            .with("created_at", self.timestamp_within_days(720))
    }

    /// Builds an application consistent with `client` and `policy`: the
    /// amount respects the policy maximum and the payment matches the terms.
    pub fn application(&mut self, id: i64, client: &Record, policy: &CreditPolicy) -> Record {
        const TERMS: [u32; 6] = [6, 12, 18, 24, 36, 48];
        let ceiling = policy
            .max_loan_amount
            .map(|max| decimal_to_f64(max) as i64)
            .unwrap_or(50_000)
            .max(1_000);
        let amount = Decimal::from(self.int_range_i64(2, ceiling / 500) * 500);
        let term = TERMS[self.int_n(TERMS.len())];
        let rate = policy.base_interest_rate;
        let payment = compute_monthly_payment(Some(amount), Some(rate), Some(term));
        let status = ApplicationStatus::ALL[self.int_n(ApplicationStatus::ALL.len())];
        let purpose = LoanPurpose::ALL[self.int_n(LoanPurpose::ALL.len())];
        let client_ref = json!({
            "id": client.id().get(),
            "firstName": client.str_field("first_name").unwrap_or_default(),
            "lastName": client.str_field("last_name").unwrap_or_default(),
            "email": client.str_field("email").unwrap_or_default(),
        });
        Record::new(RecordId::new(id))
            .with("client", client_ref)
            .with("clientId", client.id().get())
            .with("loanAmount", decimal_to_f64(amount))
            .with("term", term)
            .with("interestRate", decimal_to_f64(rate))
            .with("purpose", purpose.as_str())
            .with("status", status.as_str())
            .with("creditPolicyId", policy.id.get())
            .with("creditPolicy", json!({"id": policy.id.get(), "name": policy.name}))
            .with("monthlyPayment", payment.map_or(Value::Null, |p| Value::from(decimal_to_f64(p))))
            .with("additionalComments", self.pick(&COMMENTS))
            .with("documents", json!([]))
            .with("createdAt", self.timestamp_within_days(180))
    }

    pub fn dataset(&mut self, size: DatasetSize) -> CrmDataset {
        let policies: Vec<CreditPolicy> =
            (1..=size.policies as i64).map(|id| self.policy(id)).collect();
        let agents: Vec<Record> = (1..=size.agents as i64).map(|id| self.agent(id)).collect();
        let campaigns = (1..=size.campaigns as i64)
            .map(|id| {
                let agent = (!agents.is_empty()).then(|| &agents[self.int_n(agents.len())]);
                self.campaign(id, agent)
            })
            .collect();
        let clients: Vec<Record> = (1..=size.clients as i64).map(|id| self.client(id)).collect();
        let applications = if clients.is_empty() || policies.is_empty() {
            Vec::new()
        } else {
            (1..=size.applications as i64)
                .map(|id| {
                    let client = &clients[self.int_n(clients.len())];
                    let policy = &policies[self.int_n(policies.len())];
                    self.application(id, client, policy)
                })
                .collect()
        };
        CrmDataset {
            agents,
            campaigns,
            clients,
            applications,
            policies,
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn timestamp_within_days(&mut self, days: i64) -> String {
        let offset = Duration::seconds(self.int_range_i64(0, days * 86_400));
        (reference_now() - offset)
            .format(&Rfc3339)
            .unwrap_or_else(|_| fixture_datetime().to_owned())
    }
}

/// Client rows reduced to what the application wizard's picker needs.
pub fn client_summaries(clients: &[Record]) -> Vec<ClientSummary> {
    clients
        .iter()
        .map(|client| ClientSummary {
            id: client.id().get().into(),
            first_name: client.str_field("first_name").unwrap_or_default().to_owned(),
            last_name: client.str_field("last_name").unwrap_or_default().to_owned(),
            email: client.str_field("email").unwrap_or_default().to_owned(),
        })
        .collect()
}

/// Policies in the row shape the list tab renders.
pub fn policy_record(policy: &CreditPolicy) -> Record {
    Record::new(RecordId::new(policy.id.get()))
        .with("name", policy.name.as_str())
        .with("description", policy.description.as_str())
        .with("version", policy.version.as_str())
        .with("is_active", policy.is_active)
        .with("base_interest_rate", decimal_to_f64(policy.base_interest_rate))
        .with(
            "max_loan_amount",
            policy
                .max_loan_amount
                .map_or(Value::Null, |max| Value::from(decimal_to_f64(max))),
        )
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-01-15T09:30:00Z"
}

fn reference_now() -> OffsetDateTime {
    let date = Date::from_calendar_date(2026, Month::January, 15).unwrap_or(Date::MIN);
    date.with_time(Time::MIDNIGHT).assume_utc() + Duration::hours(9)
}
