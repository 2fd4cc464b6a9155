// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use credito_api::Client;
use credito_app::{
    AgentStatus, ApplicationId, ApplicationStatus, ApplicationSubmission, CampaignStatus, ClientId,
    ClientSummary, CreditPolicy, CurrentUser, Dashboard, FormPayload, LifecycleAction, PolicyId,
    Record, RecordId, ReviewDecision, SessionError, StatusFilter, TabKind, UserId,
};
use credito_testkit::{CrmDataset, CrmFaker, DatasetSize, client_summaries, policy_record};
use credito_tui::AppRuntime;
use rust_decimal::Decimal;
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};

pub const DEMO_SEED: u64 = 20_260_115;

/// Talks to the CRM backend over HTTP.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for ApiRuntime {
    fn load_records(&mut self, tab: TabKind, filter: StatusFilter) -> Result<Vec<Record>> {
        self.client.list(tab, filter)
    }

    fn load_clients(&mut self) -> Result<Vec<ClientSummary>> {
        self.client.list_clients()
    }

    fn load_policies(&mut self) -> Result<Vec<CreditPolicy>> {
        self.client.list_policies()
    }

    fn submit_form(
        &mut self,
        tab: TabKind,
        target: Option<RecordId>,
        payload: &FormPayload,
    ) -> Result<()> {
        payload.validate()?;
        let body = payload.to_body()?;
        match (payload, target) {
            (FormPayload::Review(review), _) => {
                self.client.review(review.application_id, &body)?;
            }
            (_, Some(id)) => {
                self.client.update(tab, id, &body)?;
            }
            (_, None) => {
                self.client.create(tab, &body)?;
            }
        }
        info!(tab = tab.label(), form = payload.kind().label(), "form saved");
        Ok(())
    }

    fn submit_application(
        &mut self,
        submission: &ApplicationSubmission,
        editing: Option<ApplicationId>,
    ) -> Result<()> {
        let saved = self.client.submit_application(submission, editing)?;
        info!(application = %saved.id(), "application saved");
        Ok(())
    }

    fn delete_record(&mut self, tab: TabKind, id: RecordId) -> Result<()> {
        self.client.delete(tab, id)
    }

    fn apply_lifecycle(
        &mut self,
        tab: TabKind,
        id: RecordId,
        action: LifecycleAction,
    ) -> Result<()> {
        self.client.lifecycle(tab, id, action)
    }

    fn load_record(&mut self, tab: TabKind, id: RecordId) -> Result<Record> {
        self.client.get(tab, id)
    }

    fn load_client_applications(&mut self, client: ClientId) -> Result<Vec<Record>> {
        self.client.client_applications(client)
    }

    fn load_dashboard(&mut self) -> Result<Dashboard> {
        self.client.dashboard()
    }

    fn login(&mut self, username: &str, password: &str) -> Result<CurrentUser> {
        self.client.login(username, password)
    }

    fn logout(&mut self) {
        self.client.logout();
    }

    fn signed_in_user(&mut self) -> Option<CurrentUser> {
        let session = self.client.session();
        if !session.is_authenticated() {
            return None;
        }
        session.user().cloned()
    }
}

/// In-memory CRM seeded from the deterministic faker. Mirrors the server's
/// status rules closely enough to exercise every console flow offline.
pub struct DemoRuntime {
    data: CrmDataset,
    user: CurrentUser,
    signed_in: bool,
}

impl DemoRuntime {
    pub fn new(seed: u64) -> Self {
        let data = CrmFaker::new(seed).dataset(DatasetSize::default());
        Self {
            data,
            user: CurrentUser {
                id: UserId::new(1),
                username: "demo".to_owned(),
                email: "demo@credito.local".to_owned(),
                full_name: Some("Demo Admin".to_owned()),
                is_admin: true,
            },
            signed_in: true,
        }
    }

    fn require_session(&self) -> Result<()> {
        if !self.signed_in {
            return Err(SessionError::SignedOut.into());
        }
        Ok(())
    }

    fn records(&self, tab: TabKind) -> Result<&Vec<Record>> {
        match tab {
            TabKind::Agents => Ok(&self.data.agents),
            TabKind::Campaigns => Ok(&self.data.campaigns),
            TabKind::Clients => Ok(&self.data.clients),
            TabKind::Applications => Ok(&self.data.applications),
            TabKind::Policies => bail!("credit policies are not stored as rows"),
        }
    }

    fn records_mut(&mut self, tab: TabKind) -> Result<&mut Vec<Record>> {
        match tab {
            TabKind::Agents => Ok(&mut self.data.agents),
            TabKind::Campaigns => Ok(&mut self.data.campaigns),
            TabKind::Clients => Ok(&mut self.data.clients),
            TabKind::Applications => Ok(&mut self.data.applications),
            TabKind::Policies => bail!("credit policies are not stored as rows"),
        }
    }

    fn find_mut(&mut self, tab: TabKind, id: RecordId) -> Result<&mut Record> {
        self.records_mut(tab)?
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| anyhow!("{} {id} not found -- reload and retry", tab.noun()))
    }

    fn next_id(&self, tab: TabKind) -> Result<RecordId> {
        let max = match tab {
            TabKind::Policies => self.data.policies.iter().map(|policy| policy.id.get()).max(),
            _ => self.records(tab)?.iter().map(|record| record.id().get()).max(),
        };
        Ok(RecordId::new(max.unwrap_or(0) + 1))
    }

    fn agent_ref(&self, agent_id: Option<&Value>) -> Value {
        let Some(id) = agent_id.and_then(Value::as_i64) else {
            return Value::Null;
        };
        let name = self
            .data
            .agents
            .iter()
            .find(|agent| agent.id().get() == id)
            .and_then(|agent| agent.str_field("name"))
            .unwrap_or_default();
        json!({"id": id, "name": name})
    }

    fn upsert(
        &mut self,
        tab: TabKind,
        target: Option<RecordId>,
        mut fields: Map<String, Value>,
    ) -> Result<RecordId> {
        let created_at_key = if tab == TabKind::Applications {
            "createdAt"
        } else {
            "created_at"
        };
        match target {
            Some(id) => {
                let record = self.find_mut(tab, id)?;
                for (key, value) in fields {
                    record.set(&key, value);
                }
                Ok(id)
            }
            None => {
                let id = self.next_id(tab)?;
                fields.insert(created_at_key.to_owned(), Value::from(now_rfc3339()?));
                let mut record = Record::new(id);
                for (key, value) in fields {
                    record.set(&key, value);
                }
                self.records_mut(tab)?.push(record);
                Ok(id)
            }
        }
    }

    fn save_policy(&mut self, target: Option<RecordId>, payload: &FormPayload) -> Result<()> {
        let FormPayload::Policy(form) = payload else {
            bail!("policy tab expects a policy form");
        };
        let id = match target {
            Some(id) => PolicyId::new(id.get()),
            None => PolicyId::new(self.next_id(TabKind::Policies)?.get()),
        };
        let policy = CreditPolicy {
            id,
            name: form.name.trim().to_owned(),
            description: form.description.trim().to_owned(),
            version: form.version.trim().to_owned(),
            is_active: form.is_active,
            base_interest_rate: form.base_interest_rate.unwrap_or(Decimal::ZERO),
            max_loan_amount: form.max_loan_amount,
        };
        match self.data.policies.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => *existing = policy,
            None if target.is_some() => bail!("policy {id} not found -- reload and retry"),
            None => self.data.policies.push(policy),
        }
        Ok(())
    }

    fn review(&mut self, payload: &FormPayload) -> Result<()> {
        let FormPayload::Review(review) = payload else {
            bail!("review expects a review form");
        };
        let decision = review
            .status
            .ok_or_else(|| anyhow!("review decision is required"))?;
        let id = RecordId::new(review.application_id.get());
        let reviewer = self.user.username.clone();
        let now = now_rfc3339()?;
        let comments = review.comments.trim();
        let record = self.find_mut(TabKind::Applications, id)?;
        let reviewable = record
            .str_field("status")
            .and_then(ApplicationStatus::parse)
            .is_some_and(ApplicationStatus::is_reviewable);
        if !reviewable {
            bail!("application {id} has already been reviewed");
        }
        record.set("status", Value::from(decision.as_str()));
        record.set("reviewComments", Value::from(comments));
        record.set("reviewedAt", Value::from(now.as_str()));
        record.set("reviewedBy", Value::from(reviewer.as_str()));
        match decision {
            ReviewDecision::Approved => record.set(
                "approvalDetails",
                json!({"date": now, "approvedBy": reviewer, "comments": comments}),
            ),
            ReviewDecision::Rejected => record.set(
                "rejectionDetails",
                json!({
                    "date": now,
                    "rejectedBy": reviewer,
                    "reason": comments,
                    "comments": comments,
                }),
            ),
        }
        let action = format!("Application {}", decision.as_str());
        push_activity(record, &action, comments, &now, &reviewer);
        Ok(())
    }
}

impl AppRuntime for DemoRuntime {
    fn load_records(&mut self, tab: TabKind, filter: StatusFilter) -> Result<Vec<Record>> {
        self.require_session()?;
        let rows: Vec<Record> = match tab {
            TabKind::Policies => self.data.policies.iter().map(policy_record).collect(),
            TabKind::Applications => self
                .data
                .applications
                .iter()
                .filter(|record| match filter.query_value() {
                    Some(status) => record.str_field("status") == Some(status),
                    None => true,
                })
                .cloned()
                .collect(),
            _ => self.records(tab)?.clone(),
        };
        debug!(tab = tab.label(), count = rows.len(), "demo rows loaded");
        Ok(rows)
    }

    fn load_clients(&mut self) -> Result<Vec<ClientSummary>> {
        self.require_session()?;
        Ok(client_summaries(&self.data.clients))
    }

    fn load_policies(&mut self) -> Result<Vec<CreditPolicy>> {
        self.require_session()?;
        Ok(self.data.policies.clone())
    }

    fn submit_form(
        &mut self,
        tab: TabKind,
        target: Option<RecordId>,
        payload: &FormPayload,
    ) -> Result<()> {
        self.require_session()?;
        payload.validate()?;
        match payload {
            FormPayload::Review(_) => self.review(payload)?,
            FormPayload::Policy(_) => self.save_policy(target, payload)?,
            _ => {
                let Value::Object(mut fields) = payload.to_body()? else {
                    bail!("{} form did not encode as an object", payload.kind().label());
                };
                if tab == TabKind::Campaigns {
                    let agent = self.agent_ref(fields.get("agent_id"));
                    fields.insert("agent".to_owned(), agent);
                }
                let id = self.upsert(tab, target, fields)?;
                debug!(tab = tab.label(), %id, "demo row saved");
            }
        }
        Ok(())
    }

    fn submit_application(
        &mut self,
        submission: &ApplicationSubmission,
        editing: Option<ApplicationId>,
    ) -> Result<()> {
        self.require_session()?;
        let client = self
            .data
            .clients
            .iter()
            .find(|client| client.id().get() == submission.client_id.get())
            .ok_or_else(|| anyhow!("client {} not found -- reload and retry", submission.client_id))?;
        let client_ref = json!({
            "id": client.id().get(),
            "firstName": client.str_field("first_name").unwrap_or_default(),
            "lastName": client.str_field("last_name").unwrap_or_default(),
            "email": client.str_field("email").unwrap_or_default(),
        });
        let policy = self
            .data
            .policies
            .iter()
            .find(|policy| policy.id == submission.credit_policy_id)
            .ok_or_else(|| {
                anyhow!(
                    "credit policy {} not found -- reload and retry",
                    submission.credit_policy_id
                )
            })?;
        let policy_ref = json!({"id": policy.id.get(), "name": policy.name});

        let Value::Object(mut fields) =
            serde_json::to_value(submission).context("encode application")?
        else {
            bail!("application did not encode as an object");
        };
        fields.insert("client".to_owned(), client_ref);
        fields.insert("creditPolicy".to_owned(), policy_ref);
        let target = match editing {
            Some(id) => Some(RecordId::new(id.get())),
            None => {
                fields.insert(
                    "status".to_owned(),
                    Value::from(ApplicationStatus::Pending.as_str()),
                );
                fields.insert(
                    "activityHistory".to_owned(),
                    json!([{
                        "action": "Application created",
                        "timestamp": now_rfc3339()?,
                        "user": self.user.username,
                    }]),
                );
                None
            }
        };
        let id = self.upsert(TabKind::Applications, target, fields)?;
        info!(application = %id, "demo application saved");
        Ok(())
    }

    fn delete_record(&mut self, tab: TabKind, id: RecordId) -> Result<()> {
        self.require_session()?;
        let removed = match tab {
            TabKind::Policies => {
                let before = self.data.policies.len();
                self.data.policies.retain(|policy| policy.id.get() != id.get());
                before - self.data.policies.len()
            }
            _ => {
                let records = self.records_mut(tab)?;
                let before = records.len();
                records.retain(|record| record.id() != id);
                before - records.len()
            }
        };
        if removed == 0 {
            bail!("{} {id} not found -- reload and retry", tab.noun());
        }
        Ok(())
    }

    fn apply_lifecycle(
        &mut self,
        tab: TabKind,
        id: RecordId,
        action: LifecycleAction,
    ) -> Result<()> {
        self.require_session()?;
        match (tab, action) {
            (TabKind::Agents, LifecycleAction::Activate | LifecycleAction::Deactivate) => {
                let status = if action == LifecycleAction::Activate {
                    AgentStatus::Active
                } else {
                    AgentStatus::Inactive
                };
                self.find_mut(tab, id)?
                    .set("status", Value::from(status.as_str()));
            }
            (TabKind::Campaigns, LifecycleAction::Start | LifecycleAction::Stop) => {
                let record = self.find_mut(tab, id)?;
                let current = record
                    .str_field("status")
                    .and_then(CampaignStatus::parse)
                    .ok_or_else(|| anyhow!("campaign {id} has no known status"))?;
                let next = if action == LifecycleAction::Start {
                    if !current.can_start() {
                        bail!("only scheduled, draft or paused campaigns can be started");
                    }
                    CampaignStatus::Active
                } else {
                    if !current.can_stop() {
                        bail!("only running campaigns can be stopped");
                    }
                    CampaignStatus::Cancelled
                };
                record.set("status", Value::from(next.as_str()));
            }
            (TabKind::Policies, LifecycleAction::Activate | LifecycleAction::Deactivate) => {
                let policy = self
                    .data
                    .policies
                    .iter_mut()
                    .find(|policy| policy.id.get() == id.get())
                    .ok_or_else(|| anyhow!("policy {id} not found -- reload and retry"))?;
                policy.is_active = action == LifecycleAction::Activate;
            }
            _ => bail!(
                "{} {} is not supported",
                tab.noun(),
                action.path_segment()
            ),
        }
        Ok(())
    }

    fn login(&mut self, username: &str, password: &str) -> Result<CurrentUser> {
        if username.trim().is_empty() {
            bail!("username is required -- enter any name in demo mode");
        }
        if password.is_empty() {
            bail!("password is required -- enter any password in demo mode");
        }
        self.user.username = username.trim().to_owned();
        self.user.full_name = None;
        self.signed_in = true;
        info!(username = %self.user.username, "demo sign-in");
        Ok(self.user.clone())
    }

    fn load_record(&mut self, tab: TabKind, id: RecordId) -> Result<Record> {
        self.require_session()?;
        let found = match tab {
            TabKind::Policies => self
                .data
                .policies
                .iter()
                .find(|policy| policy.id.get() == id.get())
                .map(policy_record),
            _ => self.records(tab)?.iter().find(|record| record.id() == id).cloned(),
        };
        found.ok_or_else(|| anyhow!("{} {id} not found -- reload and retry", tab.noun()))
    }

    fn load_client_applications(&mut self, client: ClientId) -> Result<Vec<Record>> {
        self.require_session()?;
        let owner = |record: &Record| {
            record
                .get("clientId")
                .or_else(|| record.get("client").and_then(|value| value.get("id")))
                .and_then(Value::as_i64)
        };
        Ok(self
            .data
            .applications
            .iter()
            .filter(|record| owner(record) == Some(client.get()))
            .cloned()
            .collect())
    }

    fn load_dashboard(&mut self) -> Result<Dashboard> {
        self.require_session()?;
        Ok(Dashboard::from_records(
            &self.data.agents,
            &self.data.campaigns,
            &self.data.applications,
        ))
    }

    fn logout(&mut self) {
        self.signed_in = false;
        info!("demo sign-out");
    }

    fn signed_in_user(&mut self) -> Option<CurrentUser> {
        self.signed_in.then(|| self.user.clone())
    }
}

/// Appends one entry to an application's `activityHistory`.
fn push_activity(record: &mut Record, action: &str, comments: &str, timestamp: &str, user: &str) {
    let mut history = record
        .get("activityHistory")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    history.push(json!({
        "action": action,
        "comments": comments,
        "timestamp": timestamp,
        "user": user,
    }));
    record.set("activityHistory", Value::Array(history));
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format timestamp")
}
