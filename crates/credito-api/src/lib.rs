// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use credito_app::{
    AccessToken, ApplicationId, ApplicationSubmission, ClientId, ClientSummary, CreditPolicy,
    CurrentUser, Dashboard, DashboardSummary, LifecycleAction, Record, RecordId, Session,
    SessionError, StatusCount, StatusFilter, TabKind, records_from_value,
};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Blocking client for the CRM REST API. Owns the session, so every
/// authenticated call goes through the same bearer check.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: HttpClient,
    session: Session,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let mut base_url =
            Url::parse(trimmed).with_context(|| format!("parse api.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            http,
            session: Session::signed_out(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Installs a token obtained elsewhere, e.g. a saved one.
    pub fn restore_token(&mut self, raw: &str) -> Result<()> {
        let token = AccessToken::parse(raw)?;
        if token.is_expired(OffsetDateTime::now_utc()) {
            return Err(SessionError::Expired.into());
        }
        self.session.sign_in(token);
        Ok(())
    }

    /// Forgets the token locally. The API keeps no server-side session.
    pub fn logout(&mut self) {
        self.session.sign_out();
        info!("signed out");
    }

    pub fn health(&self) -> Result<()> {
        let url = self.endpoint("health")?;
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }

    /// Exchanges credentials for a token, then loads the user it belongs to.
    pub fn login(&mut self, username: &str, password: &str) -> Result<CurrentUser> {
        if username.trim().is_empty() || password.is_empty() {
            bail!("username and password are required");
        }
        let url = self.endpoint("api/auth/token")?;
        let response = self
            .http
            .post(url)
            .form(&[("username", username.trim()), ("password", password)])
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, username = username.trim(), "login rejected");
            return Err(clean_error_response(status, &body))
                .context("log in -- check the username and password");
        }
        let token: TokenResponse = response.json().context("decode token response")?;
        self.session.sign_in(AccessToken::parse(&token.access_token)?);

        let user = self.current_user()?;
        info!(username = %user.username, "signed in");
        Ok(user)
    }

    pub fn current_user(&mut self) -> Result<CurrentUser> {
        let user: CurrentUser = self.call(Method::GET, "api/users/me", None, "load current user")?;
        self.session.set_user(user.clone());
        Ok(user)
    }

    pub fn list(&mut self, tab: TabKind, filter: StatusFilter) -> Result<Vec<Record>> {
        let mut path = format!("api/{}", tab.resource());
        if tab == TabKind::Applications
            && let Some(status) = filter.query_value()
        {
            path.push_str("?status=");
            path.push_str(status);
        }
        let value: Value = self.call(
            Method::GET,
            &path,
            None,
            &format!("list {}", tab.label()),
        )?;
        let records = records_payload(value).with_context(|| format!("decode {}", tab.label()))?;
        debug!(tab = tab.label(), count = records.len(), "loaded records");
        Ok(records)
    }

    pub fn get(&mut self, tab: TabKind, id: RecordId) -> Result<Record> {
        self.call(
            Method::GET,
            &format!("api/{}/{id}", tab.resource()),
            None,
            &format!("load {} {id}", tab.noun()),
        )
    }

    pub fn create(&mut self, tab: TabKind, body: &Value) -> Result<Record> {
        self.call(
            Method::POST,
            &format!("api/{}", tab.resource()),
            Some(body),
            &format!("create {}", tab.noun()),
        )
    }

    pub fn update(&mut self, tab: TabKind, id: RecordId, body: &Value) -> Result<Record> {
        self.call(
            Method::PUT,
            &format!("api/{}/{id}", tab.resource()),
            Some(body),
            &format!("update {} {id}", tab.noun()),
        )
    }

    pub fn delete(&mut self, tab: TabKind, id: RecordId) -> Result<()> {
        self.execute(
            Method::DELETE,
            &format!("api/{}/{id}", tab.resource()),
            None,
            &format!("delete {} {id}", tab.noun()),
        )?;
        Ok(())
    }

    /// Records an approve/reject decision. `body` is `{status, comments}`.
    pub fn review(&mut self, id: ApplicationId, body: &Value) -> Result<Record> {
        self.call(
            Method::PUT,
            &format!("api/applications/{id}/review"),
            Some(body),
            &format!("review application {id}"),
        )
    }

    pub fn lifecycle(&mut self, tab: TabKind, id: RecordId, action: LifecycleAction) -> Result<()> {
        let supported = match tab {
            TabKind::Agents | TabKind::Policies => {
                matches!(action, LifecycleAction::Activate | LifecycleAction::Deactivate)
            }
            TabKind::Campaigns => matches!(action, LifecycleAction::Start | LifecycleAction::Stop),
            TabKind::Clients | TabKind::Applications => false,
        };
        if !supported {
            bail!(
                "{} records cannot be {}",
                tab.noun(),
                action.past_tense()
            );
        }
        self.execute(
            Method::POST,
            &format!("api/{}/{id}/{}", tab.resource(), action.path_segment()),
            None,
            &format!("{} {} {id}", action.path_segment(), tab.noun()),
        )?;
        Ok(())
    }

    pub fn submit_application(
        &mut self,
        submission: &ApplicationSubmission,
        editing: Option<ApplicationId>,
    ) -> Result<Record> {
        let body = serde_json::to_value(submission).context("encode application")?;
        match editing {
            Some(id) => self.update(TabKind::Applications, RecordId::new(id.get()), &body),
            None => self.create(TabKind::Applications, &body),
        }
    }

    pub fn client_applications(&mut self, id: ClientId) -> Result<Vec<Record>> {
        let value: Value = self.call(
            Method::GET,
            &format!("api/clients/{id}/applications"),
            None,
            &format!("list applications of client {id}"),
        )?;
        records_payload(value).context("decode client applications")
    }

    pub fn dashboard(&mut self) -> Result<Dashboard> {
        let summary: DashboardSummary =
            self.call(Method::GET, "api/dashboard/summary", None, "load dashboard summary")?;
        let statuses: Vec<StatusCount> = self.call(
            Method::GET,
            "api/dashboard/credit-applications/status",
            None,
            "load application status counts",
        )?;
        Ok(Dashboard { summary, statuses })
    }

    pub fn list_policies(&mut self) -> Result<Vec<CreditPolicy>> {
        let value: Value = self.call(Method::GET, "api/credit-policies", None, "list policies")?;
        decode_list(value).context("decode credit policies")
    }

    pub fn list_clients(&mut self) -> Result<Vec<ClientSummary>> {
        let value: Value = self.call(Method::GET, "api/clients", None, "list clients")?;
        decode_list(value).context("decode clients")
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("build URL for {path:?}"))
    }

    fn call<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        what: &str,
    ) -> Result<T> {
        let response = self.execute(method, path, body, what)?;
        response.json().with_context(|| format!("{what}: decode response"))
    }

    fn execute(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        what: &str,
    ) -> Result<Response> {
        let request = self.authorized(method.clone(), path)?;
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        debug!(%method, path, "api request");

        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let error = self.session.reject();
            warn!(%status, path, "credential rejected; session cleared");
            return Err(anyhow::Error::new(error).context(what.to_owned()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, path, "api request failed");
            return Err(clean_error_response(status, &body).context(what.to_owned()));
        }
        Ok(response)
    }

    fn authorized(&mut self, method: Method, path: &str) -> Result<RequestBuilder> {
        let bearer = self.session.authorize(OffsetDateTime::now_utc())?;
        let url = self.endpoint(path)?;
        Ok(self.http.request(method, url).header(AUTHORIZATION, bearer))
    }
}

/// Accepts a bare array or an `{items: [...]}` envelope.
fn records_payload(value: Value) -> Result<Vec<Record>> {
    records_from_value(unwrap_items(value))
}

fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    serde_json::from_value(unwrap_items(value)).map_err(|error| anyhow!("{error}"))
}

fn unwrap_items(value: Value) -> Value {
    match value {
        Value::Object(mut fields) if fields.get("items").is_some_and(Value::is_array) => {
            fields.remove("items").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- start the API server or fix [api] base_url ({})",
        base_url,
        error
    )
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    detail: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<DetailEnvelope>(body)
        && let Some(detail) = parsed.detail
        && let Some(message) = detail_message(&detail)
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if let Ok(parsed) = serde_json::from_str::<MessageEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

/// `detail` is either a string or a list of `{loc, msg}` validation errors.
fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    Some(match field {
                        Some(field) => format!("{field}: {msg}"),
                        None => msg.to_owned(),
                    })
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
