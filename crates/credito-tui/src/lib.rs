// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod columns;

pub use columns::{columns_for, list_for};

use anyhow::{Context, Result};
use credito_app::{
    AgentStatus, Align, AppCommand, AppEvent, AppMode, AppState, ApplicationId,
    ApplicationStatus, ApplicationSubmission, ApplicationWizard, CampaignStatus, ClientId,
    ClientSummary, CreditPolicy, CurrentUser, DEFAULT_ROWS_PER_PAGE, Dashboard, FieldKind,
    FormDraft, FormKind, FormPayload, LifecycleAction, ListController, ListPage,
    ListPresentation, LoanField, Record, RecordDetail, RecordId, StatusFilter, TabKind,
    WizardStep, detail_for, session_error,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use serde_json::Value;
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const WIZARD_LOAN_FIELDS: usize = 6;
const CLIENT_PICKER_WINDOW: usize = 10;

/// Everything the console needs from the outside world. The CLI backs this
/// with the REST client or with generated demo data.
pub trait AppRuntime {
    fn load_records(&mut self, tab: TabKind, filter: StatusFilter) -> Result<Vec<Record>>;
    fn load_clients(&mut self) -> Result<Vec<ClientSummary>>;
    fn load_policies(&mut self) -> Result<Vec<CreditPolicy>>;
    /// `target` is the edited row, or `None` for a create. Review payloads
    /// always target the application under review.
    fn submit_form(
        &mut self,
        tab: TabKind,
        target: Option<RecordId>,
        payload: &FormPayload,
    ) -> Result<()>;
    fn submit_application(
        &mut self,
        submission: &ApplicationSubmission,
        editing: Option<ApplicationId>,
    ) -> Result<()>;
    fn delete_record(&mut self, tab: TabKind, id: RecordId) -> Result<()>;
    fn apply_lifecycle(&mut self, tab: TabKind, id: RecordId, action: LifecycleAction)
    -> Result<()>;
    /// Fresh copy of one row for its detail page.
    fn load_record(&mut self, tab: TabKind, id: RecordId) -> Result<Record>;
    fn load_client_applications(&mut self, client: ClientId) -> Result<Vec<Record>>;
    fn load_dashboard(&mut self) -> Result<Dashboard>;
    fn login(&mut self, username: &str, password: &str) -> Result<CurrentUser>;
    /// Drops the credential; later loads fail until the next login.
    fn logout(&mut self);
    fn signed_in_user(&mut self) -> Option<CurrentUser>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    pub rows_per_page: usize,
    pub start_tab: TabKind,
    /// Prefills the login prompt.
    pub username: Option<String>,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            start_tab: TabKind::Applications,
            username: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    tab: TabKind,
    draft: FormDraft,
    field_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct WizardUiState {
    wizard: ApplicationWizard,
    field_index: usize,
    path_input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct LoginUiState {
    username: String,
    password: String,
    field_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DetailUiState {
    detail: RecordDetail,
    lines: Vec<String>,
    scroll: usize,
}

impl DetailUiState {
    fn new(detail: RecordDetail) -> Self {
        let lines = detail.lines();
        Self {
            detail,
            lines,
            scroll: 0,
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.lines.len().saturating_sub(1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDelete {
    tab: TabKind,
    id: RecordId,
}

#[derive(Debug, Clone)]
struct ViewData {
    lists: Vec<ListController>,
    records: Vec<Record>,
    load: LoadState,
    selected_row: usize,
    selected_col: usize,
    form: Option<FormUiState>,
    wizard: Option<WizardUiState>,
    login: LoginUiState,
    detail: Option<DetailUiState>,
    pending_delete: Option<PendingDelete>,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(options: &UiOptions) -> Self {
        Self {
            lists: TabKind::ALL
                .iter()
                .map(|tab| list_for(*tab, options.rows_per_page))
                .collect(),
            records: Vec::new(),
            load: LoadState::Loading,
            selected_row: 0,
            selected_col: 0,
            form: None,
            wizard: None,
            login: LoginUiState {
                username: options.username.clone().unwrap_or_default(),
                ..LoginUiState::default()
            },
            detail: None,
            pending_delete: None,
            help_visible: false,
            status_token: 0,
        }
    }

    fn list(&self, tab: TabKind) -> &ListController {
        &self.lists[tab_index(tab)]
    }

    fn list_mut(&mut self, tab: TabKind) -> &mut ListController {
        &mut self.lists[tab_index(tab)]
    }

    fn filtered_count(&self, tab: TabKind) -> usize {
        self.list(tab).filter(&self.records).len()
    }

    fn page_len(&self, tab: TabKind) -> usize {
        self.list(tab).view(&self.records).rows.len()
    }

    fn load_error(&self) -> Option<&str> {
        match &self.load {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

fn tab_index(tab: TabKind) -> usize {
    TabKind::ALL
        .iter()
        .position(|candidate| *candidate == tab)
        .unwrap_or(0)
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(&options);
    let (internal_tx, internal_rx) = mpsc::channel();
    state.active_tab = options.start_tab;
    start_session(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn start_session<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.signed_in_user() {
        Some(user) => {
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::SignedIn(user.display_name().to_owned()),
                internal_tx,
            );
            reload(state, runtime, view_data, internal_tx);
        }
        None => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::OpenLogin, internal_tx);
        }
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Session failures send the user back to the login prompt; anything else
/// becomes a status message.
fn report_error<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: &str,
    error: anyhow::Error,
) {
    if let Some(session) = session_error(&error) {
        warn!(action, %session, "session ended");
        view_data.form = None;
        view_data.wizard = None;
        view_data.detail = None;
        view_data.pending_delete = None;
        view_data.login.password.clear();
        dispatch_and_refresh(
            state,
            runtime,
            view_data,
            AppCommand::SessionEnded(session.to_string()),
            internal_tx,
        );
        return;
    }
    warn!(action, error = %format!("{error:#}"), "action failed");
    emit_status(state, view_data, internal_tx, format!("{action} failed: {error:#}"));
}

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::TabChanged(_)))
    {
        view_data.selected_row = 0;
        view_data.selected_col = 0;
    }
    if should_refresh_view(&events) {
        reload(state, runtime, view_data, internal_tx);
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn should_refresh_view(events: &[AppEvent]) -> bool {
    events.iter().any(|event| {
        matches!(
            event,
            AppEvent::TabChanged(_) | AppEvent::StatusFilterChanged(_)
        )
    })
}

fn reload<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = refresh_view_data(state, runtime, view_data) {
        let action = format!("load {}", state.active_tab.label());
        report_error(state, runtime, view_data, internal_tx, &action, error);
    }
}

fn refresh_view_data<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    let tab = state.active_tab;
    view_data.load = LoadState::Loading;
    match runtime.load_records(tab, state.status_filter) {
        Ok(records) => {
            debug!(tab = tab.label(), count = records.len(), "records loaded");
            view_data.records = records;
            view_data.load = LoadState::Ready;
            let count = view_data.filtered_count(tab);
            view_data.list_mut(tab).clamp_page(count);
            clamp_selection(state, view_data);
            Ok(())
        }
        Err(error) => {
            view_data.records.clear();
            view_data.load = LoadState::Failed(format!("{error:#}"));
            Err(error)
        }
    }
}

fn clamp_selection(state: &AppState, view_data: &mut ViewData) {
    let tab = state.active_tab;
    let rows = view_data.page_len(tab);
    view_data.selected_row = view_data.selected_row.min(rows.saturating_sub(1));
    let columns = view_data.list(tab).columns().len();
    view_data.selected_col = view_data.selected_col.min(columns.saturating_sub(1));
}

fn selected_record(state: &AppState, view_data: &ViewData) -> Option<Record> {
    let page = view_data.list(state.active_tab).view(&view_data.records);
    page.rows.get(view_data.selected_row).map(|record| (*record).clone())
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
            emit_status(state, view_data, internal_tx, "help hidden");
        }
        return false;
    }

    if view_data.pending_delete.is_some() {
        handle_delete_confirm_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if let Some(detail) = view_data.detail.as_mut() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => view_data.detail = None,
            KeyCode::Char('j') | KeyCode::Down => detail.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => detail.scroll_by(-1),
            KeyCode::PageDown => detail.scroll_by(10),
            KeyCode::PageUp => detail.scroll_by(-10),
            KeyCode::Char('g') => detail.scroll = 0,
            _ => {}
        }
        return false;
    }

    match state.mode {
        AppMode::Login => {
            handle_login_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Form(_) => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Wizard => {
            handle_wizard_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Search => {
            handle_search_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let tab = state.active_tab;
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        (KeyCode::Char('f'), KeyModifiers::NONE) | (KeyCode::Tab, _) => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::NextTab, internal_tx);
        }
        (KeyCode::Char('b'), KeyModifiers::NONE) | (KeyCode::BackTab, _) => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::PrevTab, internal_tx);
        }
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            let rows = view_data.page_len(tab);
            if rows > 0 {
                view_data.selected_row = (view_data.selected_row + 1).min(rows - 1);
            }
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            view_data.selected_row = view_data.selected_row.saturating_sub(1);
        }
        (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _) => {
            view_data.selected_col = view_data.selected_col.saturating_sub(1);
        }
        (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _) => {
            let columns = view_data.list(tab).columns().len();
            if columns > 0 {
                view_data.selected_col = (view_data.selected_col + 1).min(columns - 1);
            }
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => sort_selected_column(state, view_data, internal_tx),
        (KeyCode::Char('/'), _) => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::EnterSearch, internal_tx);
        }
        (KeyCode::Char('n'), KeyModifiers::NONE) | (KeyCode::PageDown, _) => {
            let count = view_data.filtered_count(tab);
            view_data.list_mut(tab).next_page(count);
            view_data.selected_row = 0;
        }
        (KeyCode::Char('p'), KeyModifiers::NONE) | (KeyCode::PageUp, _) => {
            view_data.list_mut(tab).prev_page();
            view_data.selected_row = 0;
        }
        (KeyCode::Char('g'), KeyModifiers::NONE) => {
            view_data.list_mut(tab).set_page(0);
            view_data.selected_row = 0;
        }
        (KeyCode::Char('G'), _) => {
            let count = view_data.filtered_count(tab);
            view_data.list_mut(tab).last_page(count);
            view_data.selected_row = 0;
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            let rows = view_data.list_mut(tab).cycle_rows_per_page();
            view_data.selected_row = 0;
            emit_status(state, view_data, internal_tx, format!("rows per page: {rows}"));
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => match tab.form_kind() {
            Some(kind) => open_form(state, runtime, view_data, internal_tx, tab, FormDraft::blank(kind)),
            None => open_wizard(state, runtime, view_data, internal_tx, None),
        },
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            let Some(record) = selected_record(state, view_data) else {
                emit_status(state, view_data, internal_tx, "no row selected");
                return false;
            };
            match tab.form_kind() {
                Some(kind) => {
                    let draft = FormDraft::from_record(kind, &record);
                    open_form(state, runtime, view_data, internal_tx, tab, draft);
                }
                None => open_wizard(state, runtime, view_data, internal_tx, Some(record)),
            }
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            let Some(record) = selected_record(state, view_data) else {
                emit_status(state, view_data, internal_tx, "no row selected");
                return false;
            };
            view_data.pending_delete = Some(PendingDelete {
                tab,
                id: record.id(),
            });
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("delete {} {}? y/n", tab.noun(), record.id()),
            );
        }
        (KeyCode::Char('t'), KeyModifiers::NONE) => toggle_status(state, runtime, view_data, internal_tx),
        (KeyCode::Char('v'), KeyModifiers::NONE) => open_review(state, runtime, view_data, internal_tx),
        (KeyCode::Char('S'), _) => {
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::CycleStatusFilter,
                internal_tx,
            );
        }
        (KeyCode::Char('R'), _) => match refresh_view_data(state, runtime, view_data) {
            Ok(()) => {
                let count = view_data.records.len();
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("reloaded {count} {}", tab.label()),
                );
            }
            Err(error) => {
                let action = format!("reload {}", tab.label());
                report_error(state, runtime, view_data, internal_tx, &action, error);
            }
        },
        (KeyCode::Enter, _) => open_detail(state, runtime, view_data, internal_tx),
        (KeyCode::Char('D'), _) => open_dashboard(state, runtime, view_data, internal_tx),
        (KeyCode::Char('L'), _) => log_out(state, runtime, view_data, internal_tx),
        _ => {}
    }
    false
}

fn open_detail<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let tab = state.active_tab;
    let Some(selected) = selected_record(state, view_data) else {
        emit_status(state, view_data, internal_tx, "no row selected");
        return;
    };
    match load_detail(runtime, tab, selected.id()) {
        Ok(detail) => {
            debug!(tab = tab.label(), id = %selected.id(), "detail opened");
            view_data.detail = Some(DetailUiState::new(detail));
        }
        Err(error) => {
            let action = format!("open {} {}", tab.noun(), selected.id());
            report_error(state, runtime, view_data, internal_tx, &action, error);
        }
    }
}

fn load_detail<R: AppRuntime>(runtime: &mut R, tab: TabKind, id: RecordId) -> Result<RecordDetail> {
    let record = runtime.load_record(tab, id)?;
    let related = match tab {
        TabKind::Clients => runtime.load_client_applications(ClientId::new(id.get()))?,
        _ => Vec::new(),
    };
    Ok(detail_for(tab, &record, &related))
}

fn open_dashboard<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.load_dashboard() {
        Ok(dashboard) => view_data.detail = Some(DetailUiState::new(dashboard.to_detail())),
        Err(error) => report_error(state, runtime, view_data, internal_tx, "load dashboard", error),
    }
}

fn log_out<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    runtime.logout();
    view_data.login.password.clear();
    view_data.records.clear();
    view_data.load = LoadState::Failed("signed out -- press L to log in".to_owned());
    dispatch_and_refresh(
        state,
        runtime,
        view_data,
        AppCommand::SessionEnded("signed out".to_owned()),
        internal_tx,
    );
}

fn sort_selected_column(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let tab = state.active_tab;
    let Some(column) = view_data
        .list(tab)
        .columns()
        .get(view_data.selected_col)
        .map(|column| (column.id, column.label))
    else {
        return;
    };
    let (id, label) = column;
    let message = if view_data.list_mut(tab).request_sort(id) {
        format!("sorted by {label} {}", view_data.list(tab).sort().order.as_str())
    } else {
        format!("{label} is not sortable")
    };
    view_data.selected_row = 0;
    emit_status(state, view_data, internal_tx, message);
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let tab = state.active_tab;
    let mut query = view_data.list(tab).search().to_owned();
    match key.code {
        KeyCode::Esc => {
            view_data.list_mut(tab).set_search("");
            view_data.selected_row = 0;
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
            return;
        }
        KeyCode::Enter => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
            return;
        }
        KeyCode::Backspace => {
            query.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => query.push(ch),
        _ => return,
    }
    view_data.list_mut(tab).set_search(&query);
    view_data.selected_row = 0;
}

fn handle_delete_confirm_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(pending) = view_data.pending_delete.clone() else {
        return;
    };
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            view_data.pending_delete = None;
            match runtime.delete_record(pending.tab, pending.id) {
                Ok(()) => {
                    reload(state, runtime, view_data, internal_tx);
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("{} {} deleted", pending.tab.noun(), pending.id),
                    );
                }
                Err(error) => {
                    let action = format!("delete {} {}", pending.tab.noun(), pending.id);
                    report_error(state, runtime, view_data, internal_tx, &action, error);
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_data.pending_delete = None;
            emit_status(state, view_data, internal_tx, "delete canceled");
        }
        _ => {}
    }
}

fn lifecycle_for(tab: TabKind, record: &Record) -> Result<LifecycleAction, String> {
    let status = record.str_field("status");
    match tab {
        TabKind::Agents => match status.and_then(AgentStatus::parse) {
            Some(AgentStatus::Active) => Ok(LifecycleAction::Deactivate),
            Some(_) => Ok(LifecycleAction::Activate),
            None => Err(format!("agent {} has no known status", record.id())),
        },
        TabKind::Campaigns => match status.and_then(CampaignStatus::parse) {
            Some(status) if status.can_stop() => Ok(LifecycleAction::Stop),
            Some(status) if status.can_start() => Ok(LifecycleAction::Start),
            Some(status) => Err(format!(
                "campaign {} is {} and cannot be started or stopped",
                record.id(),
                status.as_str()
            )),
            None => Err(format!("campaign {} has no known status", record.id())),
        },
        TabKind::Policies => match record.get("is_active").and_then(Value::as_bool) {
            Some(true) => Ok(LifecycleAction::Deactivate),
            _ => Ok(LifecycleAction::Activate),
        },
        TabKind::Clients | TabKind::Applications => {
            Err(format!("{} rows have no status toggle", tab.noun()))
        }
    }
}

fn toggle_status<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let tab = state.active_tab;
    let Some(record) = selected_record(state, view_data) else {
        emit_status(state, view_data, internal_tx, "no row selected");
        return;
    };
    let action = match lifecycle_for(tab, &record) {
        Ok(action) => action,
        Err(message) => {
            emit_status(state, view_data, internal_tx, message);
            return;
        }
    };
    match runtime.apply_lifecycle(tab, record.id(), action) {
        Ok(()) => {
            reload(state, runtime, view_data, internal_tx);
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{} {} {}", tab.noun(), record.id(), action.past_tense()),
            );
        }
        Err(error) => {
            let label = format!("{} {} {}", action.path_segment(), tab.noun(), record.id());
            report_error(state, runtime, view_data, internal_tx, &label, error);
        }
    }
}

fn open_review<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if state.active_tab != TabKind::Applications {
        emit_status(state, view_data, internal_tx, "reviews apply to applications");
        return;
    }
    let Some(record) = selected_record(state, view_data) else {
        emit_status(state, view_data, internal_tx, "no row selected");
        return;
    };
    let reviewable = record
        .str_field("status")
        .and_then(ApplicationStatus::parse)
        .is_some_and(ApplicationStatus::is_reviewable);
    if !reviewable {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!(
                "application {} is already decided -- only pending or in-review applications can be reviewed",
                record.id()
            ),
        );
        return;
    }
    open_form(
        state,
        runtime,
        view_data,
        internal_tx,
        TabKind::Applications,
        FormDraft::review(record.id()),
    );
}

fn open_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    tab: TabKind,
    draft: FormDraft,
) {
    let kind = draft.kind();
    view_data.form = Some(FormUiState {
        tab,
        draft,
        field_index: 0,
    });
    dispatch_and_refresh(state, runtime, view_data, AppCommand::OpenForm(kind), internal_tx);
}

fn close_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    view_data.form = None;
    dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form) = view_data.form.as_mut() else {
        dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
        return;
    };
    let fields = form.draft.len();
    let field_kind = form
        .draft
        .specs()
        .get(form.field_index)
        .map(|spec| spec.kind)
        .unwrap_or(FieldKind::Text);
    let is_choice = matches!(field_kind, FieldKind::Choice(_) | FieldKind::Flag);

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            let label = form.draft.kind().label();
            close_form(state, runtime, view_data, internal_tx);
            emit_status(state, view_data, internal_tx, format!("{label} form canceled"));
        }
        (KeyCode::Enter, _) | (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
            submit_form(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Tab, _) | (KeyCode::Down, _) => {
            form.field_index = (form.field_index + 1) % fields.max(1);
        }
        (KeyCode::BackTab, _) | (KeyCode::Up, _) => {
            form.field_index = (form.field_index + fields.max(1) - 1) % fields.max(1);
        }
        (KeyCode::Left, _) if is_choice => {
            form.draft.cycle_choice(form.field_index, -1);
        }
        (KeyCode::Right, _) | (KeyCode::Char(' '), _) if is_choice => {
            form.draft.cycle_choice(form.field_index, 1);
        }
        (KeyCode::Backspace, _) if !is_choice => form.draft.pop_char(form.field_index),
        (KeyCode::Char(ch), modifiers)
            if !is_choice && !modifiers.contains(KeyModifiers::CONTROL) =>
        {
            form.draft.push_char(form.field_index, ch);
        }
        _ => {}
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(form) = view_data.form.clone() else {
        return;
    };
    let payload = match form.draft.to_payload() {
        Ok(payload) => payload,
        Err(error) => {
            emit_status(state, view_data, internal_tx, error.to_string());
            return;
        }
    };
    let target = form.draft.target();
    match runtime.submit_form(form.tab, target, &payload) {
        Ok(()) => {
            close_form(state, runtime, view_data, internal_tx);
            reload(state, runtime, view_data, internal_tx);
            let message = match (&payload, target) {
                (FormPayload::Review(review), _) => format!(
                    "application {} {}",
                    review.application_id,
                    review.status.map(|status| status.as_str()).unwrap_or("reviewed")
                ),
                (_, Some(id)) => format!("{} {id} updated", form.tab.noun()),
                (_, None) => format!("{} created", form.tab.noun()),
            };
            emit_status(state, view_data, internal_tx, message);
        }
        Err(error) => {
            let action = format!("save {}", payload.kind().label());
            report_error(state, runtime, view_data, internal_tx, &action, error);
        }
    }
}

fn open_wizard<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    record: Option<Record>,
) {
    let lookups = runtime
        .load_clients()
        .and_then(|clients| Ok((clients, runtime.load_policies()?)));
    let (clients, policies) = match lookups {
        Ok(lookups) => lookups,
        Err(error) => {
            report_error(state, runtime, view_data, internal_tx, "load wizard choices", error);
            return;
        }
    };
    let wizard = match record {
        None => ApplicationWizard::new(clients, policies),
        Some(record) => match ApplicationWizard::edit(&record, clients, policies) {
            Ok(wizard) => wizard,
            Err(error) => {
                emit_status(state, view_data, internal_tx, format!("{error:#}"));
                return;
            }
        },
    };
    view_data.wizard = Some(WizardUiState {
        wizard,
        field_index: 0,
        path_input: String::new(),
    });
    dispatch_and_refresh(state, runtime, view_data, AppCommand::OpenWizard, internal_tx);
}

fn close_wizard<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    view_data.wizard = None;
    dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
}

fn loan_field_at(index: usize) -> Option<LoanField> {
    match index {
        0 => Some(LoanField::Amount),
        1 => Some(LoanField::Rate),
        2 => Some(LoanField::Term),
        5 => Some(LoanField::Comments),
        _ => None,
    }
}

fn handle_wizard_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(ui) = view_data.wizard.as_mut() else {
        dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
        return;
    };
    let step = ui.wizard.step();

    if key.code == KeyCode::Esc {
        if step == WizardStep::Client {
            close_wizard(state, runtime, view_data, internal_tx);
            emit_status(state, view_data, internal_tx, "application canceled");
        } else {
            ui.wizard.back();
            ui.field_index = 0;
        }
        return;
    }

    let submit = key.code == KeyCode::Enter
        || (key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL));

    match step {
        WizardStep::Client => match key.code {
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Right => {
                ui.wizard.cycle_client(1);
            }
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Left => {
                ui.wizard.cycle_client(-1);
            }
            _ => {}
        },
        WizardStep::LoanDetails => match key.code {
            KeyCode::Tab | KeyCode::Down => {
                ui.field_index = (ui.field_index + 1) % WIZARD_LOAN_FIELDS;
            }
            KeyCode::BackTab | KeyCode::Up => {
                ui.field_index = (ui.field_index + WIZARD_LOAN_FIELDS - 1) % WIZARD_LOAN_FIELDS;
            }
            KeyCode::Left | KeyCode::Right => {
                let delta = if key.code == KeyCode::Left { -1 } else { 1 };
                match ui.field_index {
                    3 => {
                        ui.wizard.cycle_purpose(delta);
                    }
                    4 => {
                        ui.wizard.cycle_policy(delta);
                    }
                    _ => {}
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = loan_field_at(ui.field_index) {
                    ui.wizard.pop_char(field);
                }
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(field) = loan_field_at(ui.field_index) {
                    ui.wizard.push_char(field, ch);
                }
            }
            _ => {}
        },
        WizardStep::Documents => match key.code {
            KeyCode::Backspace => {
                ui.path_input.pop();
            }
            KeyCode::Delete => {
                let last = ui.wizard.documents().len().checked_sub(1);
                if let Some(removed) = last.and_then(|index| ui.wizard.remove_document(index)) {
                    let name = removed.name;
                    emit_status(state, view_data, internal_tx, format!("removed {name}"));
                }
                return;
            }
            KeyCode::Enter if !ui.path_input.trim().is_empty() => {
                let path = ui.path_input.trim().to_owned();
                let message = match ui.wizard.attach_path(Path::new(&path)) {
                    Ok(document) => format!("attached {}", document.name),
                    Err(error) => format!("{error:#}"),
                };
                ui.path_input.clear();
                emit_status(state, view_data, internal_tx, message);
                return;
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                ui.path_input.push(ch);
            }
            _ => {}
        },
        WizardStep::Review => {
            if submit {
                submit_wizard(state, runtime, view_data, internal_tx);
                return;
            }
        }
    }

    if submit
        && let Some(ui) = view_data.wizard.as_mut()
    {
        match ui.wizard.next() {
            Ok(next) => {
                ui.field_index = 0;
                debug!(step = next.label(), "wizard advanced");
            }
            Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
        }
    }
}

fn submit_wizard<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(ui) = view_data.wizard.as_ref() else {
        return;
    };
    let editing = ui.wizard.editing();
    let submission = match ui.wizard.submission() {
        Ok(submission) => submission,
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("{error:#}"));
            return;
        }
    };
    match runtime.submit_application(&submission, editing) {
        Ok(()) => {
            close_wizard(state, runtime, view_data, internal_tx);
            if state.active_tab == TabKind::Applications {
                reload(state, runtime, view_data, internal_tx);
            }
            let message = match editing {
                Some(id) => format!("application {id} updated"),
                None => "application submitted".to_owned(),
            };
            emit_status(state, view_data, internal_tx, message);
        }
        Err(error) => {
            report_error(state, runtime, view_data, internal_tx, "submit application", error);
        }
    }
}

fn handle_login_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let login = &mut view_data.login;
    match key.code {
        KeyCode::Esc => {
            login.password.clear();
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, internal_tx);
            emit_status(state, view_data, internal_tx, "not signed in -- press L to log in");
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            login.field_index = 1 - login.field_index.min(1);
        }
        KeyCode::Backspace => {
            if login.field_index == 0 {
                login.username.pop();
            } else {
                login.password.pop();
            }
        }
        KeyCode::Enter => {
            if login.field_index == 0 && login.password.is_empty() {
                login.field_index = 1;
                return;
            }
            let username = login.username.trim().to_owned();
            let password = std::mem::take(&mut login.password);
            match runtime.login(&username, &password) {
                Ok(user) => {
                    dispatch_and_refresh(
                        state,
                        runtime,
                        view_data,
                        AppCommand::SignedIn(user.display_name().to_owned()),
                        internal_tx,
                    );
                    reload(state, runtime, view_data, internal_tx);
                }
                Err(error) => {
                    emit_status(state, view_data, internal_tx, format!("login failed: {error:#}"));
                }
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if login.field_index == 0 {
                login.username.push(ch);
            } else {
                login.password.push(ch);
            }
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = tab_index(state.active_tab);
    let tab_titles = TabKind::ALL
        .iter()
        .map(|tab| tab_title(*tab, state))
        .collect::<Vec<String>>();
    let header = match &state.signed_in_as {
        Some(name) => format!("credito - {name}"),
        None => "credito".to_owned(),
    };
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title(header).borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    render_list(frame, layout[1], state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[2]);

    if let Some(form) = &view_data.form {
        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(render_form_overlay_text(form))
            .block(Block::default().title(form_title(form)).borders(Borders::ALL));
        frame.render_widget(overlay, area);
    }

    if let Some(wizard) = &view_data.wizard {
        let area = centered_rect(72, 80, frame.area());
        frame.render_widget(Clear, area);
        let title = match wizard.wizard.editing() {
            Some(id) => format!("edit application {id}"),
            None => "new application".to_owned(),
        };
        let overlay = Paragraph::new(render_wizard_overlay_text(wizard))
            .wrap(Wrap { trim: false })
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(overlay, area);
    }

    if state.mode == AppMode::Login {
        let area = centered_rect(44, 30, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(render_login_overlay_text(&view_data.login))
            .block(Block::default().title("log in").borders(Borders::ALL));
        frame.render_widget(overlay, area);
    }

    if let Some(detail) = &view_data.detail {
        let area = centered_rect(70, 80, frame.area());
        frame.render_widget(Clear, area);
        let scroll = u16::try_from(detail.scroll).unwrap_or(u16::MAX);
        let overlay = Paragraph::new(detail.lines.join("\n"))
            .scroll((scroll, 0))
            .block(
                Block::default()
                    .title(detail.detail.title.as_str())
                    .borders(Borders::ALL),
            );
        frame.render_widget(overlay, area);
    }

    if let Some(pending) = &view_data.pending_delete {
        let area = centered_rect(40, 20, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(format!(
            "delete {} {}?\n\ny confirm | n cancel",
            pending.tab.noun(),
            pending.id
        ))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title("confirm")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 72, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn tab_title(tab: TabKind, state: &AppState) -> String {
    if tab == TabKind::Applications && state.status_filter != StatusFilter::All {
        return format!("{} ({})", tab.label(), state.status_filter.label());
    }
    tab.label().to_owned()
}

fn render_list(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let tab = state.active_tab;
    let list = view_data.list(tab);
    let presentation = list.present(
        view_data.load == LoadState::Loading,
        view_data.load_error(),
        &view_data.records,
    );

    let page = match presentation {
        ListPresentation::Loading => {
            let body = Paragraph::new(format!("loading {}...", tab.label()))
                .block(Block::default().borders(Borders::ALL).title(tab.label()));
            frame.render_widget(body, area);
            return;
        }
        ListPresentation::Error(message) => {
            let body = Paragraph::new(message.to_owned())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(tab.label()));
            frame.render_widget(body, area);
            return;
        }
        ListPresentation::Empty(message) => {
            let body = Paragraph::new(message.to_owned())
                .style(Style::default().fg(Color::DarkGray))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(table_title(tab, state, list, None)),
                );
            frame.render_widget(body, area);
            return;
        }
        ListPresentation::Rows(page) => page,
    };

    let columns = list.columns();
    let widths = columns
        .iter()
        .map(|column| Constraint::Min(column.min_width.unwrap_or(8)))
        .collect::<Vec<_>>();

    let header_cells = (0..columns.len()).map(|index| {
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if index == view_data.selected_col {
            style = style.fg(Color::Cyan);
        }
        Cell::from(header_label(list, index)).style(style)
    });
    let header = Row::new(header_cells);

    let rows = page.rows.iter().enumerate().map(|(row_index, record)| {
        let selected_row = row_index == view_data.selected_row;
        let cells = columns
            .iter()
            .enumerate()
            .map(|(column_index, column)| {
                let line = Line::from(column.render(record)).alignment(match column.align {
                    Align::Left => Alignment::Left,
                    Align::Right => Alignment::Right,
                    Align::Center => Alignment::Center,
                });
                let mut style = Style::default();
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && column_index == view_data.selected_col {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(line).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(tab, state, list, Some(&page)))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn header_label(list: &ListController, column_index: usize) -> String {
    let Some(column) = list.columns().get(column_index) else {
        return String::new();
    };
    let mut label = column.label.to_owned();
    let sort = list.sort();
    if sort.order_by == column.id {
        label.push(' ');
        label.push_str(sort.order.arrow());
    }
    label
}

fn table_title(
    tab: TabKind,
    state: &AppState,
    list: &ListController,
    page: Option<&ListPage<'_>>,
) -> String {
    let mut parts = vec![tab.label().to_owned()];
    if let Some(page) = page {
        parts.push(page.range_label());
        parts.push(format!("page {}/{}", page.page + 1, page.page_count.max(1)));
    }
    if !list.search().is_empty() {
        parts.push(format!("search: {}", list.search()));
    }
    if tab == TabKind::Applications && state.status_filter != StatusFilter::All {
        parts.push(format!("status: {}", state.status_filter.label()));
    }
    parts.push(format!("{}/page", list.pagination().rows_per_page));
    parts.join(" | ")
}

fn mode_badge(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Nav => "NAV",
        AppMode::Search => "SEARCH",
        AppMode::Form(_) => "FORM",
        AppMode::Wizard => "WIZARD",
        AppMode::Login => "LOGIN",
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }
    if view_data.detail.is_some() {
        return "DETAIL | j/k scroll | g top | esc close".to_owned();
    }
    let hints = match state.mode {
        AppMode::Nav => "j/k/h/l | f/b tabs | s sort | / search | n/p g/G pages | r rows | a/e/d | t toggle | v review | enter detail | D dashboard | S status | R reload | L log out | ? help | q quit",
        AppMode::Search => {
            return format!(
                "SEARCH | /{}_ | enter keep | esc clear",
                view_data.list(state.active_tab).search()
            );
        }
        AppMode::Form(_) => "tab/shift+tab field | left/right choose | enter save | esc cancel",
        AppMode::Wizard => "enter next | esc back | tab field | left/right choose",
        AppMode::Login => "tab switch field | enter log in | esc skip",
    };
    let mode = mode_badge(state.mode);
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn form_title(form: &FormUiState) -> String {
    let kind = form.draft.kind();
    match (kind, form.draft.target()) {
        (FormKind::Review, Some(id)) => format!("review application {id}"),
        (_, Some(id)) => format!("edit {} {id}", kind.label()),
        (_, None) => format!("new {}", kind.label()),
    }
}

fn render_form_overlay_text(form: &FormUiState) -> String {
    let mut lines = Vec::with_capacity(form.draft.len() + 2);
    for (index, spec) in form.draft.specs().iter().enumerate() {
        let marker = if index == form.field_index { ">" } else { " " };
        let value = form.draft.value(index);
        let value = match spec.kind {
            FieldKind::Choice(_) | FieldKind::Flag => format!("< {value} >"),
            _ if index == form.field_index => format!("{value}_"),
            _ => value.to_owned(),
        };
        lines.push(format!("{marker} {:<16} {value}", format!("{}:", spec.label)));
    }
    lines.push(String::new());
    lines.push("enter save | esc cancel".to_owned());
    lines.join("\n")
}

fn render_wizard_overlay_text(ui: &WizardUiState) -> String {
    let wizard = &ui.wizard;
    let step = wizard.step();
    let mut lines = vec![
        format!(
            "step {}/{}: {}",
            step.index() + 1,
            WizardStep::ALL.len(),
            step.label()
        ),
        String::new(),
    ];
    match step {
        WizardStep::Client => {
            let clients = wizard.clients();
            if clients.is_empty() {
                lines.push("no clients -- add one on the clients tab first".to_owned());
            }
            let selected = wizard.client().map(|client| client.id);
            let position = clients
                .iter()
                .position(|client| Some(client.id) == selected)
                .unwrap_or(0);
            let start = position.saturating_sub(CLIENT_PICKER_WINDOW / 2);
            for client in clients.iter().skip(start).take(CLIENT_PICKER_WINDOW) {
                let marker = if Some(client.id) == selected { ">" } else { " " };
                lines.push(format!(
                    "{marker} {} <{}>",
                    client.display_name(),
                    client.email
                ));
            }
        }
        WizardStep::LoanDetails => {
            let purpose = wizard
                .purpose()
                .map(|purpose| purpose.label().to_owned())
                .unwrap_or_else(|| "-".to_owned());
            let policy = wizard
                .policy()
                .map(CreditPolicy::selector_label)
                .unwrap_or_else(|| "-".to_owned());
            let rows = [
                ("amount $", wizard.text(LoanField::Amount).to_owned()),
                ("rate %", wizard.text(LoanField::Rate).to_owned()),
                ("term (months)", wizard.text(LoanField::Term).to_owned()),
                ("purpose", format!("< {purpose} >")),
                ("policy", format!("< {policy} >")),
                ("comments", wizard.text(LoanField::Comments).to_owned()),
            ];
            for (index, (label, value)) in rows.into_iter().enumerate() {
                let marker = if index == ui.field_index { ">" } else { " " };
                lines.push(format!("{marker} {:<15} {value}", format!("{label}:")));
            }
            lines.push(String::new());
            lines.push(format!("monthly payment: {}", wizard.terms().payment_label()));
        }
        WizardStep::Documents => {
            for document in wizard.documents() {
                lines.push(format!(
                    "  {} ({} KiB, {})",
                    document.name,
                    document.size.div_ceil(1024),
                    document.mime
                ));
            }
            if wizard.documents().is_empty() {
                lines.push("  no documents attached".to_owned());
            }
            lines.push(String::new());
            lines.push(format!("path: {}_", ui.path_input));
            lines.push("enter attach (empty: continue) | del remove last".to_owned());
            lines.push("pdf, jpeg, png, doc, docx | up to 10 files of 5 MiB".to_owned());
        }
        WizardStep::Review => {
            for (label, value) in wizard.summary_lines() {
                lines.push(format!("  {:<10} {value}", format!("{label}:")));
            }
            lines.push(String::new());
            lines.push("enter submit | esc back".to_owned());
        }
    }
    lines.join("\n")
}

fn render_login_overlay_text(login: &LoginUiState) -> String {
    let user_marker = if login.field_index == 0 { ">" } else { " " };
    let pass_marker = if login.field_index == 1 { ">" } else { " " };
    format!(
        "{user_marker} username: {}\n{pass_marker} password: {}\n\nenter log in | tab switch",
        login.username,
        "*".repeat(login.password.chars().count())
    )
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: j/k rows | h/l columns | f/b or tab/shift+tab tabs\n\
nav: s sort column (again to flip) | / search | n/p page | g/G first/last page | r rows per page\n\
edit: a add | e edit | d delete | t activate/deactivate or start/stop | v review application\n\
filter: S cycle application status | R reload\n\
view: enter record detail | D dashboard | j/k scroll | esc close\n\
session: L log out and return to the login prompt\n\
form: tab/shift+tab field | left/right or space choose | enter save | esc cancel\n\
wizard: enter next | esc back | client j/k | loan tab field, left/right purpose or policy\n\
wizard documents: type a path, enter attach, del remove last, enter on empty path continues"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, LoadState, UiOptions, ViewData, handle_key_event,
        header_label, help_overlay_text, lifecycle_for, process_internal_events,
        refresh_view_data, render_form_overlay_text, render_wizard_overlay_text, session_error,
        status_text, table_title,
    };
    use anyhow::{Result, bail};
    use credito_app::{
        AppMode, AppState, ApplicationId, ApplicationStatus, ApplicationSubmission, ClientId,
        ClientSummary, CreditPolicy, CurrentUser, Dashboard, FormKind, FormPayload,
        LifecycleAction, PolicyId, Record, RecordId, ReviewDecision, SessionError, StatusFilter,
        TabKind, UserId, WizardStep,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::mpsc;

    #[derive(Debug, Default)]
    struct TestRuntime {
        agents: Vec<Record>,
        applications: Vec<Record>,
        last_filter: Option<StatusFilter>,
        load_count: usize,
        session_expired: bool,
        signed_in: bool,
        submitted: Vec<(TabKind, Option<RecordId>, FormPayload)>,
        applications_submitted: Vec<(ApplicationSubmission, Option<ApplicationId>)>,
        deleted: Vec<(TabKind, RecordId)>,
        lifecycle: Vec<(TabKind, RecordId, LifecycleAction)>,
    }

    impl TestRuntime {
        fn with_agents(count: i64) -> Self {
            let agents = (1..=count)
                .map(|id| {
                    Record::new(RecordId::new(id))
                        .with("name", format!("agent-{id:02}"))
                        .with("status", if id % 2 == 0 { "inactive" } else { "active" })
                        .with("interactions_count", id * 3)
                })
                .collect();
            Self {
                agents,
                signed_in: true,
                ..Self::default()
            }
        }

        fn with_applications() -> Self {
            let applications = vec![
                Record::new(RecordId::new(1))
                    .with("client", json!({"id": 1, "firstName": "Lucia", "lastName": "Reyes"}))
                    .with("loanAmount", 12000)
                    .with("status", "pending")
                    .with("createdAt", "2026-01-10T00:00:00Z"),
                Record::new(RecordId::new(2))
                    .with("client", json!({"id": 2, "firstName": "Mateo", "lastName": "Vargas"}))
                    .with("loanAmount", 5000)
                    .with("status", "approved")
                    .with("createdAt", "2026-01-09T00:00:00Z"),
            ];
            Self {
                applications,
                signed_in: true,
                ..Self::default()
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn load_records(&mut self, tab: TabKind, filter: StatusFilter) -> Result<Vec<Record>> {
            if self.session_expired {
                self.signed_in = false;
                return Err(SessionError::Expired.into());
            }
            if !self.signed_in {
                return Err(SessionError::SignedOut.into());
            }
            self.load_count += 1;
            self.last_filter = Some(filter);
            Ok(match tab {
                TabKind::Agents => self.agents.clone(),
                TabKind::Applications => self
                    .applications
                    .iter()
                    .filter(|record| match filter.query_value() {
                        Some(status) => record.str_field("status") == Some(status),
                        None => true,
                    })
                    .cloned()
                    .collect(),
                _ => Vec::new(),
            })
        }

        fn load_clients(&mut self) -> Result<Vec<ClientSummary>> {
            Ok(vec![ClientSummary {
                id: ClientId::new(1),
                first_name: "Lucia".to_owned(),
                last_name: "Reyes".to_owned(),
                email: "lucia@example.com".to_owned(),
            }])
        }

        fn load_policies(&mut self) -> Result<Vec<CreditPolicy>> {
            Ok(vec![CreditPolicy {
                id: PolicyId::new(7),
                name: "Standard".to_owned(),
                description: String::new(),
                version: "1.0".to_owned(),
                is_active: true,
                base_interest_rate: dec!(10),
                max_loan_amount: Some(dec!(50000)),
            }])
        }

        fn submit_form(
            &mut self,
            tab: TabKind,
            target: Option<RecordId>,
            payload: &FormPayload,
        ) -> Result<()> {
            self.submitted.push((tab, target, payload.clone()));
            Ok(())
        }

        fn submit_application(
            &mut self,
            submission: &ApplicationSubmission,
            editing: Option<ApplicationId>,
        ) -> Result<()> {
            self.applications_submitted
                .push((submission.clone(), editing));
            Ok(())
        }

        fn delete_record(&mut self, tab: TabKind, id: RecordId) -> Result<()> {
            self.deleted.push((tab, id));
            self.agents.retain(|record| record.id() != id);
            Ok(())
        }

        fn apply_lifecycle(
            &mut self,
            tab: TabKind,
            id: RecordId,
            action: LifecycleAction,
        ) -> Result<()> {
            self.lifecycle.push((tab, id, action));
            Ok(())
        }

        fn load_record(&mut self, tab: TabKind, id: RecordId) -> Result<Record> {
            if !self.signed_in {
                return Err(SessionError::SignedOut.into());
            }
            let rows = match tab {
                TabKind::Agents => &self.agents,
                TabKind::Applications => &self.applications,
                _ => bail!("no {} {id}", tab.noun()),
            };
            match rows.iter().find(|record| record.id() == id) {
                Some(record) => Ok(record.clone()),
                None => bail!("server error (404): {} not found", tab.noun()),
            }
        }

        fn load_client_applications(&mut self, client: ClientId) -> Result<Vec<Record>> {
            Ok(self
                .applications
                .iter()
                .filter(|record| {
                    record
                        .get("client")
                        .and_then(|value| value.get("id"))
                        .and_then(|id| id.as_i64())
                        == Some(client.get())
                })
                .cloned()
                .collect())
        }

        fn load_dashboard(&mut self) -> Result<Dashboard> {
            if !self.signed_in {
                return Err(SessionError::SignedOut.into());
            }
            Ok(Dashboard::from_records(&self.agents, &[], &self.applications))
        }

        fn login(&mut self, username: &str, password: &str) -> Result<CurrentUser> {
            if password != "s3cret" {
                bail!("server error (401): Incorrect username or password");
            }
            self.signed_in = true;
            self.session_expired = false;
            Ok(CurrentUser {
                id: UserId::new(1),
                username: username.to_owned(),
                email: String::new(),
                full_name: None,
                is_admin: true,
            })
        }

        fn logout(&mut self) {
            self.signed_in = false;
        }

        fn signed_in_user(&mut self) -> Option<CurrentUser> {
            self.signed_in.then(|| CurrentUser {
                id: UserId::new(1),
                username: "ana".to_owned(),
                email: String::new(),
                full_name: None,
                is_admin: true,
            })
        }
    }

    fn view_data_for_test() -> ViewData {
        ViewData::new(&UiOptions::default())
    }

    fn internal_tx() -> mpsc::Sender<InternalEvent> {
        let (tx, _rx) = mpsc::channel();
        tx
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        codes: &[KeyCode],
    ) {
        let tx = internal_tx();
        for code in codes {
            let _ = handle_key_event(state, runtime, view_data, &tx, key(*code));
        }
    }

    fn type_text(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        text: &str,
    ) {
        let codes: Vec<KeyCode> = text.chars().map(KeyCode::Char).collect();
        press(state, runtime, view_data, &codes);
    }

    fn loaded(tab: TabKind, runtime: &mut TestRuntime) -> (AppState, ViewData) {
        let state = AppState {
            active_tab: tab,
            ..AppState::default()
        };
        let mut view_data = view_data_for_test();
        refresh_view_data(&state, runtime, &mut view_data).expect("initial load");
        (state, view_data)
    }

    #[test]
    fn tab_key_cycles_tabs_and_reloads() {
        let mut runtime = TestRuntime::with_agents(3);
        let (mut state, mut view_data) = loaded(TabKind::Policies, &mut runtime);

        let should_quit = handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &internal_tx(),
            key(KeyCode::Tab),
        );
        assert!(!should_quit);
        assert_eq!(state.active_tab, TabKind::Agents);
        assert_eq!(view_data.records.len(), 3);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('b')]);
        assert_eq!(state.active_tab, TabKind::Policies);
    }

    #[test]
    fn q_quits_from_nav_only() {
        let mut runtime = TestRuntime::with_agents(1);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);
        let tx = internal_tx();

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('/')]);
        assert!(!handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Char('q'))
        ));
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Esc]);
        assert!(handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            key(KeyCode::Char('q'))
        ));
    }

    #[test]
    fn search_filters_rows_and_escape_clears() {
        let mut runtime = TestRuntime::with_agents(12);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('/')]);
        assert_eq!(state.mode, AppMode::Search);
        type_text(&mut state, &mut runtime, &mut view_data, "agent-1");
        assert_eq!(view_data.filtered_count(TabKind::Agents), 3);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(view_data.list(TabKind::Agents).search(), "agent-1");

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[KeyCode::Char('/'), KeyCode::Esc],
        );
        assert_eq!(view_data.filtered_count(TabKind::Agents), 12);
    }

    #[test]
    fn s_sorts_selected_column_and_flips() {
        let mut runtime = TestRuntime::with_agents(3);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('l'), KeyCode::Char('s')]);
        assert_eq!(view_data.list(TabKind::Agents).sort().order_by, "name");
        assert_eq!(state.status_line.as_deref(), Some("sorted by name asc"));

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('s')]);
        assert_eq!(state.status_line.as_deref(), Some("sorted by name desc"));
        assert_eq!(header_label(view_data.list(TabKind::Agents), 1), "name ↓");
    }

    #[test]
    fn paging_keys_move_between_pages() {
        let mut runtime = TestRuntime::with_agents(23);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('n')]);
        assert_eq!(view_data.list(TabKind::Agents).pagination().page, 1);
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('G')]);
        assert_eq!(view_data.list(TabKind::Agents).pagination().page, 2);
        assert_eq!(view_data.page_len(TabKind::Agents), 3);
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('n')]);
        assert_eq!(view_data.list(TabKind::Agents).pagination().page, 2);
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('p')]);
        assert_eq!(view_data.list(TabKind::Agents).pagination().page, 1);
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('g')]);
        assert_eq!(view_data.list(TabKind::Agents).pagination().page, 0);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('r')]);
        assert_eq!(
            view_data.list(TabKind::Agents).pagination().rows_per_page,
            25
        );
        assert_eq!(view_data.page_len(TabKind::Agents), 23);
    }

    #[test]
    fn add_agent_validates_then_submits() {
        let mut runtime = TestRuntime::with_agents(1);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('a')]);
        assert_eq!(state.mode, AppMode::Form(FormKind::Agent));

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert!(runtime.submitted.is_empty());
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("name is required"))
        );

        type_text(&mut state, &mut runtime, &mut view_data, "Sofia");
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(runtime.submitted.len(), 1);
        let (tab, target, payload) = &runtime.submitted[0];
        assert_eq!(*tab, TabKind::Agents);
        assert!(target.is_none());
        let FormPayload::Agent(agent) = payload else {
            panic!("agent payload expected");
        };
        assert_eq!(agent.name, "Sofia");
        assert_eq!(state.status_line.as_deref(), Some("agent created"));
    }

    #[test]
    fn edit_targets_selected_row() {
        let mut runtime = TestRuntime::with_agents(3);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[KeyCode::Char('j'), KeyCode::Char('e')],
        );
        let form = view_data.form.as_ref().expect("form open");
        assert_eq!(form.draft.target(), Some(RecordId::new(2)));
        assert_eq!(form.draft.value(0), "agent-02");
        assert!(render_form_overlay_text(form).contains("> name:"));

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Esc]);
        assert_eq!(state.mode, AppMode::Nav);
        assert!(view_data.form.is_none());
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut runtime = TestRuntime::with_agents(2);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[KeyCode::Char('d'), KeyCode::Char('n')],
        );
        assert!(runtime.deleted.is_empty());

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[KeyCode::Char('d'), KeyCode::Char('y')],
        );
        assert_eq!(runtime.deleted, vec![(TabKind::Agents, RecordId::new(1))]);
        assert_eq!(view_data.records.len(), 1);
        assert_eq!(state.status_line.as_deref(), Some("agent 1 deleted"));
    }

    #[test]
    fn t_toggles_agent_by_current_status() {
        let mut runtime = TestRuntime::with_agents(2);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('t')]);
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[KeyCode::Char('j'), KeyCode::Char('t')],
        );
        assert_eq!(
            runtime.lifecycle,
            vec![
                (TabKind::Agents, RecordId::new(1), LifecycleAction::Deactivate),
                (TabKind::Agents, RecordId::new(2), LifecycleAction::Activate),
            ]
        );
    }

    #[test]
    fn lifecycle_rules_per_tab() {
        let running = Record::new(RecordId::new(1)).with("status", "running");
        let done = Record::new(RecordId::new(2)).with("status", "completed");
        let draft = Record::new(RecordId::new(3)).with("status", "DRAFT");
        let policy = Record::new(RecordId::new(4)).with("is_active", true);
        assert_eq!(
            lifecycle_for(TabKind::Campaigns, &running),
            Ok(LifecycleAction::Stop)
        );
        assert!(lifecycle_for(TabKind::Campaigns, &done).is_err());
        assert_eq!(
            lifecycle_for(TabKind::Campaigns, &draft),
            Ok(LifecycleAction::Start)
        );
        assert_eq!(
            lifecycle_for(TabKind::Policies, &policy),
            Ok(LifecycleAction::Deactivate)
        );
        assert!(lifecycle_for(TabKind::Clients, &policy).is_err());
    }

    #[test]
    fn review_only_opens_for_undecided_applications() {
        let mut runtime = TestRuntime::with_applications();
        let (mut state, mut view_data) = loaded(TabKind::Applications, &mut runtime);

        // Newest first: row 0 is the pending application.
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('j'), KeyCode::Char('v')]);
        assert_eq!(state.mode, AppMode::Nav);
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("already decided"))
        );

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('k'), KeyCode::Char('v')]);
        assert_eq!(state.mode, AppMode::Form(FormKind::Review));
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Right, KeyCode::Tab]);
        type_text(&mut state, &mut runtime, &mut view_data, "income verified");
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);

        let (tab, target, payload) = runtime.submitted.last().expect("review submitted");
        assert_eq!(*tab, TabKind::Applications);
        assert_eq!(*target, Some(RecordId::new(1)));
        let FormPayload::Review(review) = payload else {
            panic!("review payload expected");
        };
        assert_eq!(review.status, Some(ReviewDecision::Approved));
        assert_eq!(review.comments, "income verified");
        assert_eq!(state.status_line.as_deref(), Some("application 1 approved"));
    }

    #[test]
    fn status_filter_reloads_with_query() {
        let mut runtime = TestRuntime::with_applications();
        let (mut state, mut view_data) = loaded(TabKind::Applications, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('S')]);
        assert_eq!(
            runtime.last_filter,
            Some(StatusFilter::Only(ApplicationStatus::Pending))
        );
        assert_eq!(view_data.records.len(), 1);
        assert!(table_title(
            TabKind::Applications,
            &state,
            view_data.list(TabKind::Applications),
            None
        )
        .contains("status: pending"));
    }

    #[test]
    fn wizard_walks_steps_and_submits_payment() {
        let mut runtime = TestRuntime::with_applications();
        let (mut state, mut view_data) = loaded(TabKind::Applications, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('a')]);
        assert_eq!(state.mode, AppMode::Wizard);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("select a client"))
        );

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Down, KeyCode::Enter]);
        let step = |view_data: &ViewData| view_data.wizard.as_ref().map(|ui| ui.wizard.step());
        assert_eq!(step(&view_data), Some(WizardStep::LoanDetails));

        type_text(&mut state, &mut runtime, &mut view_data, "10000");
        // purpose, then policy
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[
                KeyCode::Tab,
                KeyCode::Tab,
                KeyCode::Tab,
                KeyCode::Right,
                KeyCode::Tab,
                KeyCode::Right,
            ],
        );
        let ui = view_data.wizard.as_ref().expect("wizard open");
        assert!(render_wizard_overlay_text(ui).contains("monthly payment: $879.16"));

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert_eq!(step(&view_data), Some(WizardStep::Documents));
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert_eq!(step(&view_data), Some(WizardStep::Review));
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);

        assert_eq!(state.mode, AppMode::Nav);
        let (submission, editing) = runtime
            .applications_submitted
            .last()
            .expect("application submitted");
        assert!(editing.is_none());
        assert_eq!(submission.monthly_payment, dec!(879.16));
        assert_eq!(submission.credit_policy_id, PolicyId::new(7));
        assert_eq!(state.status_line.as_deref(), Some("application submitted"));
    }

    #[test]
    fn wizard_escape_steps_back_then_cancels() {
        let mut runtime = TestRuntime::with_applications();
        let (mut state, mut view_data) = loaded(TabKind::Applications, &mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[KeyCode::Char('a'), KeyCode::Down, KeyCode::Enter, KeyCode::Esc],
        );
        assert_eq!(
            view_data.wizard.as_ref().map(|ui| ui.wizard.step()),
            Some(WizardStep::Client)
        );
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Esc]);
        assert!(view_data.wizard.is_none());
        assert_eq!(state.mode, AppMode::Nav);
    }

    #[test]
    fn expired_session_routes_to_login_and_back() {
        let mut runtime = TestRuntime::with_agents(2);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);
        runtime.session_expired = true;

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('R')]);
        assert_eq!(state.mode, AppMode::Login);
        assert_eq!(
            state.status_line.as_deref(),
            Some("session expired -- log in again")
        );
        assert!(matches!(view_data.load, LoadState::Failed(_)));

        type_text(&mut state, &mut runtime, &mut view_data, "ana");
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Tab]);
        type_text(&mut state, &mut runtime, &mut view_data, "wrong");
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert_eq!(state.mode, AppMode::Login);
        assert!(view_data.login.password.is_empty());

        type_text(&mut state, &mut runtime, &mut view_data, "s3cret");
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(state.signed_in_as.as_deref(), Some("ana"));
        assert_eq!(view_data.records.len(), 2);
    }

    #[test]
    fn help_overlay_toggles_and_hides_status() {
        let mut runtime = TestRuntime::with_agents(1);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('?')]);
        assert!(view_data.help_visible);
        assert!(status_text(&state, &view_data).is_empty());
        assert!(help_overlay_text().contains("v review application"));

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('?')]);
        assert!(!view_data.help_visible);
        assert!(status_text(&state, &view_data).starts_with("NAV | help hidden"));
    }

    #[test]
    fn stale_status_clear_tokens_are_ignored() {
        let mut state = AppState::default();
        let mut view_data = view_data_for_test();
        let (tx, rx) = mpsc::channel();

        state.status_line = Some("saved".to_owned());
        view_data.status_token = 2;
        tx.send(InternalEvent::ClearStatus { token: 1 })
            .expect("send stale token");
        process_internal_events(&mut state, &mut view_data, &rx);
        assert_eq!(state.status_line.as_deref(), Some("saved"));

        tx.send(InternalEvent::ClearStatus { token: 2 })
            .expect("send current token");
        process_internal_events(&mut state, &mut view_data, &rx);
        assert!(state.status_line.is_none());
    }

    #[test]
    fn load_failure_is_presented_in_place_of_rows() {
        let mut runtime = TestRuntime::with_agents(2);
        runtime.session_expired = true;
        let state = AppState {
            active_tab: TabKind::Agents,
            ..AppState::default()
        };
        let mut view_data = view_data_for_test();
        assert!(refresh_view_data(&state, &mut runtime, &mut view_data).is_err());
        assert_eq!(
            view_data.load_error(),
            Some("session expired -- log in again")
        );
        assert!(view_data.records.is_empty());
    }

    #[test]
    fn logout_returns_to_login_and_blocks_loads() {
        let mut runtime = TestRuntime::with_agents(2);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);
        state.signed_in_as = Some("ana".to_owned());

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('L')]);
        assert!(!runtime.signed_in);
        assert_eq!(state.mode, AppMode::Login);
        assert!(state.signed_in_as.is_none());
        assert!(view_data.records.is_empty());

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Esc]);
        assert_eq!(state.mode, AppMode::Nav);
        let error = refresh_view_data(&state, &mut runtime, &mut view_data)
            .expect_err("signed-out load should fail");
        assert_eq!(session_error(&error), Some(&SessionError::SignedOut));

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('R')]);
        assert_eq!(state.mode, AppMode::Login);
        assert_eq!(
            state.status_line.as_deref(),
            Some("not signed in -- log in and retry")
        );

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Tab]);
        type_text(&mut state, &mut runtime, &mut view_data, "s3cret");
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(view_data.records.len(), 2);
    }

    #[test]
    fn enter_opens_application_detail_and_esc_closes_it() {
        let mut runtime = TestRuntime::with_applications();
        runtime.applications[0].set("term", json!(12));
        runtime.applications[0].set("interestRate", json!(10));
        runtime.applications[0].set("reviewComments", json!("needs payslip"));
        runtime.applications[0].set("reviewedAt", json!("2026-01-11T08:30:00Z"));
        let (mut state, mut view_data) = loaded(TabKind::Applications, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        let detail = view_data.detail.as_ref().expect("detail overlay open");
        assert_eq!(detail.detail.title, "application 1");
        assert_eq!(detail.detail.value("loan", "payment"), Some("$1,054.99"));
        assert_eq!(detail.detail.value("review", "comments"), Some("needs payslip"));
        assert_eq!(status_text(&state, &view_data), "DETAIL | j/k scroll | g top | esc close");

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('j'), KeyCode::Char('j')]);
        assert_eq!(view_data.detail.as_ref().map(|ui| ui.scroll), Some(2));
        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('q')]);
        assert!(view_data.detail.is_none());
        assert_eq!(state.mode, AppMode::Nav);
    }

    #[test]
    fn detail_on_empty_list_reports_no_selection() {
        let mut runtime = TestRuntime::with_agents(0);
        let (mut state, mut view_data) = loaded(TabKind::Agents, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Enter]);
        assert!(view_data.detail.is_none());
        assert_eq!(state.status_line.as_deref(), Some("no row selected"));
    }

    #[test]
    fn dashboard_overlay_shows_status_counts() {
        let mut runtime = TestRuntime::with_applications();
        let (mut state, mut view_data) = loaded(TabKind::Applications, &mut runtime);

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Char('D')]);
        let detail = view_data.detail.as_ref().expect("dashboard overlay open");
        assert_eq!(detail.detail.title, "dashboard");
        assert_eq!(detail.detail.value("overview", "conversion"), Some("50%"));
        assert_eq!(detail.detail.value("applications by status", "pending"), Some("1"));

        press(&mut state, &mut runtime, &mut view_data, &[KeyCode::Esc]);
        assert!(view_data.detail.is_none());
        assert!(help_overlay_text().contains("D dashboard"));
    }
}
