// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, FormKind, StatusFilter, TabKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_tab: TabKind,
    pub status_filter: StatusFilter,
    pub signed_in_as: Option<String>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_tab: TabKind::Applications,
            status_filter: StatusFilter::All,
            signed_in_as: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    SelectTab(TabKind),
    EnterSearch,
    ExitToNav,
    OpenForm(FormKind),
    OpenWizard,
    OpenLogin,
    CycleStatusFilter,
    SignedIn(String),
    SessionEnded(String),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    TabChanged(TabKind),
    StatusFilterChanged(StatusFilter),
    SessionChanged(Option<String>),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::SelectTab(tab) => {
                if self.active_tab == tab {
                    return Vec::new();
                }
                self.active_tab = tab;
                vec![AppEvent::TabChanged(tab)]
            }
            AppCommand::EnterSearch => self.set_mode(AppMode::Search),
            AppCommand::ExitToNav => self.set_mode(AppMode::Nav),
            AppCommand::OpenForm(kind) => self.set_mode(AppMode::Form(kind)),
            AppCommand::OpenWizard => self.set_mode(AppMode::Wizard),
            AppCommand::OpenLogin => self.set_mode(AppMode::Login),
            AppCommand::CycleStatusFilter => {
                if self.active_tab != TabKind::Applications {
                    return vec![self.set_status("status filter applies to applications")];
                }
                self.status_filter = self.status_filter.next();
                let label = format!("status: {}", self.status_filter.label());
                vec![
                    AppEvent::StatusFilterChanged(self.status_filter),
                    self.set_status(&label),
                ]
            }
            AppCommand::SignedIn(name) => {
                self.signed_in_as = Some(name.clone());
                let mut events = vec![AppEvent::SessionChanged(Some(name.clone()))];
                if self.mode == AppMode::Login {
                    events.extend(self.set_mode(AppMode::Nav));
                }
                events.push(self.set_status(&format!("signed in as {name}")));
                events
            }
            AppCommand::SessionEnded(reason) => {
                self.signed_in_as = None;
                let mut events = vec![AppEvent::SessionChanged(None)];
                events.extend(self.set_mode(AppMode::Login));
                events.push(self.set_status(&reason));
                events
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = TabKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_tab = tabs[next];
        vec![AppEvent::TabChanged(self.active_tab)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState};
    use crate::{AppMode, ApplicationStatus, FormKind, StatusFilter, TabKind};

    #[test]
    fn tab_rotation_wraps() {
        let mut state = AppState {
            active_tab: TabKind::Policies,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextTab);
        assert_eq!(state.active_tab, TabKind::Agents);
        assert_eq!(events, vec![AppEvent::TabChanged(TabKind::Agents)]);

        state.dispatch(AppCommand::PrevTab);
        assert_eq!(state.active_tab, TabKind::Policies);
    }

    #[test]
    fn selecting_current_tab_is_silent() {
        let mut state = AppState::default();
        assert!(state.dispatch(AppCommand::SelectTab(state.active_tab)).is_empty());
        assert_eq!(
            state.dispatch(AppCommand::SelectTab(TabKind::Clients)),
            vec![AppEvent::TabChanged(TabKind::Clients)]
        );
    }

    #[test]
    fn status_filter_only_cycles_on_applications() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::CycleStatusFilter);
        assert_eq!(
            state.status_filter,
            StatusFilter::Only(ApplicationStatus::Pending)
        );
        assert_eq!(
            events,
            vec![
                AppEvent::StatusFilterChanged(StatusFilter::Only(ApplicationStatus::Pending)),
                AppEvent::StatusUpdated("status: pending".to_owned()),
            ]
        );

        state.dispatch(AppCommand::SelectTab(TabKind::Agents));
        let events = state.dispatch(AppCommand::CycleStatusFilter);
        assert_eq!(
            events,
            vec![AppEvent::StatusUpdated(
                "status filter applies to applications".to_owned()
            )]
        );
        assert_eq!(
            state.status_filter,
            StatusFilter::Only(ApplicationStatus::Pending)
        );
    }

    #[test]
    fn mode_transitions() {
        let mut state = AppState::default();

        state.dispatch(AppCommand::EnterSearch);
        assert_eq!(state.mode, AppMode::Search);

        state.dispatch(AppCommand::OpenForm(FormKind::Client));
        assert_eq!(state.mode, AppMode::Form(FormKind::Client));

        state.dispatch(AppCommand::OpenWizard);
        assert_eq!(state.mode, AppMode::Wizard);

        let events = state.dispatch(AppCommand::ExitToNav);
        assert_eq!(events, vec![AppEvent::ModeChanged(AppMode::Nav)]);
        assert!(state.dispatch(AppCommand::ExitToNav).is_empty());
    }

    #[test]
    fn session_end_routes_to_login_and_sign_in_returns_to_nav() {
        let mut state = AppState::default();

        let ended = state.dispatch(AppCommand::SessionEnded(
            "session expired -- log in again".to_owned(),
        ));
        assert_eq!(state.mode, AppMode::Login);
        assert_eq!(
            ended,
            vec![
                AppEvent::SessionChanged(None),
                AppEvent::ModeChanged(AppMode::Login),
                AppEvent::StatusUpdated("session expired -- log in again".to_owned()),
            ]
        );

        state.dispatch(AppCommand::SignedIn("ana".to_owned()));
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(state.signed_in_as.as_deref(), Some("ana"));
        assert_eq!(state.status_line.as_deref(), Some("signed in as ana"));
    }

    #[test]
    fn clear_status() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetStatus("saved".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("saved"));
        assert_eq!(
            state.dispatch(AppCommand::ClearStatus),
            vec![AppEvent::StatusCleared]
        );
        assert!(state.status_line.is_none());
    }
}
