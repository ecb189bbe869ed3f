//! Application state: one explicit owner for every long-lived component.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AppState` is built once by the binary and passed down by reference. It
//! owns the report store, the map renderer, the session and the chat
//! channel handle, and resolves the active locale from the session
//! preference, falling back to configuration.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::{Arc, Mutex, PoisonError};

use frames::{Category, PriceReport};
use tracing::info;

use crate::catalog::seed_reports;
use crate::config::ClientConfig;
use crate::map::{BatchProgress, MapBackend, MapSettings, MapStatus, MarkerRenderer};
use crate::net::channel::{ChannelConfig, ChannelHandle, spawn_channel};
use crate::state::reports::ReportStore;
use crate::state::session::Session;
use crate::util::i18n::Locale;

pub struct AppState<B: MapBackend> {
    pub config: ClientConfig,
    pub session: Session,
    pub reports: ReportStore,
    pub map: MarkerRenderer<B>,
    /// Category filter shared by the map and the report list.
    pub category: Option<Category>,
    selected: Arc<Mutex<Option<String>>>,
    chat: Option<ChannelHandle>,
    /// Token the running chat channel authenticated with.
    chat_token: Option<String>,
}

impl<B: MapBackend> AppState<B> {
    /// Wire up the components. The map is not mounted until [`mount_map`](Self::mount_map).
    #[must_use]
    pub fn new(config: ClientConfig, session: Session, backend: B, now_ms: i64) -> Self {
        let selected: Arc<Mutex<Option<String>>> = Arc::default();
        let mut map = MarkerRenderer::new(backend, MapSettings::default());
        let sink = Arc::clone(&selected);
        map.set_on_select(Arc::new(move |report: &PriceReport| {
            let mut slot = sink.lock().unwrap_or_else(PoisonError::into_inner);
            *slot = Some(report.id.clone());
        }));
        let locale = session.locale.unwrap_or(config.locale);
        map.set_locale(locale);

        Self {
            config,
            session,
            reports: ReportStore::new(seed_reports(now_ms)),
            map,
            category: None,
            selected,
            chat: None,
            chat_token: None,
        }
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.session.locale.unwrap_or(self.config.locale)
    }

    /// Store the preference in the session and apply it to new markers.
    pub fn set_locale(&mut self, locale: Locale) {
        self.session.locale = Some(locale);
        self.map.set_locale(locale);
    }

    /// Id of the report whose marker was clicked last.
    #[must_use]
    pub fn selected_report(&self) -> Option<String> {
        self.selected.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn mount_map(&mut self) -> MapStatus {
        self.map.initialize()
    }

    /// Redraw the map with the current reports and category filter.
    pub async fn redraw_map(&mut self) -> BatchProgress {
        self.map.redraw_all(self.reports.reports(), self.category).await
    }

    /// Hide an alert now and in later sessions. Returns `false` for ids that
    /// are not abnormal reports.
    pub fn dismiss_alert(&mut self, id: &str) -> bool {
        if self.reports.dismiss_alert(id) {
            self.session.dismissed_alerts.insert(id.to_owned());
            true
        } else {
            self.session.dismissed_alerts.contains(id)
        }
    }

    /// Hide the alerts remembered in the session. Call after each fetch.
    pub fn restore_dismissed_alerts(&mut self) {
        for id in &self.session.dismissed_alerts {
            self.reports.dismiss_alert(id);
        }
    }

    /// Start the chat channel with the session token.
    ///
    /// A running channel is reused while the token is unchanged; after a
    /// login or logout it is torn down and reconnected with the new token.
    pub async fn connect_chat(&mut self) -> &mut ChannelHandle {
        let token = self.session.token().map(str::to_owned);
        let config = ChannelConfig::from_client(&self.config, token.as_deref());
        let handle = match self.chat.take() {
            Some(handle) if self.chat_token == token => handle,
            Some(handle) => {
                info!(url = config.redacted_url(), has_token = token.is_some(), "session token changed; reconnecting chat");
                handle.restart(config).await
            }
            None => {
                info!(url = config.redacted_url(), has_token = token.is_some(), "connecting chat channel");
                spawn_channel(config)
            }
        };
        self.chat_token = token;
        self.chat.insert(handle)
    }

    pub fn chat_mut(&mut self) -> Option<&mut ChannelHandle> {
        self.chat.as_mut()
    }

    /// Tear down the map and close the chat channel.
    pub async fn shutdown(mut self) {
        self.map.teardown();
        if let Some(chat) = self.chat.take() {
            chat.shutdown().await;
        }
    }
}
