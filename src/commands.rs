//! Command handlers. Each loads the persisted session, talks to the backend
//! through `HttpApi`, and prints results to stdout. Diagnostics go to stderr.

use std::collections::HashSet;

use client::catalog::{category_label, products_in};
use client::config::ClientConfig;
use client::map::renderer::displayed_count;
use client::map::{HeadlessMap, MapError, MapStatus};
use client::net::api::{HttpApi, ReportFilters};
use client::net::channel::ChannelEvent;
use client::state::app::AppState;
use client::state::reports::{DraftInput, VoteOutcome, build_draft};
use client::state::session::Session;
use client::util::format::now_ms;
use client::util::i18n::{Locale, translate};
use frames::{Category, Origin, PriceReport, VoteDirection};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::CliError;
use crate::output;

pub(crate) struct Context {
    pub config: ClientConfig,
    /// Explicit `--locale`; wins over the session preference.
    pub locale: Option<Locale>,
}

impl Context {
    fn session(&self) -> Result<Session, CliError> {
        Ok(Session::load(&self.config.session_file)?)
    }

    fn save(&self, session: &Session) -> Result<(), CliError> {
        Ok(session.save(&self.config.session_file)?)
    }

    fn locale(&self, session: &Session) -> Locale {
        self.locale.or(session.locale).unwrap_or(self.config.locale)
    }

    fn api(&self, session: &Session) -> Result<HttpApi, CliError> {
        Ok(HttpApi::from_config(&self.config)?.with_token(session.token().map(str::to_owned)))
    }

    fn app(&self, session: Session) -> AppState<HeadlessMap> {
        let mut app = AppState::new(self.config.clone(), session, HeadlessMap::new(), now_ms());
        if let Some(locale) = self.locale {
            app.set_locale(locale);
        }
        app
    }

    /// Session, backend client and application state, with reports fetched.
    async fn loaded(&self, filters: &ReportFilters) -> Result<(HttpApi, AppState<HeadlessMap>), CliError> {
        let session = self.session()?;
        let api = self.api(&session)?;
        let mut app = self.app(session);
        if let Err(e) = app.reports.fetch(&api, filters).await {
            debug!(error = %e, "showing bundled and cached reports only");
        }
        app.restore_dismissed_alerts();
        Ok((api, app))
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub(crate) async fn login(ctx: &Context, email: &str, password: &str) -> Result<(), CliError> {
    let mut session = ctx.session()?;
    let locale = ctx.locale(&session);
    let api = ctx.api(&session)?;
    match session.login(&api, email, password).await {
        Ok(user) => println!("{} ({})", translate(locale, "auth.login.success"), user.name),
        Err(e) => {
            eprintln!("{}", translate(locale, "auth.login.error"));
            return Err(e.into());
        }
    }
    ctx.save(&session)
}

pub(crate) async fn register(ctx: &Context, email: &str, password: &str, name: &str) -> Result<(), CliError> {
    let mut session = ctx.session()?;
    let locale = ctx.locale(&session);
    let api = ctx.api(&session)?;
    match session.register(&api, email, password, name).await {
        Ok(user) => println!("{} ({})", translate(locale, "auth.register.success"), user.name),
        Err(e) => {
            eprintln!("{}", translate(locale, "auth.register.error"));
            return Err(e.into());
        }
    }
    ctx.save(&session)
}

pub(crate) fn anon(ctx: &Context, name: Option<&str>) -> Result<(), CliError> {
    let mut session = ctx.session()?;
    let locale = ctx.locale(&session);
    let user = session.login_anonymous(name, now_ms());
    println!("{}: {}", translate(locale, "toast.anonymous"), user.name);
    if ctx.locale.is_some() {
        session.locale = ctx.locale;
    }
    ctx.save(&session)
}

pub(crate) async fn whoami(ctx: &Context) -> Result<(), CliError> {
    let mut session = ctx.session()?;
    if !session.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    if session.token().is_some() {
        let api = ctx.api(&session)?;
        let refreshed = session.refresh_user(&api).await.map(|_| ());
        match refreshed {
            Ok(()) => ctx.save(&session)?,
            Err(e) => debug!(error = %e, "showing cached user"),
        }
    }
    let user = session.user().ok_or(CliError::NotSignedIn)?;
    let kind = if user.is_anonymous { translate(ctx.locale(&session), "nav.anonymous") } else { user.email.as_str() };
    println!("{}  {}  {kind}", user.id, user.name);
    Ok(())
}

/// Sign out. `forget` deletes the session file, dropping locale and dismissed alerts too.
pub(crate) fn logout(ctx: &Context, forget: bool) -> Result<(), CliError> {
    let mut session = ctx.session()?;
    let locale = ctx.locale(&session);
    if forget {
        Session::clear(&ctx.config.session_file)?;
    } else {
        session.logout();
        ctx.save(&session)?;
    }
    println!("{}", translate(locale, "nav.logout"));
    Ok(())
}

// =============================================================================
// REPORTS
// =============================================================================

pub(crate) async fn list_reports(
    ctx: &Context,
    category: Option<Category>,
    wilaya: Option<String>,
    search: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let filters = ReportFilters { category, wilaya: wilaya.clone() };
    let (_, app) = ctx.loaded(&filters).await?;
    let wilaya = wilaya.map(|w| w.to_lowercase());
    let rows: Vec<&PriceReport> = app
        .reports
        .search(search.unwrap_or_default())
        .into_iter()
        .filter(|r| category.is_none_or(|c| r.category == c))
        .filter(|r| wilaya.as_deref().is_none_or(|w| r.city.to_lowercase() == w))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        output::print_reports(&rows, app.locale(), now_ms());
    }
    Ok(())
}

pub(crate) async fn add_report(ctx: &Context, input: &DraftInput) -> Result<(), CliError> {
    let (api, mut app) = ctx.loaded(&ReportFilters::default()).await?;
    let now = now_ms();
    let draft = build_draft(input, app.session.user(), now)?;
    let report = app.reports.create(&api, draft, now).await;
    let key = if report.origin == Origin::Local { "reports.addedOffline" } else { "reports.added" };
    println!("{}", translate(app.locale(), key));
    println!("{}", output::report_line(&report, app.locale(), now));
    Ok(())
}

pub(crate) async fn vote(ctx: &Context, id: &str, direction: VoteDirection) -> Result<(), CliError> {
    let (api, mut app) = ctx.loaded(&ReportFilters::default()).await?;
    let outcome = app
        .reports
        .vote(&api, id, direction)
        .await
        .ok_or_else(|| CliError::UnknownReport(id.to_owned()))?;
    let (VoteOutcome::Confirmed(counts) | VoteOutcome::Local(counts)) = outcome;
    let suffix = if matches!(outcome, VoteOutcome::Local(_)) { " (local)" } else { "" };
    println!("{}: +{}/-{}{suffix}", translate(app.locale(), "reports.voted"), counts.upvotes, counts.downvotes);
    Ok(())
}

pub(crate) async fn delete_report(ctx: &Context, id: &str) -> Result<(), CliError> {
    let (api, mut app) = ctx.loaded(&ReportFilters::default()).await?;
    if !app.reports.delete(&api, id).await? {
        return Err(CliError::UnknownReport(id.to_owned()));
    }
    println!("deleted {id}");
    Ok(())
}

pub(crate) async fn stats(ctx: &Context) -> Result<(), CliError> {
    let (_, app) = ctx.loaded(&ReportFilters::default()).await?;
    let locale = app.locale();
    for line in output::stats_lines(&app.reports.stats(), locale) {
        println!("{line}");
    }
    for (category, count) in app.reports.category_counts() {
        println!("  {}: {count}", category_label(category));
    }
    Ok(())
}

pub(crate) async fn alerts(ctx: &Context, dismiss: &[String]) -> Result<(), CliError> {
    let (_, mut app) = ctx.loaded(&ReportFilters::default()).await?;
    if !dismiss.is_empty() {
        for id in dismiss {
            if !app.dismiss_alert(id) {
                return Err(CliError::UnknownReport(id.clone()));
            }
        }
        let mut session = ctx.session()?;
        session.dismissed_alerts.clone_from(&app.session.dismissed_alerts);
        ctx.save(&session)?;
    }
    let locale = app.locale();
    let alerts = app.reports.alerts();
    println!("{} ({})", translate(locale, "alerts.title"), alerts.len());
    if alerts.is_empty() {
        println!("{}", translate(locale, "alerts.empty"));
    }
    let now = now_ms();
    for report in alerts {
        println!("{}", output::report_line(report, locale, now));
    }
    Ok(())
}

pub(crate) async fn watch(ctx: &Context, category: Option<Category>) -> Result<(), CliError> {
    let session = ctx.session()?;
    let api = ctx.api(&session)?;
    let mut app = ctx.app(session);
    let filters = ReportFilters { category, wilaya: None };
    let mut seen: HashSet<String> = HashSet::new();
    let mut ticker = tokio::time::interval(ctx.config.refresh_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        if let Err(e) = app.reports.fetch(&api, &filters).await {
            eprintln!("{e}");
        }
        let now = now_ms();
        let locale = app.locale();
        for report in app.reports.filtered(category) {
            if seen.insert(report.id.clone()) {
                println!("{}", output::report_line(report, locale, now));
            }
        }
    }
    app.shutdown().await;
    Ok(())
}

pub(crate) fn catalog(ctx: &Context, category: Option<Category>) -> Result<(), CliError> {
    let locale = ctx.locale(&ctx.session()?);
    let categories = match category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };
    for category in categories {
        println!("{}", category_label(category));
        for product in products_in(category) {
            println!("{}", output::product_line(product, locale));
        }
    }
    Ok(())
}

// =============================================================================
// MAP
// =============================================================================

pub(crate) async fn map(ctx: &Context, category: Option<Category>, zoom: u8) -> Result<(), CliError> {
    let (_, mut app) = ctx.loaded(&ReportFilters { category, wilaya: None }).await?;
    let locale = app.locale();
    if app.mount_map() != MapStatus::Ready {
        eprintln!("{}", translate(locale, "map.error"));
        let error = app.map.last_error().cloned().unwrap_or_else(|| MapError::Backend("not ready".to_owned()));
        app.shutdown().await;
        return Err(error.into());
    }
    app.category = category;
    app.redraw_map().await;

    if let Some(overlay) = app.map.overlay() {
        for cluster in app.map.backend().clusters(overlay, zoom) {
            println!("{}", output::cluster_line(&cluster));
        }
    }
    println!(
        "{}: {}",
        translate(locale, "map.displayed"),
        displayed_count(app.reports.reports(), app.category)
    );
    app.shutdown().await;
    Ok(())
}

// =============================================================================
// CHAT
// =============================================================================

pub(crate) async fn chat(ctx: &Context) -> Result<(), CliError> {
    let session = ctx.session()?;
    let mut app = ctx.app(session);
    let locale = app.locale();
    let chat = app.connect_chat().await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = chat.next_event() => {
                let Some(event) = event else { break };
                match event {
                    ChannelEvent::Status(status) => eprintln!("{}", translate(locale, status.label_key())),
                    ChannelEvent::History(_) => {
                        let snapshot = chat.snapshot();
                        if snapshot.messages.is_empty() {
                            println!("{}", translate(locale, "chat.noMessages"));
                        }
                        let now = now_ms();
                        for message in &snapshot.messages {
                            println!("{}", output::chat_line(message, locale, now));
                        }
                    }
                    ChannelEvent::Message(message) => println!("{}", output::chat_line(&message, locale, now_ms())),
                    ChannelEvent::Removed(id) => eprintln!("- {id}"),
                    ChannelEvent::Notice(text) => eprintln!("! {text}"),
                    ChannelEvent::ReconnectIn(delay) => eprintln!("reconnecting in {} ms", delay.as_millis()),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line == "/quit" {
                    break;
                }
                if let Some(id) = line.strip_prefix("/delete ") {
                    chat.delete_message(id.trim());
                } else if !line.is_empty() {
                    chat.send(line);
                }
            }
        }
    }
    app.shutdown().await;
    Ok(())
}
