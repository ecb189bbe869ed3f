use std::time::Duration;

use super::*;
use crate::map::HeadlessMap;

const NOW: i64 = 1_700_000_000_000;

fn app(session: Session) -> AppState<HeadlessMap> {
    AppState::new(ClientConfig::default(), session, HeadlessMap::new(), NOW)
}

#[test]
fn new_seeds_store_without_mounting_map() {
    let state = app(Session::default());
    assert!(!state.reports.reports().is_empty());
    assert_eq!(state.map.status(), MapStatus::Loading);
    assert_eq!(state.map.backend().maps_created(), 0);
}

#[test]
fn locale_prefers_session_then_config() {
    let mut state = app(Session::default());
    assert_eq!(state.locale(), Locale::Fr);
    state.set_locale(Locale::Ar);
    assert_eq!(state.locale(), Locale::Ar);
    assert_eq!(state.session.locale, Some(Locale::Ar));

    let remembered = app(Session { locale: Some(Locale::En), ..Session::default() });
    assert_eq!(remembered.locale(), Locale::En);
}

#[tokio::test]
async fn redraw_map_honours_category_and_click_selects() {
    let mut state = app(Session::default());
    assert_eq!(state.redraw_map().await, BatchProgress::Skipped);

    assert_eq!(state.mount_map(), MapStatus::Ready);
    state.category = Some(Category::Food);
    assert_eq!(state.redraw_map().await, BatchProgress::Complete);
    let expected = state.reports.filtered(Some(Category::Food)).len();
    assert_eq!(state.map.rendered_marker_count(), expected);

    let overlay = state.map.overlay().expect("overlay");
    let first = state.map.backend().markers(overlay)[0].report_id().to_owned();
    assert!(state.map.backend().click(overlay, &first));
    assert_eq!(state.selected_report(), Some(first));
}

#[tokio::test]
async fn shutdown_closes_chat_while_reconnecting() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let mut config = ClientConfig::default();
    config.ws_base_url = format!("ws://127.0.0.1:{port}/ws");
    config.reconnect.base_ms = 60_000;
    config.reconnect.max_ms = 60_000;
    let mut state = AppState::new(config, Session::default(), HeadlessMap::new(), NOW);
    state.mount_map();
    state.connect_chat().await;
    assert!(state.chat_mut().is_some());

    tokio::time::timeout(Duration::from_secs(5), state.shutdown()).await.expect("shutdown in time");
}

#[tokio::test]
async fn connect_chat_reconnects_when_token_changes() {
    use futures_util::StreamExt;
    use tokio::sync::mpsc;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (uri_tx, mut uris) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let uri_tx = uri_tx.clone();
            tokio::spawn(async move {
                let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    let _ = uri_tx.send(req.uri().to_string());
                    Ok(resp)
                };
                let Ok(mut ws) = accept_hdr_async(tcp, callback).await else { return };
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });

    let mut config = ClientConfig::default();
    config.ws_base_url = format!("ws://{addr}/ws");
    let session = Session { token: Some("old".to_owned()), ..Session::default() };
    let mut state = AppState::new(config, session, HeadlessMap::new(), NOW);

    state.connect_chat().await;
    let first = tokio::time::timeout(Duration::from_secs(5), uris.recv()).await.expect("first handshake");
    assert_eq!(first.as_deref(), Some("/ws/chat?token=old"));

    state.connect_chat().await;
    assert!(
        tokio::time::timeout(Duration::from_millis(300), uris.recv()).await.is_err(),
        "same token must reuse the running channel"
    );

    state.session.token = Some("new".to_owned());
    state.connect_chat().await;
    let second = tokio::time::timeout(Duration::from_secs(5), uris.recv()).await.expect("second handshake");
    assert_eq!(second.as_deref(), Some("/ws/chat?token=new"));

    tokio::time::timeout(Duration::from_secs(5), state.shutdown()).await.expect("shutdown in time");
}

#[test]
fn dismissed_alerts_carry_over_through_the_session() {
    let mut state = app(Session::default());
    let id = state.reports.alerts()[0].id.clone();
    assert!(state.dismiss_alert(&id));
    assert!(state.dismiss_alert(&id));
    assert!(!state.dismiss_alert("missing"));
    assert!(state.session.dismissed_alerts.contains(&id));

    let mut next = app(state.session.clone());
    assert!(next.reports.alerts().iter().any(|r| r.id == id));
    next.restore_dismissed_alerts();
    assert!(next.reports.alerts().iter().all(|r| r.id != id));
}
