//! Router and the command endpoint.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::extract::{ConnectInfo, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bashstory_store::Store;
use bashstory_terminal::{Resolution, Resolver, SessionChange, identify};
use bashstory_types::config::ServerConfig;
use bashstory_types::error::Result;
use bashstory_types::protocol::{CommandOutcome, CommandRequest};

use crate::cookies;

/// Shared by every request. The resolver holds no per-session state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Box<dyn Store>>>,
    resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(store: Box<dyn Store>, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            resolver: Arc::new(Resolver::new(config)),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        self.resolver.config()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn resolve(&self, request: &CommandRequest, token: Option<&str>, ip: &str) -> Result<Resolution> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let session = identify(&**store, token, ip)?;
        self.resolver.resolve(request, &session, token, &mut **store)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/command", post(command))
        .with_state(state)
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
fn origin_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| peer.map(|ip| ip.to_string()))
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

fn set_cookie(response: &mut Response, value: String) {
    match HeaderValue::from_str(&value) {
        Ok(v) => {
            response.headers_mut().append(SET_COOKIE, v);
        },
        Err(e) => log::warn!("dropping unencodable cookie: {e}"),
    }
}

async fn command(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<CommandRequest>,
) -> Response {
    let started = Instant::now();
    let config = state.config();
    let token = cookies::get(&headers, &config.session_cookie);
    let ip = origin_ip(&headers, peer.map(|ConnectInfo(addr)| addr.ip()));

    let resolution = match state.resolve(&request, token.as_deref(), &ip) {
        Ok(r) => r,
        Err(e) => {
            // Never log the request itself: carried args may be secrets.
            log::error!("command failed (phase {}): {e}", request.phase);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CommandOutcome::internal_error()),
            )
                .into_response();
        },
    };

    let mut response = Json(&resolution.outcome).into_response();
    match resolution.session {
        SessionChange::Keep => {},
        SessionChange::Started(token) => {
            let value = cookies::session(&config.session_cookie, &token, config.session_max_age_secs);
            set_cookie(&mut response, value);
        },
        SessionChange::Ended => {
            set_cookie(&mut response, cookies::expired(&config.session_cookie, true));
            set_cookie(&mut response, cookies::expired(&config.theme_cookie, false));
        },
    }
    if let Some(color) = &resolution.outcome.theme_color {
        let value = cookies::theme(&config.theme_cookie, color, config.theme_max_age_secs);
        set_cookie(&mut response, value);
    }
    log::debug!("request from {ip} answered in {:?}", started.elapsed());
    response
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use bashstory_store::{
        MemoryStore, Quote, QuoteId, QuoteStatus, User, UserId, VoteDirection, VoteOutcome, Voter,
    };
    use bashstory_types::error::BashError;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        let store = MemoryStore::seeded().unwrap();
        router(AppState::new(Box::new(store), ServerConfig::default()))
    }

    fn post_json(body: &str, extra: &[(&str, &str)]) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri("/api/command")
            .header("content-type", "application/json");
        for (k, v) in extra {
            req = req.header(*k, *v);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    async fn call(app: &Router, body: &str, extra: &[(&str, &str)]) -> (StatusCode, Vec<String>, serde_json::Value) {
        let resp = app.clone().oneshot(post_json(body, extra)).await.unwrap();
        let status = resp.status();
        let cookies = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, cookies, json)
    }

    fn session_cookie(set: &[String]) -> String {
        let raw = set
            .iter()
            .find(|c| c.starts_with("session_token="))
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn unknown_command_is_ok() {
        let (status, cookies, json) = call(&app(), r#"{"command":"zzzz"}"#, &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(cookies.is_empty());
        assert_eq!(
            json["output"][0],
            "bash: command not found: zzzz. Type help for a list of commands."
        );
        assert_eq!(json["clear"], false);
        assert!(json.get("inputMode").is_none());
    }

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let app = app();
        let body = r#"{"command":"login","phase":"login-password","args":["admin","admin"]}"#;
        let (status, set, json) = call(&app, body, &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["newPrompt"], "admin@bashstory:~$ ");
        let raw = set.iter().find(|c| c.starts_with("session_token=")).unwrap();
        assert!(raw.contains("HttpOnly"));
        assert!(raw.contains("Max-Age=604800"));

        let cookie = session_cookie(&set);
        let (_, _, json) = call(&app, r#"{"command":"whoami"}"#, &[("cookie", cookie.as_str())]).await;
        assert_eq!(json["output"][0], "admin (moderator)");
    }

    #[tokio::test]
    async fn logout_expires_cookies() {
        let app = app();
        let body = r#"{"command":"login","phase":"login-password","args":["admin","admin"]}"#;
        let (_, set, _) = call(&app, body, &[]).await;
        let cookie = session_cookie(&set);

        let (_, set, json) = call(&app, r#"{"command":"logout"}"#, &[("cookie", cookie.as_str())]).await;
        assert_eq!(json["output"][0], "Goodbye!");
        assert!(set.iter().any(|c| c.starts_with("session_token=;") && c.contains("Max-Age=0")));
        assert!(set.iter().any(|c| c.starts_with("theme_color=;")));

        let (_, _, json) = call(&app, r#"{"command":"whoami"}"#, &[("cookie", cookie.as_str())]).await;
        assert_eq!(json["output"][0], "guest");
    }

    #[tokio::test]
    async fn theme_sets_readable_cookie() {
        let (_, set, json) = call(&app(), r#"{"command":"theme #00ff00"}"#, &[]).await;
        assert_eq!(json["themeColor"], "#00FF00");
        let theme = set.iter().find(|c| c.starts_with("theme_color=")).unwrap();
        assert!(theme.starts_with("theme_color=#00FF00;"));
        assert!(!theme.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn anonymous_votes_keyed_by_forwarded_ip() {
        let app = app();
        let vote = r#"{"command":"vote + 3"}"#;
        let a = [("x-forwarded-for", "198.51.100.1, 10.0.0.1")];
        let b = [("x-real-ip", "198.51.100.2")];
        let (_, _, json) = call(&app, vote, &a).await;
        assert_eq!(json["output"][0], "Vote counted. Current rating of quote #3: +1");
        let (_, _, json) = call(&app, vote, &a).await;
        assert_eq!(json["output"][0], "You have already voted for this quote.");
        let (_, _, json) = call(&app, vote, &b).await;
        assert_eq!(json["output"][0], "Vote counted. Current rating of quote #3: +2");
    }

    #[tokio::test]
    async fn submit_text_alias_accepted() {
        let app = app();
        let body = r#"{"command":"login","phase":"login-password","args":["admin","admin"]}"#;
        let (_, set, _) = call(&app, body, &[]).await;
        let cookie = session_cookie(&set);
        let body = r#"{"command":"submit","phase":"composition","submitText":"a brand new quote"}"#;
        let (_, _, json) = call(&app, body, &[("cookie", cookie.as_str())]).await;
        assert_eq!(json["output"][0], "Quote submitted for moderation (ID: #11).");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let resp = app().oneshot(post_json("{not json", &[])).await.unwrap();
        assert!(resp.status().is_client_error());
    }

    #[test]
    fn origin_ip_order() {
        let mut h = HeaderMap::new();
        let peer: IpAddr = "192.0.2.9".parse().unwrap();
        assert_eq!(origin_ip(&h, None), "127.0.0.1");
        assert_eq!(origin_ip(&h, Some(peer)), "192.0.2.9");
        h.insert("x-real-ip", HeaderValue::from_static("192.0.2.2"));
        assert_eq!(origin_ip(&h, Some(peer)), "192.0.2.2");
        h.insert("x-forwarded-for", HeaderValue::from_static(" 192.0.2.1 , 10.1.1.1"));
        assert_eq!(origin_ip(&h, Some(peer)), "192.0.2.1");
    }

    /// Every call is a storage fault.
    struct BrokenStore;

    fn down<T>() -> Result<T> {
        Err(BashError::Store("database unavailable".into()))
    }

    impl Store for BrokenStore {
        fn find_user(&self, _: &str) -> Result<Option<User>> {
            down()
        }
        fn create_user(&mut self, _: &str, _: &str) -> Result<User> {
            down()
        }
        fn verify_credentials(&self, _: &str, _: &str) -> Result<Option<User>> {
            down()
        }
        fn set_password(&mut self, _: UserId, _: &str) -> Result<()> {
            down()
        }
        fn create_session(&mut self, _: UserId) -> Result<String> {
            down()
        }
        fn session_user(&self, _: &str) -> Result<Option<User>> {
            down()
        }
        fn delete_session(&mut self, _: &str) -> Result<()> {
            down()
        }
        fn quote(&self, _: QuoteId) -> Result<Option<Quote>> {
            down()
        }
        fn quotes(&self, _: QuoteStatus, _: usize) -> Result<Vec<Quote>> {
            down()
        }
        fn search(&self, _: &str, _: usize) -> Result<Vec<Quote>> {
            down()
        }
        fn random_quote(&self) -> Result<Option<Quote>> {
            down()
        }
        fn insert_quote(&mut self, _: &str, _: UserId) -> Result<QuoteId> {
            down()
        }
        fn set_status(&mut self, _: QuoteId, _: QuoteStatus) -> Result<bool> {
            down()
        }
        fn vote(&mut self, _: QuoteId, _: &Voter, _: VoteDirection) -> Result<VoteOutcome> {
            down()
        }
    }

    #[tokio::test]
    async fn fault_becomes_generic_500() {
        let state = AppState::new(Box::new(BrokenStore), ServerConfig::default());
        let app = router(state.clone());
        let (status, _, json) = call(&app, r#"{"command":"ls"}"#, &[]).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({"output": ["Internal server error."], "clear": false}));

        let records = state.resolver().processes().snapshot();
        assert_eq!(records.len(), 1);
        assert!(state.resolver().processes().running().is_empty());

        // Commands that never touch the store still work.
        let (status, _, _) = call(&app, r#"{"command":"top"}"#, &[]).await;
        assert_eq!(status, StatusCode::OK);
    }
}
