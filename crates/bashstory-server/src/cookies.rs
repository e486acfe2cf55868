//! Minimal cookie handling for the session side channel.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;

/// Value of the cookie called `name`, if the request carries one.
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value for the session token. Scripts cannot read it.
pub fn session(name: &str, token: &str, max_age_secs: u64) -> String {
    format!("{name}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value for the theme colour. Readable by the page.
pub fn theme(name: &str, color: &str, max_age_secs: u64) -> String {
    format!("{name}={color}; Path=/; Max-Age={max_age_secs}; SameSite=Lax")
}

/// `Set-Cookie` value that deletes `name`.
pub fn expired(name: &str, http_only: bool) -> String {
    let flag = if http_only { "; HttpOnly" } else { "" };
    format!("{name}=; Path=/; Max-Age=0{flag}; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for v in values {
            h.append(COOKIE, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn finds_named_cookie() {
        let h = headers(&["theme_color=#FFFFFF; session_token=abc123"]);
        assert_eq!(get(&h, "session_token").as_deref(), Some("abc123"));
        assert_eq!(get(&h, "theme_color").as_deref(), Some("#FFFFFF"));
        assert_eq!(get(&h, "missing"), None);
    }

    #[test]
    fn searches_every_cookie_header() {
        let h = headers(&["a=1", "session_token=t"]);
        assert_eq!(get(&h, "session_token").as_deref(), Some("t"));
    }

    #[test]
    fn empty_value_is_absent() {
        let h = headers(&["session_token="]);
        assert_eq!(get(&h, "session_token"), None);
    }

    #[test]
    fn set_cookie_attributes() {
        let s = session("session_token", "ff00", 60);
        assert_eq!(s, "session_token=ff00; Path=/; Max-Age=60; HttpOnly; SameSite=Lax");
        assert!(!theme("theme_color", "#000000", 60).contains("HttpOnly"));
        assert_eq!(expired("theme_color", false), "theme_color=; Path=/; Max-Age=0; SameSite=Lax");
        assert!(expired("session_token", true).contains("Max-Age=0; HttpOnly"));
    }
}
