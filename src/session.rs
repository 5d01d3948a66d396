//! Session cookies carrying core API tokens.
//!
//! Reads come from the incoming request. Writes only work where a response is
//! being assembled; anywhere else a write is dropped with a debug log instead of
//! failing the caller.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::core_api::{OauthLoginResponse, OauthRegistrationComplete};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CookieError {
    #[error("cookies cannot be modified in this context")]
    ReadOnly,
}

/// Minimal cookie storage interface.
pub trait CookieStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, cookie: Cookie<'static>) -> Result<(), CookieError>;
    fn remove(&mut self, name: &str) -> Result<(), CookieError>;
}

/// Cookies of a request that is only being read.
pub struct RequestCookies<'a> {
    req: &'a HttpRequest,
}

impl<'a> RequestCookies<'a> {
    pub fn new(req: &'a HttpRequest) -> Self {
        Self { req }
    }
}

impl CookieStore for RequestCookies<'_> {
    fn get(&self, name: &str) -> Option<String> {
        self.req.cookie(name).map(|c| c.value().to_string())
    }

    fn set(&mut self, _cookie: Cookie<'static>) -> Result<(), CookieError> {
        Err(CookieError::ReadOnly)
    }

    fn remove(&mut self, _name: &str) -> Result<(), CookieError> {
        Err(CookieError::ReadOnly)
    }
}

/// Request cookies plus pending changes to apply on the response.
pub struct ResponseCookies<'a> {
    req: &'a HttpRequest,
    pending: Vec<Cookie<'static>>,
}

impl<'a> ResponseCookies<'a> {
    pub fn new(req: &'a HttpRequest) -> Self {
        Self {
            req,
            pending: Vec::new(),
        }
    }

    /// Changes to attach with `HttpResponseBuilder::cookie`.
    pub fn into_cookies(self) -> Vec<Cookie<'static>> {
        self.pending
    }

    fn replace(&mut self, cookie: Cookie<'static>) {
        self.pending.retain(|c| c.name() != cookie.name());
        self.pending.push(cookie);
    }
}

impl CookieStore for ResponseCookies<'_> {
    fn get(&self, name: &str) -> Option<String> {
        match self.pending.iter().find(|c| c.name() == name) {
            Some(c) if c.max_age() == Some(Duration::ZERO) => None,
            Some(c) => Some(c.value().to_string()),
            None => self.req.cookie(name).map(|c| c.value().to_string()),
        }
    }

    fn set(&mut self, cookie: Cookie<'static>) -> Result<(), CookieError> {
        self.replace(cookie);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), CookieError> {
        let mut removal = Cookie::build(name.to_string(), "").path("/").finish();
        removal.make_removal();
        self.replace(removal);
        Ok(())
    }
}

/// Attributes applied to every session cookie.
#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

/// Token cookie bridge over any [`CookieStore`]. Failed mutations are no-ops.
pub struct SessionCookies<S> {
    store: S,
    options: CookieOptions,
}

impl<S: CookieStore> SessionCookies<S> {
    pub fn new(store: S, options: CookieOptions) -> Self {
        Self { store, options }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.store.get(name)
    }

    pub fn set(&mut self, name: &str, value: &str, max_age: Option<Duration>) {
        let mut builder = Cookie::build(name.to_string(), value.to_string())
            .path("/")
            .http_only(true)
            .secure(self.options.secure)
            .same_site(self.options.same_site);
        if let Some(age) = max_age {
            builder = builder.max_age(age);
        }
        if let Err(e) = self.store.set(builder.finish()) {
            debug!(cookie = name, error = %e, "ignoring cookie write");
        }
    }

    pub fn remove(&mut self, name: &str) {
        if let Err(e) = self.store.remove(name) {
            debug!(cookie = name, error = %e, "ignoring cookie removal");
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_COOKIE)
    }

    /// Persist whatever tokens a login produced. A pending registration only
    /// carries an access token, so any stale refresh token is dropped.
    pub fn store_login(&mut self, login: &OauthLoginResponse, now: DateTime<Utc>) {
        match login {
            OauthLoginResponse::Completed(done) => self.store_registration(done, now),
            OauthLoginResponse::RegistrationRequired(pending) => {
                self.set(
                    ACCESS_TOKEN_COOKIE,
                    &pending.access_token,
                    max_age_until(&pending.access_token_expire_at, now),
                );
                self.remove(REFRESH_TOKEN_COOKIE);
            }
        }
    }

    pub fn store_registration(&mut self, done: &OauthRegistrationComplete, now: DateTime<Utc>) {
        self.set(
            ACCESS_TOKEN_COOKIE,
            &done.access_token,
            max_age_until(&done.access_token_expire_at, now),
        );
        self.set(
            REFRESH_TOKEN_COOKIE,
            &done.refresh_token,
            max_age_until(&done.refresh_token_expire_at, now),
        );
    }

    pub fn clear_tokens(&mut self) {
        self.remove(ACCESS_TOKEN_COOKIE);
        self.remove(REFRESH_TOKEN_COOKIE);
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

/// Seconds left until an RFC 3339 expiry, clamped at zero. `None` when the
/// timestamp does not parse (the cookie then lives for the browser session).
pub fn max_age_until(expire_at: &str, now: DateTime<Utc>) -> Option<Duration> {
    let expires = DateTime::parse_from_rfc3339(expire_at.trim()).ok()?;
    let secs = (expires.with_timezone(&Utc) - now).num_seconds().max(0);
    Some(Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_api::OauthRegistrationRequired;
    use actix_web::test::TestRequest;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn completed() -> OauthLoginResponse {
        OauthLoginResponse::Completed(OauthRegistrationComplete {
            access_token: "at".into(),
            access_token_expire_at: "2024-05-01T01:00:00Z".into(),
            refresh_token: "rt".into(),
            refresh_token_expire_at: "2024-05-15T00:00:00+09:00".into(),
        })
    }

    #[test]
    fn read_only_store_reads_but_ignores_writes() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "existing"))
            .to_http_request();
        let mut session = SessionCookies::new(RequestCookies::new(&req), CookieOptions::default());

        assert_eq!(session.access_token().as_deref(), Some("existing"));
        session.store_login(&completed(), now());
        session.clear_tokens();
        assert_eq!(session.access_token().as_deref(), Some("existing"));
    }

    #[test]
    fn read_only_store_reports_mutation_as_disallowed() {
        let req = TestRequest::default().to_http_request();
        let mut store = RequestCookies::new(&req);
        assert_eq!(store.set(Cookie::new("a", "b")), Err(CookieError::ReadOnly));
        assert_eq!(store.remove("a"), Err(CookieError::ReadOnly));
    }

    #[test]
    fn completed_login_sets_both_token_cookies() {
        let req = TestRequest::default().to_http_request();
        let mut session = SessionCookies::new(ResponseCookies::new(&req), CookieOptions::default());
        session.store_login(&completed(), now());

        let cookies = session.into_inner().into_cookies();
        assert_eq!(cookies.len(), 2);
        let access = cookies.iter().find(|c| c.name() == ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(access.value(), "at");
        assert_eq!(access.max_age(), Some(Duration::hours(1)));
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(access.path(), Some("/"));

        let refresh = cookies.iter().find(|c| c.name() == REFRESH_TOKEN_COOKIE).unwrap();
        assert_eq!(refresh.max_age(), Some(Duration::days(14) - Duration::hours(9)));
    }

    #[test]
    fn pending_registration_sets_access_token_and_drops_refresh_token() {
        let req = TestRequest::default()
            .cookie(Cookie::new(REFRESH_TOKEN_COOKIE, "stale"))
            .to_http_request();
        let mut session = SessionCookies::new(ResponseCookies::new(&req), CookieOptions::default());
        session.store_login(
            &OauthLoginResponse::RegistrationRequired(OauthRegistrationRequired {
                access_token: "pending".into(),
                access_token_expire_at: "not a timestamp".into(),
            }),
            now(),
        );

        assert_eq!(session.access_token().as_deref(), Some("pending"));
        assert_eq!(session.get(REFRESH_TOKEN_COOKIE), None);

        let cookies = session.into_inner().into_cookies();
        let access = cookies.iter().find(|c| c.name() == ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(access.max_age(), None);
        let refresh = cookies.iter().find(|c| c.name() == REFRESH_TOKEN_COOKIE).unwrap();
        assert_eq!(refresh.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn repeated_writes_keep_only_the_latest_cookie() {
        let req = TestRequest::default().to_http_request();
        let mut session = SessionCookies::new(ResponseCookies::new(&req), CookieOptions::default());
        session.set(ACCESS_TOKEN_COOKIE, "one", None);
        session.set(ACCESS_TOKEN_COOKIE, "two", None);
        let cookies = session.into_inner().into_cookies();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value(), "two");
    }

    #[test]
    fn expired_tokens_get_zero_max_age() {
        assert_eq!(
            max_age_until("2024-04-30T00:00:00Z", now()),
            Some(Duration::ZERO)
        );
        assert_eq!(max_age_until("", now()), None);
    }
}
