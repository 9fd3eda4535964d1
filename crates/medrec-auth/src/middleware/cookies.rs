//! Session cookie construction and extraction.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::OffsetDateTime;

use crate::config::CookieConfig;

impl CookieConfig {
    /// Cookie carrying a freshly issued session token.
    #[must_use]
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        Cookie::build((self.name.clone(), token))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .max_age(time::Duration::seconds(max_age))
            .build()
    }

    /// Cookie that makes the browser drop the session cookie.
    ///
    /// Attributes must match the ones the cookie was set with, or browsers
    /// keep the original.
    #[must_use]
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), ""))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .max_age(time::Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }

    /// Reads the session token from the request's `Cookie` headers.
    #[must_use]
    pub fn read_token(&self, headers: &HeaderMap) -> Option<String> {
        CookieJar::from_headers(headers)
            .get(&self.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }
}
