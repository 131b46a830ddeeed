//! Credential cookie construction.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};

use crate::domain::ports::IssuedCredential;

/// Name of the cookie carrying the signed credential.
pub const TOKEN_COOKIE: &str = "token";

/// Attributes applied to the credential cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    secure: bool,
    max_age_secs: i64,
}

impl CookiePolicy {
    /// Build a policy; `max_age_secs` should match the credential lifetime.
    pub const fn new(secure: bool, max_age_secs: i64) -> Self {
        Self {
            secure,
            max_age_secs,
        }
    }

    /// Whether cookies are marked `Secure`.
    pub const fn secure(&self) -> bool {
        self.secure
    }

    /// Cookie carrying `credential`.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use warden::domain::ports::IssuedCredential;
    /// use warden::inbound::http::cookies::{CookiePolicy, TOKEN_COOKIE};
    ///
    /// let policy = CookiePolicy::new(true, 900);
    /// let cookie = policy.credential_cookie(&IssuedCredential {
    ///     token: "abc".to_owned(),
    ///     expires_at: Utc::now(),
    /// });
    /// assert_eq!(cookie.name(), TOKEN_COOKIE);
    /// assert_eq!(cookie.http_only(), Some(true));
    /// ```
    pub fn credential_cookie(&self, credential: &IssuedCredential) -> Cookie<'static> {
        self.base(credential.token.clone())
            .max_age(CookieDuration::seconds(self.max_age_secs))
            .finish()
    }

    /// Cookie instructing the browser to drop the credential.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new()).finish();
        cookie.make_removal();
        cookie
    }

    fn base(&self, value: String) -> actix_web::cookie::CookieBuilder<'static> {
        Cookie::build(TOKEN_COOKIE, value)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
    }
}
