//! Request cookies and `Set-Cookie` construction.

use std::collections::HashMap;
use std::fmt;

use http::{header, HeaderMap, HeaderValue};

use crate::error::ExtractError;

/// Cookies sent with a request.
///
/// # Example
///
/// ```rust
/// use http::{header, HeaderMap, HeaderValue};
/// use vibefeeder_extract::Cookies;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_static("csrf_token=abc; theme=dark"));
///
/// let cookies = Cookies::from_headers(&headers).unwrap();
/// assert_eq!(cookies.get("csrf_token"), Some("abc"));
/// assert_eq!(cookies.get("theme"), Some("dark"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    /// Parses every `Cookie` header in `headers`. Pairs without `=` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidHeader`] if a header is not valid text.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ExtractError> {
        let mut jar = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let value = value
                .to_str()
                .map_err(|_| ExtractError::InvalidHeader("Cookie"))?;
            let pairs = value
                .split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .map(|(name, value)| (name.trim(), value.trim().trim_matches('"')));
            for (name, value) in pairs {
                // Browsers send the most specific path first.
                jar.entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        Ok(Self(jar))
    }

    /// Value of the cookie called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of distinct cookie names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the request carried no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Sent on cross-site requests too. Browsers require `Secure` with it.
    None,
    /// Sent on top-level cross-site navigations.
    Lax,
    /// Same-site requests only.
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::Lax => "Lax",
            Self::Strict => "Strict",
        })
    }
}

/// A `Set-Cookie` header under construction.
///
/// # Example
///
/// ```rust
/// use vibefeeder_extract::{SameSite, SetCookie};
///
/// let cookie = SetCookie::new("csrf_token", "abc123")
///     .path("/")
///     .http_only(true)
///     .same_site(SameSite::Strict)
///     .max_age_secs(86400);
///
/// assert_eq!(
///     cookie.to_string(),
///     "csrf_token=abc123; Path=/; Max-Age=86400; HttpOnly; SameSite=Strict"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: String,
    value: String,
    path: Option<String>,
    max_age_secs: Option<u64>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    /// Starts a cookie with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            max_age_secs: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// `Path` attribute.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// `Max-Age` in seconds.
    #[must_use]
    pub const fn max_age_secs(mut self, seconds: u64) -> Self {
        self.max_age_secs = Some(seconds);
        self
    }

    /// `Secure` flag.
    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// `HttpOnly` flag.
    #[must_use]
    pub const fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// `SameSite` attribute.
    #[must_use]
    pub const fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// The header value, or `None` if the name or value holds bytes a
    /// header cannot carry.
    #[must_use]
    pub fn to_header(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.to_string()).ok()
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(secs) = self.max_age_secs {
            write!(f, "; Max-Age={secs}")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={same_site}")?;
        }
        Ok(())
    }
}
