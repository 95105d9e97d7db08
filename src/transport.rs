use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;

use crate::error::{Result, TransportError, UPSError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Status line and text body of one HTTP exchange with the card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Reply {
        Reply {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// The card answers 401/403 both for bad credentials and for a stale
    /// `sessACT` token.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// The HTTP seam of the client. Every call carries the basic-auth
/// credentials; paths are relative to the card's base URL.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        credentials: &Credentials,
    ) -> std::result::Result<Reply, TransportError>;

    fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
        credentials: &Credentials,
    ) -> std::result::Result<Reply, TransportError>;
}

/// Blocking reqwest transport talking to a real card.
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration, accept_invalid_certs: bool) -> Result<HttpTransport> {
        let base_url = normalise_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(TransportError::from)?;

        Ok(HttpTransport { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn finish(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> std::result::Result<Reply, TransportError> {
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!("<- HTTP {} ({} bytes)", status, body.len());
        Ok(Reply { status, body })
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        credentials: &Credentials,
    ) -> std::result::Result<Reply, TransportError> {
        debug!("-> GET {}{}", self.base_url, path);
        let request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&credentials.username, Some(&credentials.password))
            .query(query);
        self.finish(request)
    }

    fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
        credentials: &Credentials,
    ) -> std::result::Result<Reply, TransportError> {
        debug!("-> POST {}{}", self.base_url, path);
        let request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .basic_auth(&credentials.username, Some(&credentials.password))
            .form(form);
        self.finish(request)
    }
}

/// Accepts `host`, `host:port` or a full URL and returns it with a scheme
/// and without a trailing slash.
pub fn normalise_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UPSError::InvalidUrl(raw.to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|_| UPSError::InvalidUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(UPSError::InvalidUrl(raw.to_string()));
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_base_url() {
        assert_eq!(
            normalise_base_url("192.168.1.100").unwrap(),
            "http://192.168.1.100"
        );
        assert_eq!(
            normalise_base_url("https://ups.local:8443/").unwrap(),
            "https://ups.local:8443"
        );
        assert_eq!(
            normalise_base_url(" http://10.0.0.5// ").unwrap(),
            "http://10.0.0.5"
        );
    }

    #[test]
    fn test_normalise_base_url_rejects_garbage() {
        assert!(matches!(
            normalise_base_url(""),
            Err(UPSError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalise_base_url("ftp://ups.local"),
            Err(UPSError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalise_base_url("http://"),
            Err(UPSError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("admin", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_reply_classification() {
        assert!(Reply::new(200, "").is_ok());
        assert!(Reply::new(401, "").is_unauthorized());
        assert!(Reply::new(403, "").is_unauthorized());
        assert!(!Reply::new(500, "").is_unauthorized());
        assert!(!Reply::new(500, "").is_ok());
    }
}
