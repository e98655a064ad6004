use std::time::Duration;

use url::Url;

mod error;

pub use error::NetError;

/// Knobs for the HTTP client. `Default` leaves every value to reqwest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchConfig {
    /// `None` keeps the client's own default timeout.
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
    /// Ignore `HTTP_PROXY` and friends and always connect directly.
    pub no_proxy: bool,
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }
}

/// One blocking GET that yields the full response body.
///
/// Implementations are called from worker threads, never from the thread
/// that asked for the fetch.
pub trait Fetcher: Send + Sync + 'static {
    fn get(&self, url: &Url) -> Result<Vec<u8>, NetError>;
}

impl<F> Fetcher for F
where
    F: Fn(&Url) -> Result<Vec<u8>, NetError> + Send + Sync + 'static,
{
    fn get(&self, url: &Url) -> Result<Vec<u8>, NetError> {
        self(url)
    }
}

/// [`Fetcher`] backed by a shared `reqwest::blocking::Client`.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, NetError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ua) = config.user_agent {
            builder = builder.user_agent(ua);
        }
        if config.no_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| NetError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &Url) -> Result<Vec<u8>, NetError> {
        let start = std::time::Instant::now();

        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| NetError::transport(&e))?;

        // Any status with a body counts as a response; only the transport can fail.
        let status = resp.status();
        let body = resp.bytes().map_err(|e| NetError::transport(&e))?;

        log::debug!(
            target: "net",
            "GET {url} -> {} ({} bytes, {} ms)",
            status.as_u16(),
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(body.to_vec())
    }
}

/// Decode a response body as UTF-8, refusing anything that is not.
pub fn decode_text(bytes: Vec<u8>) -> Result<String, NetError> {
    String::from_utf8(bytes).map_err(|e| NetError::Decode {
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}
