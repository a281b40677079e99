//! Blocking HTTP GET seam.
//!
//! Location and schedule lookups only ever need "GET this URL, give me the
//! body". Keeping that behind [`HttpClient`] lets tests substitute canned
//! responses (see the mockall-generated `MockHttpClient`).

use super::error::ResolveError;
use crate::common::constants::HTTP_TIMEOUT;

#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// Anything other than a 200 response is a [`ResolveError::Network`].
    fn get(&self, url: &str) -> Result<String, ResolveError>;
}

/// `ureq` agent with a bounded overall timeout.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("autotemp/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<String, ResolveError> {
        let response = match self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(ResolveError::Network(format!("HTTP {code}")));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(ResolveError::Network(transport.to_string()));
            }
        };

        // ureq only hands back 2xx/3xx here; anything but 200 is still unexpected.
        if response.status() != 200 {
            return Err(ResolveError::Network(format!("HTTP {}", response.status())));
        }

        response
            .into_string()
            .map_err(|e| ResolveError::Network(format!("failed to read response body: {e}")))
    }
}
