//! BrasilAPI bank list client
//!
//! Fetches the public list of Brazilian banks with a single blocking GET.

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::domain::result::{Error, Result};
use crate::domain::RawBankRecord;
use crate::ports::BankSource;

/// Default bank list endpoint
pub const DEFAULT_SOURCE_URL: &str = "https://brasilapi.com.br/api/banks/v1";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking HTTP client for the bank list endpoint
#[derive(Debug, Clone)]
pub struct BrasilApiClient {
    client: Client,
    timeout: Duration,
}

impl BrasilApiClient {
    /// Create a client with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bankflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::retrieval(
                None,
                format!("Connection timed out after {} seconds", self.timeout.as_secs()),
            )
        } else if error.is_connect() {
            Error::retrieval(None, format!("Unable to connect to bank source: {}", error))
        } else {
            Error::retrieval(error.status().map(|s| s.as_u16()), format!("Request failed: {}", error))
        }
    }

    /// Any non-2xx status is a hard failure
    fn check_response_status(&self, response: &Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::retrieval(
                Some(status.as_u16()),
                format!("Bank source returned HTTP {}", status),
            ))
        }
    }
}

impl BankSource for BrasilApiClient {
    fn name(&self) -> &str {
        "brasilapi"
    }

    fn fetch(&self, source_url: &str) -> Result<Vec<RawBankRecord>> {
        let response = self
            .client
            .get(source_url)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;

        response
            .json::<Vec<RawBankRecord>>()
            .map_err(|e| Error::retrieval(None, format!("Failed to parse bank list: {}", e)))
    }
}
