use std::time::Duration;

use portal_domain::CoreError;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrappeConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for FrappeConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl FrappeConfig {
    pub fn from_settings(
        base_url: impl Into<String>,
        request_timeout_secs: u64,
    ) -> Result<Self, CoreError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(CoreError::Configuration(
                "PORTAL_API_BASE_URL is empty. Provide the billing backend base URL.".to_owned(),
            ));
        }
        if request_timeout_secs == 0 {
            return Err(CoreError::Configuration(
                "PORTAL_REQUEST_TIMEOUT_SECS must be greater than zero.".to_owned(),
            ));
        }

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}
