use std::env;
use std::str::FromStr;
use std::time::Duration;

use orbit_core::{AppError, AppResult};
use orbit_domain::Module;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub email: String,
    pub password: String,
    pub module: Module,
    pub search: Option<String>,
}

impl ConsoleConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let api_base_url = lookup("ORBIT_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        Url::parse(api_base_url.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid ORBIT_API_BASE_URL '{api_base_url}': {error}"))
        })?;

        let api_timeout_ms = match lookup("ORBIT_API_TIMEOUT_MS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid ORBIT_API_TIMEOUT_MS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_API_TIMEOUT_MS,
        };
        if api_timeout_ms == 0 {
            return Err(AppError::Validation(
                "ORBIT_API_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        let email = required(&lookup, "ORBIT_EMAIL")?;
        let password = required(&lookup, "ORBIT_PASSWORD")?;
        let module = lookup("ORBIT_MODULE")
            .map(|value| Module::from_str(value.trim()))
            .transpose()?
            .unwrap_or(Module::Deals);
        let search = lookup("ORBIT_SEARCH")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            api_base_url,
            api_timeout: Duration::from_millis(api_timeout_ms),
            email,
            password,
            module,
            search,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> AppResult<String> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use orbit_core::AppError;
    use orbit_domain::Module;

    use super::ConsoleConfig;

    fn load(pairs: &[(&str, &str)]) -> Result<ConsoleConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ConsoleConfig::from_lookup(|name| values.get(name).cloned())
    }

    const CREDENTIALS: [(&str, &str); 2] = [
        ("ORBIT_EMAIL", "admin@acme.test"),
        ("ORBIT_PASSWORD", "secret"),
    ];

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = load(&CREDENTIALS);
        assert!(config.is_ok());
        let config = config.unwrap_or_else(|_| unreachable!());

        assert_eq!(config.api_base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.api_timeout, Duration::from_millis(10_000));
        assert_eq!(config.module, Module::Deals);
        assert_eq!(config.search, None);
    }

    #[test]
    fn trailing_slash_and_blank_search_are_normalized() {
        let config = load(&[
            CREDENTIALS[0],
            CREDENTIALS[1],
            ("ORBIT_API_BASE_URL", "https://crm.example.com/api/v1/"),
            ("ORBIT_MODULE", "leads"),
            ("ORBIT_SEARCH", "   "),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(config.api_base_url, "https://crm.example.com/api/v1");
        assert_eq!(config.module, Module::Leads);
        assert_eq!(config.search, None);
    }

    #[test]
    fn invalid_values_fail_fast() {
        assert!(matches!(
            load(&[("ORBIT_PASSWORD", "secret")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[CREDENTIALS[0], CREDENTIALS[1], ("ORBIT_API_TIMEOUT_MS", "0")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[CREDENTIALS[0], CREDENTIALS[1], ("ORBIT_API_BASE_URL", "not a url")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[CREDENTIALS[0], CREDENTIALS[1], ("ORBIT_MODULE", "billing")]),
            Err(AppError::Validation(_))
        ));
    }
}
