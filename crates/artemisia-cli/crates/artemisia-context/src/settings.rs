//! Settings read from the process environment.
//!
//! Each type has a `from_lookup` constructor taking a `name -> value`
//! closure, and a `from_env` wrapper over `std::env::var`. Empty values
//! count as unset.

use crate::config::normalize_base_path;

pub const DEFAULT_PORT: u16 = 3000;

fn non_empty<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Inputs to a static build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettings {
    /// `FORM_ENDPOINT`: where the static contact form posts, if anywhere.
    pub form_endpoint: Option<String>,
    /// `BUILD_VERSION`: cache-busting token appended to asset URLs.
    pub version: String,
    /// `BASE_PATH`: overrides `site.json`'s base path.
    pub base_path: Option<String>,
}

impl BuildSettings {
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Self {
            form_endpoint: non_empty(&lookup, "FORM_ENDPOINT"),
            version: non_empty(&lookup, "BUILD_VERSION")
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().to_string()),
            base_path: non_empty(&lookup, "BASE_PATH").map(|p| normalize_base_path(&p)),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// Inputs to the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub port: u16,
}

impl ServerSettings {
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let port = match non_empty(&lookup, "PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT \"{raw}\", using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        Self { port }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_build_settings_from_lookup() {
        let settings = BuildSettings::from_lookup(lookup(&[
            ("FORM_ENDPOINT", "https://forms.example/submit"),
            ("BUILD_VERSION", "42"),
            ("BASE_PATH", "artemisia"),
        ]));
        assert_eq!(
            settings,
            BuildSettings {
                form_endpoint: Some("https://forms.example/submit".into()),
                version: "42".into(),
                base_path: Some("/artemisia/".into()),
            }
        );
    }

    #[test]
    fn test_build_settings_defaults() {
        let settings = BuildSettings::from_lookup(lookup(&[("FORM_ENDPOINT", "")]));
        assert_eq!(settings.form_endpoint, None);
        assert_eq!(settings.base_path, None);
        let millis: i64 = settings.version.parse().unwrap();
        assert!(millis > 1_600_000_000_000);
    }

    #[test]
    fn test_server_port() {
        assert_eq!(ServerSettings::from_lookup(lookup(&[])).port, 3000);
        assert_eq!(ServerSettings::from_lookup(lookup(&[("PORT", "8080")])).port, 8080);
        assert_eq!(ServerSettings::from_lookup(lookup(&[("PORT", "http")])).port, 3000);
    }
}
