//! Widget configuration

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_ROLE: &str = "customer";
pub const DEFAULT_PAGE: &str = "dashboard";

/// Configuration for one widget host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    /// Base URL of the REST backend
    pub api_url: String,
    /// Bearer token for the backend
    pub api_token: Option<String>,
    /// Acting user's role
    pub role: String,
    /// Page reported with each query
    pub page: String,
    /// SQLite file for persisted session ids
    pub session_db_path: PathBuf,
    /// Base for relative action URLs
    pub app_url: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            role: DEFAULT_ROLE.to_string(),
            page: DEFAULT_PAGE.to_string(),
            session_db_path: default_session_db_path(None),
            app_url: None,
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_url: get("ROLE_ASSISTANT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_token: get("ROLE_ASSISTANT_TOKEN"),
            role: get("ROLE_ASSISTANT_ROLE").unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            page: get("ROLE_ASSISTANT_PAGE").unwrap_or_else(|| DEFAULT_PAGE.to_string()),
            session_db_path: get("ROLE_ASSISTANT_SESSION_DB")
                .map_or_else(|| default_session_db_path(get("HOME")), PathBuf::from),
            app_url: get("ROLE_ASSISTANT_APP_URL"),
        }
    }
}

fn default_session_db_path(home: Option<String>) -> PathBuf {
    let home = home.unwrap_or_else(|| "/tmp".to_string());
    PathBuf::from(home).join(".role-assistant").join("sessions.db")
}
