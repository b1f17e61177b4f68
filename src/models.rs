use chrono::{Days, Local, Months, NaiveDate};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const SEARCH_URL: &str = "https://www.google.com/search";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Developer,
    #[allow(dead_code)]
    System,
    User,
    #[allow(dead_code)]
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub provider: String,
    pub messages: Vec<ChatMessage>,
}

/// Reply of `POST /chat`. The backend has answered with each of these
/// shapes over time, so all of them are accepted at the boundary.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatReply {
    Events(Vec<Value>),
    Wrapped {
        response: String,
        #[serde(default)]
        provider: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Text(String),
}

/// Calendar date picked in the UI. Only month and day reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSelection(NaiveDate);

impl DateSelection {
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// `MM-DD`, as sent in the user prompt.
    pub fn query_string(self) -> String {
        self.0.format("%m-%d").to_string()
    }

    /// `Month DD`, as shown on the results card.
    pub fn display_string(self) -> String {
        self.0.format("%B %d").to_string()
    }

    pub fn shift_days(self, days: i64) -> Self {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.map_or(self, Self)
    }

    pub fn shift_months(self, months: i32) -> Self {
        let shifted = if months >= 0 {
            self.0.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted.map_or(self, Self)
    }
}

impl Default for DateSelection {
    fn default() -> Self {
        Self::today()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricEvent {
    pub year: String,
    pub title: String,
    pub description: String,
    /// The reply entry this event was read from, when it came from one.
    pub source: Option<String>,
}

impl HistoricEvent {
    pub fn new(
        year: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            year: year.into(),
            title: title.into(),
            description: description.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// False for an empty description or a bare ".".
    pub fn has_description(&self) -> bool {
        !self.description.trim().trim_end_matches('.').is_empty()
    }

    /// Web search link for the source entry, or the event text when the
    /// event was not read from a single entry.
    pub fn search_url(&self) -> Option<Url> {
        let query = self.source.clone().unwrap_or_else(|| self.to_string());
        Url::parse_with_params(SEARCH_URL, &[("q", query)]).ok()
    }
}

impl fmt::Display for HistoricEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_description() {
            write!(f, "{} {}", self.year, self.title)
        } else {
            write!(f, "{} {}. {}", self.year, self.title, self.description)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

const fn default_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout: default_timeout(),
            default_model: None,
            log_level: default_log_level(),
        }
    }
}
