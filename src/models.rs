//! Core data models for the shopping assistant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

//
// ================= Routes =================
//

/// Handler category selected for a query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Faq,
    Sql,
    GeneralQa,
    Fallback,
}

impl Route {
    /// Map a classifier route name onto a handler.
    ///
    /// Names without a dedicated handler go to the fallback agent.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "faq" => Route::Faq,
            "sql" => Route::Sql,
            "general_qa" => Route::GeneralQa,
            _ => Route::Fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Faq => "faq",
            Route::Sql => "sql",
            Route::GeneralQa => "general_qa",
            Route::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ================= Turns =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

/// A single chat turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker.as_str(), self.text)
    }
}

//
// ================= Knowledge =================
//

/// A question/answer pair loaded into a vector collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
}

/// A document returned by a retrieval collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub document: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RetrievedDocument {
    pub fn answer(&self) -> Option<&str> {
        self.metadata.get("answer").map(String::as_str)
    }
}

//
// ================= Replies =================
//

/// What the assistant hands back to a shell for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub answer: String,
    /// Handler that produced the answer, if any ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
}
