//! Intent routing
//!
//! Decides which handler answers a query:
//! 1. ordered deterministic rules (gratitude, product-search overrides)
//! 2. the intent classifier collaborator
//! 3. otherwise ask the shopper to rephrase

use crate::models::Route;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub mod rules;
pub mod utterances;

pub use rules::{default_rules, Matcher, RoutingRule};
pub use utterances::UtteranceClassifier;

/// Outcome of routing one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Canned thank-you reply, no handler runs
    Gratitude,
    Handle(Route),
    /// No route matched
    Clarify,
}

/// A classifier's best guess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMatch {
    pub name: String,
    pub score: f32,
}

/// Maps a query to a named route, or `None` when not confident
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> Result<Option<RouteMatch>>;
}

pub struct IntentRouter {
    rules: Vec<RoutingRule>,
    classifier: Arc<dyn IntentClassifier>,
}

impl IntentRouter {
    pub fn new(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self::with_rules(default_rules(), classifier)
    }

    pub fn with_rules(rules: Vec<RoutingRule>, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self { rules, classifier }
    }

    pub async fn route(&self, query: &str) -> Result<RouteDecision> {
        let normalized = query.trim().to_lowercase();

        if let Some((rule, decision)) = self
            .rules
            .iter()
            .find_map(|rule| rule.evaluate(&normalized).map(|d| (rule.name, d)))
        {
            info!(rule, ?decision, "Routing rule matched");
            return Ok(decision);
        }

        let decision = match self.classifier.classify(query).await? {
            Some(found) => {
                debug!(route = %found.name, score = found.score, "Classifier matched");
                RouteDecision::Handle(Route::from_name(&found.name))
            }
            None => RouteDecision::Clarify,
        };

        info!(?decision, "Routed query");
        Ok(decision)
    }
}

/// Lowercased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
