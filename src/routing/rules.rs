//! Deterministic routing rules
//!
//! Rules are checked top to bottom before any classifier runs. The first rule
//! that matches decides the route.

use crate::models::Route;
use crate::routing::RouteDecision;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "under 5000", "below 2k", "less than 999", "rs. 1500", "₹800"
    static ref PRICE_PATTERN: Regex =
        Regex::new(r"(under|below|less than)\s*\d+(\s?k)?|\brs\.?\s*\d+|₹\s*\d+")
            .expect("valid price pattern");
}

const GRATITUDE_PHRASES: &[&str] = &["thanks", "thank you", "ya thank you", "thx"];

const SQL_KEYWORDS: &[&str] = &[
    "rated", "rating", "ratings", "reviews", "popular",
    "top rated", "best rated",
    "show me", "find", "list", "give me", "provide me",
];

/// How a rule tests the normalized (trimmed, lowercased) query
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Whole query equals one of the phrases
    Exact(&'static [&'static str]),
    /// Query contains one of the keywords
    Contains(&'static [&'static str]),
    Pattern(Regex),
}

impl Matcher {
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            Matcher::Exact(phrases) => phrases.iter().any(|p| normalized == *p),
            Matcher::Contains(keywords) => keywords.iter().any(|k| normalized.contains(k)),
            Matcher::Pattern(regex) => regex.is_match(normalized),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutingRule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub decision: RouteDecision,
}

impl RoutingRule {
    pub fn evaluate(&self, normalized: &str) -> Option<RouteDecision> {
        self.matcher.matches(normalized).then_some(self.decision)
    }
}

/// Gratitude short-circuit, then the product-search overrides
pub fn default_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule {
            name: "gratitude",
            matcher: Matcher::Exact(GRATITUDE_PHRASES),
            decision: RouteDecision::Gratitude,
        },
        RoutingRule {
            name: "sql_price",
            matcher: Matcher::Pattern(PRICE_PATTERN.clone()),
            decision: RouteDecision::Handle(Route::Sql),
        },
        RoutingRule {
            name: "sql_keywords",
            matcher: Matcher::Contains(SQL_KEYWORDS),
            decision: RouteDecision::Handle(Route::Sql),
        },
    ]
}
