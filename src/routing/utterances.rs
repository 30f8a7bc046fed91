//! Utterance Classifier
//!
//! Default intent classifier: scores the query against example utterances for
//! each route by token overlap (Jaccard) and keeps the best route above a
//! threshold. A hosted semantic router can replace it behind
//! [`IntentClassifier`].

use crate::routing::{tokenize, IntentClassifier, RouteMatch};
use async_trait::async_trait;
use std::collections::HashSet;

/// Example utterances per route
const FAQ_UTTERANCES: &[&str] = &[
    "What is the return policy of the products?",
    "Do I get discount with the HDFC credit card?",
    "How can I track my order?",
    "What payment methods are accepted?",
    "How long does it take to process a refund?",
    "refund policy",
    "refund processing time",
    "track my order",
    "order status",
    "cancel an order",
    "modify an order",
    "accepted payment options",
    "cash on delivery",
    "online payment options",
    "credit card discount",
    "bank discount",
    "sales and promotions",
    "ongoing offers",
    "defective product policy",
    "return policy for defective items",
    "refund for defective product",
    "is my amount refundable?",
    "what if i get a damaged product",
    "received damaged item",
    "item arrived damaged",
];

const SQL_UTTERANCES: &[&str] = &[
    "search for",
    "list products",
    "display items",
    "give me products",
    "under budget",
    "below price",
    "less than amount",
    "within budget",
    "cheap products",
    "brand products",
    "products from brand",
    "product named",
    "find product called",
    "highly rated products",
    "top rated items",
    "products with good reviews",
    "most reviewed products",
    "popular items",
    "best selling products",
    "popular brand products under price",
];

const GENERAL_QA_UTTERANCES: &[&str] = &[
    "who are you?",
    "what is your name?",
    "What can you help me with?",
    "Are you a real person?",
    "How do you work?",
    "Can you help me choose a product?",
    "Are there any good deals available?",
    "Is this product worth buying?",
    "Can you compare two products?",
    "Is there a cheaper alternative?",
    "Can you recommend products for daily use?",
    "What can't you do?",
    "Tell me about yourself",
    "What do you do?",
    "What services do you offer?",
    "Are you a bot?",
    "Are you human?",
    "How do you find products?",
    "How do you give recommendations?",
    "How do you understand my queries?",
    "Hi",
    "Hello",
    "what are the queries that I made above",
];

struct RouteExamples {
    name: String,
    utterances: Vec<HashSet<String>>,
}

/// Token-overlap intent classifier
pub struct UtteranceClassifier {
    routes: Vec<RouteExamples>,
    threshold: f32,
}

impl UtteranceClassifier {
    pub fn new(threshold: f32) -> Self {
        Self {
            routes: Vec::new(),
            threshold,
        }
    }

    /// faq, sql and general_qa with the built-in utterances
    pub fn with_default_routes(threshold: f32) -> Self {
        Self::new(threshold)
            .with_route("faq", FAQ_UTTERANCES)
            .with_route("sql", SQL_UTTERANCES)
            .with_route("general_qa", GENERAL_QA_UTTERANCES)
    }

    pub fn with_route(mut self, name: &str, utterances: &[&str]) -> Self {
        self.routes.push(RouteExamples {
            name: name.to_string(),
            utterances: utterances
                .iter()
                .map(|u| tokenize(u).into_iter().collect())
                .collect(),
        });
        self
    }

    /// Best (route, score) pair; earlier routes win ties
    fn best_match(&self, query: &str) -> Option<RouteMatch> {
        let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
        if query_tokens.is_empty() {
            return None;
        }

        let mut best: Option<RouteMatch> = None;
        for route in &self.routes {
            let score = route
                .utterances
                .iter()
                .map(|u| jaccard(&query_tokens, u))
                .fold(0.0_f32, f32::max);

            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(RouteMatch {
                    name: route.name.clone(),
                    score,
                });
            }
        }

        best.filter(|m| m.score >= self.threshold)
    }
}

#[async_trait]
impl IntentClassifier for UtteranceClassifier {
    async fn classify(&self, query: &str) -> crate::Result<Option<RouteMatch>> {
        Ok(self.best_match(query))
    }
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}
