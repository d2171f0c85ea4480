//! Ordered keyword routing
//!
//! Routes are tested top to bottom against the submitted text and the
//! first match wins, so declaration order is priority.

use regex::Regex;

use super::topic::TopicId;
use super::CatalogError;

#[derive(Debug, Clone)]
struct Route {
    pattern: Regex,
    topic: TopicId,
}

/// Priority-ordered list of (pattern, topic) pairs
#[derive(Debug, Clone, Default)]
pub struct KeywordRouter {
    routes: Vec<Route>,
}

impl KeywordRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route with the lowest priority so far.
    ///
    /// Patterns are regular expressions matched case-insensitively
    /// anywhere in the text.
    pub fn push(&mut self, pattern: &str, topic: impl Into<TopicId>) -> Result<(), CatalogError> {
        let compiled = Regex::new(&format!("(?i){pattern}")).map_err(|source| {
            CatalogError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        self.routes.push(Route {
            pattern: compiled,
            topic: topic.into(),
        });
        Ok(())
    }

    /// Topic of the first route whose pattern matches `text`
    pub fn route(&self, text: &str) -> Option<&TopicId> {
        self.routes
            .iter()
            .find(|route| route.pattern.is_match(text))
            .map(|route| &route.topic)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
