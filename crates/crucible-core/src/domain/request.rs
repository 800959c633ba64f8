//! Incoming units of work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-declared hints attached to a request.
///
/// Tags are matched by the same indicator patterns as the payload text,
/// so a caller that already knows a request is high-stakes can say so
/// without rewording the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub tags: Vec<String>,
}

impl RequestContext {
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// An incoming unit of work: a question, a proposed change, a generated
/// artifact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: Uuid,
    pub payload: String,
    pub declared_context: Option<RequestContext>,
}

impl Request {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload: payload.into(),
            declared_context: None,
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.declared_context = Some(context);
        self
    }

    /// Payload plus declared tags, the full text surface indicator
    /// patterns are matched against.
    pub fn indicator_text(&self) -> String {
        match &self.declared_context {
            Some(ctx) if !ctx.tags.is_empty() => {
                format!("{} {}", self.payload, ctx.tags.join(" "))
            }
            _ => self.payload.clone(),
        }
    }
}
