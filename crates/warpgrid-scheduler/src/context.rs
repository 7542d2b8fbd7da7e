//! Request context threaded through every collaborator call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the scheduling request a call is made on behalf of.
///
/// Collaborators use it to scope writes and to correlate log lines and
/// notifications; this crate never inspects it beyond logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// `req-<uuid>`, unique per incoming request.
    pub request_id: String,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
}

impl RequestContext {
    /// Context for a request with no user attached (internal callers).
    pub fn new() -> Self {
        Self {
            request_id: format!("req-{}", Uuid::new_v4()),
            user_id: None,
            project_id: None,
        }
    }

    /// Attach the requesting user and project.
    pub fn with_user(mut self, user_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.project_id = Some(project_id.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique_and_prefixed() {
        let a = RequestContext::new();
        let b = RequestContext::new();

        assert!(a.request_id.starts_with("req-"));
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.user_id, None);
    }

    #[test]
    fn with_user_sets_both_ids() {
        let ctx = RequestContext::new().with_user("alice", "proj-1");
        assert_eq!(ctx.user_id.as_deref(), Some("alice"));
        assert_eq!(ctx.project_id.as_deref(), Some("proj-1"));
    }
}
