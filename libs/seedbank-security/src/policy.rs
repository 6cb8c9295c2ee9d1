use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::SecurityContext;

/// Type alias for a reference-counted access policy
pub type PolicyRef = Arc<dyn AccessPolicy>;

/// Decides whether a context may view one object, identified by its entity
/// kind (e.g. `"institution"`) and id.
pub trait AccessPolicy: Send + Sync {
    fn can_view(&self, ctx: &SecurityContext, kind: &str, id: i64) -> bool;
}

/// Permits everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn can_view(&self, _ctx: &SecurityContext, _kind: &str, _id: i64) -> bool {
        true
    }
}

/// Objects are visible unless restricted; a restricted object is visible to
/// admins, to subjects granted it explicitly, and to members of granted groups.
#[derive(Debug, Default, Clone)]
pub struct RestrictedPolicy {
    restricted: HashSet<(String, i64)>,
    subject_grants: HashMap<(String, i64), HashSet<i64>>,
    group_grants: HashMap<(String, i64), HashSet<i64>>,
}

impl RestrictedPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn restrict(mut self, kind: &str, id: i64) -> Self {
        self.restricted.insert((kind.to_owned(), id));
        self
    }

    #[must_use]
    pub fn grant_subject(mut self, kind: &str, id: i64, subject_id: i64) -> Self {
        self.subject_grants
            .entry((kind.to_owned(), id))
            .or_default()
            .insert(subject_id);
        self
    }

    #[must_use]
    pub fn grant_group(mut self, kind: &str, id: i64, group_id: i64) -> Self {
        self.group_grants
            .entry((kind.to_owned(), id))
            .or_default()
            .insert(group_id);
        self
    }
}

impl AccessPolicy for RestrictedPolicy {
    fn can_view(&self, ctx: &SecurityContext, kind: &str, id: i64) -> bool {
        let key = (kind.to_owned(), id);
        if ctx.is_admin() || !self.restricted.contains(&key) {
            return true;
        }
        let by_subject = ctx
            .subject_id()
            .zip(self.subject_grants.get(&key))
            .is_some_and(|(subject, grants)| grants.contains(&subject));
        let by_group = self
            .group_grants
            .get(&key)
            .is_some_and(|grants| ctx.group_ids().iter().any(|g| grants.contains(g)));
        by_subject || by_group
    }
}
