/// Authorization-scope fingerprint of a [`crate::SecurityContext`].
///
/// Two contexts with the same scope are entitled to exactly the same objects,
/// so values memoized under one scope may be served to the other. Anything
/// that can change an access decision belongs in here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessScope {
    subject_id: Option<i64>,
    is_admin: bool,
    group_ids: Vec<i64>,
}

impl AccessScope {
    /// Group ids are sorted and deduplicated so that ordering in the source
    /// context does not split the scope.
    #[must_use]
    pub fn new(subject_id: Option<i64>, is_admin: bool, mut group_ids: Vec<i64>) -> Self {
        group_ids.sort_unstable();
        group_ids.dedup();
        Self {
            subject_id,
            is_admin,
            group_ids,
        }
    }

    #[must_use]
    pub fn subject_id(&self) -> Option<i64> {
        self.subject_id
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    #[must_use]
    pub fn group_ids(&self) -> &[i64] {
        &self.group_ids
    }

    /// `true` for the scope of an unauthenticated caller.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.subject_id.is_none()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn group_order_does_not_split_scope() {
        let a = AccessScope::new(Some(7), false, vec![3, 1, 2]);
        let b = AccessScope::new(Some(7), false, vec![2, 3, 1, 3]);
        assert_eq!(a, b);
        assert_eq!(a.group_ids(), &[1, 2, 3]);
    }

    #[test]
    fn admin_flag_splits_scope() {
        let user = AccessScope::new(Some(7), false, vec![]);
        let admin = AccessScope::new(Some(7), true, vec![]);
        assert_ne!(user, admin);
    }

    #[test]
    fn default_scope_is_anonymous() {
        let scope = AccessScope::default();
        assert!(scope.is_anonymous());
        assert!(!scope.is_admin());
        assert!(scope.group_ids().is_empty());
    }
}
