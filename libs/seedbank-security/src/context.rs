use crate::AccessScope;

/// `SecurityContext` carries the caller's identity through every hydration
/// and fetch call. It is established elsewhere (login/session handling) and
/// treated here as an opaque capability.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SecurityContext {
    subject_id: Option<i64>,
    username: Option<String>,
    is_admin: bool,
    group_ids: Vec<i64>,
    environment: Vec<(String, String)>,
}

impl SecurityContext {
    /// Create a new `SecurityContext` builder
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Create an anonymous `SecurityContext` with no subject and no groups
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    /// Get the subject (user) id, `None` for anonymous callers
    #[must_use]
    pub fn subject_id(&self) -> Option<i64> {
        self.subject_id
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.subject_id.is_none()
    }

    /// Groups the subject belongs to; used for group-level grants
    #[must_use]
    pub fn group_ids(&self) -> &[i64] {
        &self.group_ids
    }

    /// Get the environmental attributes associated with the security context
    /// (e.g., IP address, session id, etc.)
    #[must_use]
    pub fn environment(&self) -> &[(String, String)] {
        &self.environment
    }

    /// Authorization scope of this context, suitable as part of a cache key.
    ///
    /// Environment attributes are not part of the scope: they never change an
    /// access decision.
    #[must_use]
    pub fn access_scope(&self) -> AccessScope {
        AccessScope::new(self.subject_id, self.is_admin, self.group_ids.clone())
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<i64>,
    username: Option<String>,
    is_admin: bool,
    group_ids: Vec<i64>,
    environment: Vec<(String, String)>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: i64) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_owned());
        self
    }

    #[must_use]
    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    #[must_use]
    pub fn add_group(mut self, group_id: i64) -> Self {
        self.group_ids.push(group_id);
        self
    }

    #[must_use]
    pub fn add_environment_attribute(mut self, key: &str, value: &str) -> Self {
        self.environment.push((key.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id,
            username: self.username,
            is_admin: self.is_admin,
            group_ids: self.group_ids,
            environment: self.environment,
        }
    }
}
