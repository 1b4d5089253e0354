//! Request context, e.g. user id, its role, etc.
//!

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::web::{WebResult, error::WebError};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user_id: uuid::Uuid,
    user_role: UserRole,
}

impl AuthenticatedUser {
    pub fn new(user_id: uuid::Uuid, user_role: UserRole) -> Self {
        Self { user_id, user_role }
    }

    pub fn admin() -> Self {
        Self {
            user_role: UserRole::Admin,
            user_id: uuid::Uuid::max(), // admin ID
        }
    }

    pub fn user_id(&self) -> uuid::Uuid {
        self.user_id
    }

    pub fn user_role(&self) -> UserRole {
        self.user_role
    }

    /// Fails with 403 unless the user has one of `roles`. Admins always pass.
    pub fn require_any(&self, roles: &[UserRole]) -> WebResult<()> {
        if self.user_role == UserRole::Admin || roles.contains(&self.user_role) {
            Ok(())
        } else {
            Err(WebError::role_forbidden(self.user_role))
        }
    }

    /// Like [`Self::require_any`] but without the admin bypass.
    pub fn require_role(&self, role: UserRole) -> WebResult<()> {
        if self.user_role == role {
            Ok(())
        } else {
            Err(WebError::role_forbidden(self.user_role))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Instructor,
    CompanyAdmin,
    Student,
}

impl UserRole {
    /// Strict parsing, used for role assignment.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "instructor" => Some(Self::Instructor),
            "company_admin" => Some(Self::CompanyAdmin),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Instructor => "instructor",
            Self::CompanyAdmin => "company_admin",
            Self::Student => "student",
        }
    }
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Student)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    maybe_user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn new(maybe_user: Option<AuthenticatedUser>) -> Self {
        Self { maybe_user }
    }

    pub fn admin() -> Self {
        Self::new(Some(AuthenticatedUser::admin()))
    }

    pub fn maybe_user(&self) -> Option<&AuthenticatedUser> {
        self.maybe_user.as_ref()
    }

    pub fn user(&self) -> WebResult<&AuthenticatedUser> {
        self.maybe_user.as_ref().ok_or(WebError::auth_required())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts.extensions.get::<RequestContext>();
        if let Some(ctx) = ctx {
            Ok(ctx.clone())
        } else {
            Ok(RequestContext::new(None))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn role_parsing() {
        assert_eq!(UserRole::from("instructor"), UserRole::Instructor);
        assert_eq!(UserRole::from("company_admin"), UserRole::CompanyAdmin);
        assert_eq!(UserRole::from("something else"), UserRole::Student);
        assert_eq!(UserRole::parse("root"), None);
        assert_eq!(UserRole::CompanyAdmin.to_string(), "company_admin");
    }

    #[test]
    fn require_any_roles() {
        let student = AuthenticatedUser::new(uuid::Uuid::new_v4(), UserRole::Student);
        assert!(student.require_any(&[UserRole::Student]).is_ok());
        assert!(student.require_any(&[UserRole::Instructor]).is_err());
        assert!(AuthenticatedUser::admin().require_any(&[UserRole::Instructor]).is_ok());
    }

    #[test]
    fn require_role_has_no_admin_bypass() {
        let admin = AuthenticatedUser::admin();
        assert!(admin.require_role(UserRole::Admin).is_ok());
        assert!(admin.require_role(UserRole::Student).is_err());
        assert!(admin.require_role(UserRole::Instructor).is_err());
    }

    #[test]
    fn anonymous_context_requires_auth() {
        let ctx = RequestContext::new(None);
        let err = ctx.user().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert!(RequestContext::admin().user().is_ok());
    }
}
