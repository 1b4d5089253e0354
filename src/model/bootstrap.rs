use crate::auth::hash_password;
use crate::model::entity::{UserEntity, UserEntityCreateUpdate};
use crate::error::AppResult;
use crate::model::ModelManager;
use crate::web::{AuthenticatedUser, UserRole};

pub const ADMIN_USERNAME: &str = "admin";

/// Creates the `admin` account when it is missing. Returns `true` if it was created.
/// Nothing is created without a configured password.
pub async fn ensure_admin(mm: &ModelManager, password: Option<&str>) -> AppResult<bool> {
    let Some(password) = password else {
        tracing::warn!("app.admin_password is not set, skipping `{ADMIN_USERNAME}` bootstrap");
        return Ok(false);
    };

    let actor = AuthenticatedUser::admin();
    if UserEntity::find_by_username(mm, &actor, ADMIN_USERNAME)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let password_hash = hash_password(password)?;

    let data = UserEntityCreateUpdate {
        username: ADMIN_USERNAME.to_string(),
        password_hash,
    };
    UserEntity::create_with_role(mm, &actor, data, UserRole::Admin).await?;

    tracing::info!("created the `{ADMIN_USERNAME}` account");
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn no_password_no_admin() {
        // lazy pool, never touched when the password is missing
        let conn = crate::model::DbConnection::connect("postgres://localhost/unused").unwrap();
        let mm = ModelManager::new(conn);
        assert!(!ensure_admin(&mm, None).await.unwrap());
    }
}
