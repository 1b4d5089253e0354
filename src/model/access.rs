use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId>;
}

pub async fn check_access<T: HasOwner<OwnerId = O>, O: PartialEq + Send + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()> {
    // admin can get all resources
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    let actual_owner = resource.get_owner_id(mm, ctx).await?;

    if actual_owner == expected {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

/// Resolves the instructor owning the course a row belongs to. `sql` must select a single
/// `instructor_id` column and take the row id as `$1`.
pub(crate) async fn course_owner_by(
    mm: &ModelManager,
    sql: &'static str,
    id: uuid::Uuid,
) -> DatabaseResult<uuid::Uuid> {
    let owner: Option<uuid::Uuid> = sqlx::query_scalar(sql)
        .bind(id)
        .fetch_optional(mm.executor())
        .await?;

    owner.ok_or(DatabaseError::OwnerNotFound)
}

#[cfg(test)]
mod test {
    use super::*;

    struct Owned(uuid::Uuid);

    #[async_trait::async_trait]
    impl HasOwner for Owned {
        type OwnerId = uuid::Uuid;

        async fn get_owner_id(
            &self,
            _mm: &ModelManager,
            _ctx: &AuthenticatedUser,
        ) -> DatabaseResult<Self::OwnerId> {
            Ok(self.0)
        }
    }

    fn lazy_manager() -> ModelManager {
        let conn = crate::model::DbConnection::connect("postgres://localhost/unused").unwrap();
        ModelManager::new(conn)
    }

    #[tokio::test]
    async fn owner_is_allowed() {
        let mm = lazy_manager();
        let id = uuid::Uuid::new_v4();
        let user = AuthenticatedUser::new(id, UserRole::Instructor);
        assert!(check_access(&mm, &user, &Owned(id), user.user_id()).await.is_ok());
    }

    #[tokio::test]
    async fn stranger_is_forbidden() {
        let mm = lazy_manager();
        let user = AuthenticatedUser::new(uuid::Uuid::new_v4(), UserRole::Student);
        let res = check_access(&mm, &user, &Owned(uuid::Uuid::new_v4()), user.user_id()).await;
        assert!(matches!(res, Err(DatabaseError::Forbidden)));
    }

    #[tokio::test]
    async fn admin_bypasses_ownership() {
        let mm = lazy_manager();
        let admin = AuthenticatedUser::admin();
        let res = check_access(&mm, &admin, &Owned(uuid::Uuid::new_v4()), admin.user_id()).await;
        assert!(res.is_ok());
    }
}
