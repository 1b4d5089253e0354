use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReactionTarget {
    Course,
    Lesson,
}

impl ReactionTarget {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "course" => Some(Self::Course),
            "lesson" => Some(Self::Lesson),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Lesson => "lesson",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Love,
    Insightful,
    Celebrate,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [Self::Like, Self::Love, Self::Insightful, Self::Celebrate];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "like" => Some(Self::Like),
            "love" => Some(Self::Love),
            "insightful" => Some(Self::Insightful),
            "celebrate" => Some(Self::Celebrate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Love => "love",
            Self::Insightful => "insightful",
            Self::Celebrate => "celebrate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Insert,
    Replace,
    Remove,
}

/// Same kind twice removes the reaction, a different kind replaces it.
pub fn toggle_action(existing: Option<ReactionKind>, requested: ReactionKind) -> ToggleAction {
    match existing {
        None => ToggleAction::Insert,
        Some(kind) if kind == requested => ToggleAction::Remove,
        Some(_) => ToggleAction::Replace,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Reaction {
    id: Uuid,
    user_id: Uuid,
    target_type: String,
    target_id: Uuid,
    kind: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Reaction {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Reaction
    }
}

impl Reaction {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> Option<ReactionKind> {
        ReactionKind::parse(&self.kind)
    }

    pub fn target_id(&self) -> Uuid {
        self.target_id
    }
}

impl Reaction {
    pub async fn find(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        target: ReactionTarget,
        target_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            "SELECT * FROM reactions WHERE user_id = $1 AND target_type = $2 AND target_id = $3",
        )
        .bind(actor.user_id())
        .bind(target.as_str())
        .bind(target_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }

    /// Applies the toggle and returns the caller's reaction afterwards.
    pub async fn toggle(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        target: ReactionTarget,
        target_id: Uuid,
        kind: ReactionKind,
    ) -> DatabaseResult<Option<ReactionKind>> {
        let existing = Self::find(mm, actor, target, target_id).await?;

        match (toggle_action(existing.as_ref().and_then(Self::kind), kind), existing) {
            (ToggleAction::Remove, Some(reaction)) => {
                sqlx::query("DELETE FROM reactions WHERE id = $1")
                    .bind(reaction.id)
                    .execute(mm.executor())
                    .await?;
                Ok(None)
            }
            (ToggleAction::Replace, Some(reaction)) => {
                sqlx::query("UPDATE reactions SET kind = $1, created_at = now() WHERE id = $2")
                    .bind(kind.as_str())
                    .bind(reaction.id)
                    .execute(mm.executor())
                    .await?;
                Ok(Some(kind))
            }
            _ => {
                sqlx::query(
                    r#"
                    INSERT INTO reactions (id, user_id, target_type, target_id, kind)
                    VALUES ($1,$2,$3,$4,$5)
                    ON CONFLICT (user_id, target_type, target_id) DO UPDATE SET kind = EXCLUDED.kind
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(actor.user_id())
                .bind(target.as_str())
                .bind(target_id)
                .bind(kind.as_str())
                .execute(mm.executor())
                .await?;
                Ok(Some(kind))
            }
        }
    }

    /// Count per kind. Kinds nobody used are reported as 0.
    pub async fn counts(
        mm: &ModelManager,
        target: ReactionTarget,
        target_id: Uuid,
    ) -> DatabaseResult<Vec<(ReactionKind, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT kind, COUNT(*) FROM reactions
            WHERE target_type = $1 AND target_id = $2
            GROUP BY kind
            "#,
        )
        .bind(target.as_str())
        .bind(target_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(ReactionKind::ALL
            .iter()
            .map(|kind| {
                let count = rows
                    .iter()
                    .find(|(k, _)| k == kind.as_str())
                    .map(|(_, c)| *c)
                    .unwrap_or(0);
                (*kind, count)
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn toggle_semantics() {
        use ReactionKind::*;

        assert_eq!(toggle_action(None, Like), ToggleAction::Insert);
        assert_eq!(toggle_action(Some(Like), Like), ToggleAction::Remove);
        assert_eq!(toggle_action(Some(Like), Love), ToggleAction::Replace);
        assert_eq!(toggle_action(Some(Celebrate), Insightful), ToggleAction::Replace);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(ReactionKind::parse("insightful"), Some(ReactionKind::Insightful));
        assert_eq!(ReactionKind::parse("dislike"), None);
        assert_eq!(ReactionTarget::parse("lesson"), Some(ReactionTarget::Lesson));
        assert_eq!(ReactionTarget::parse("module"), None);
    }
}
