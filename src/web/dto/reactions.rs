use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{ReactionKind, ReactionTarget};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReactionBody {
    pub kind: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ReactionCount {
    pub kind: ReactionKind,
    pub count: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReactionsResponse {
    pub target_type: ReactionTarget,
    pub target_id: Uuid,
    pub counts: Vec<ReactionCount>,
    pub total: i64,
    pub mine: Option<ReactionKind>,
}

impl ReactionsResponse {
    pub fn new(
        target_type: ReactionTarget,
        target_id: Uuid,
        counts: Vec<(ReactionKind, i64)>,
        mine: Option<ReactionKind>,
    ) -> Self {
        let total = counts.iter().map(|(_, c)| *c).sum();
        Self {
            target_type,
            target_id,
            counts: counts
                .into_iter()
                .map(|(kind, count)| ReactionCount { kind, count })
                .collect(),
            total,
            mine,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn totals_every_kind() {
        let response = ReactionsResponse::new(
            ReactionTarget::Lesson,
            Uuid::nil(),
            vec![(ReactionKind::Like, 3), (ReactionKind::Love, 0), (ReactionKind::Celebrate, 2)],
            Some(ReactionKind::Like),
        );

        assert_eq!(response.total, 5);
        assert_eq!(response.counts.len(), 3);
        assert_eq!(response.mine, Some(ReactionKind::Like));
    }
}
