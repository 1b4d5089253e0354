use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gamification::{ChallengeStatus, challenge_status};
use crate::model::entity::{Challenge, ChallengeMembershipRow};

const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
const MAX_LEADERBOARD_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LeaderboardQuery {
    limit: Option<i64>,
    /// Only members of this company.
    company: Option<Uuid>,
}

impl LeaderboardQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT)
    }

    pub fn company(&self) -> Option<Uuid> {
        self.company
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChallengeView {
    pub challenge: Challenge,
    pub joined: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ChallengeStatus,
}

impl ChallengeView {
    pub fn new(row: ChallengeMembershipRow, progress: i64, now: DateTime<Utc>) -> Self {
        let challenge = row.challenge;
        let mut status = challenge_status(
            progress,
            challenge.target(),
            challenge.starts_at(),
            challenge.ends_at(),
            now,
        );

        // a recorded completion stands even if the window's events were later removed
        if row.completed_at.is_some() {
            status.completed = true;
            status.expired = false;
        }

        Self {
            challenge,
            joined: row.joined,
            completed_at: row.completed_at,
            status,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn leaderboard_limit_clamps() {
        let q = LeaderboardQuery { limit: None, company: None };
        assert_eq!(q.limit(), DEFAULT_LEADERBOARD_LIMIT);

        let q = LeaderboardQuery { limit: Some(5000), company: None };
        assert_eq!(q.limit(), MAX_LEADERBOARD_LIMIT);

        let q = LeaderboardQuery { limit: Some(-1), company: None };
        assert_eq!(q.limit(), 1);
    }
}
