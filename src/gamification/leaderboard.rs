use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RankedEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub username: String,
    pub points: i64,
    pub level: u32,
}

/// Standard competition ranking ("1224"): equal points share a rank, the next distinct score skips
/// the shared places. Ties are listed by username.
pub fn rank_entries(mut entries: Vec<(Uuid, String, i64)>) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(&b.1)));

    let mut ranked = Vec::with_capacity(entries.len());
    let mut previous: Option<(i64, u32)> = None;

    for (position, (user_id, username, points)) in entries.into_iter().enumerate() {
        let rank = match previous {
            Some((prev_points, prev_rank)) if prev_points == points => prev_rank,
            _ => position as u32 + 1,
        };
        previous = Some((points, rank));

        ranked.push(RankedEntry {
            rank,
            user_id,
            username,
            points,
            level: super::level_for_xp(points).level,
        });
    }

    ranked
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(name: &str, points: i64) -> (Uuid, String, i64) {
        (Uuid::new_v4(), name.to_string(), points)
    }

    #[test]
    fn empty() {
        assert!(rank_entries(vec![]).is_empty());
    }

    #[test]
    fn competition_ranking_with_ties() {
        let ranked = rank_entries(vec![
            entry("dora", 10),
            entry("alice", 300),
            entry("carol", 120),
            entry("bob", 120),
        ]);

        let view: Vec<(&str, u32)> = ranked.iter().map(|e| (e.username.as_str(), e.rank)).collect();
        assert_eq!(view, vec![("alice", 1), ("bob", 2), ("carol", 2), ("dora", 4)]);
        assert_eq!(ranked[0].level, 3);
    }

    #[test]
    fn everyone_tied() {
        let ranked = rank_entries(vec![entry("b", 0), entry("a", 0), entry("c", 0)]);
        assert!(ranked.iter().all(|e| e.rank == 1));
        assert_eq!(ranked[0].username, "a");
    }
}
