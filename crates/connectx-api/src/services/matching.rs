use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use connectx_db::Database;
use connectx_db::models::UserRow;
use connectx_types::api::MatchResponse;
use connectx_types::models::Match;

use crate::error::{ApiError, ApiResult};
use crate::services::users::require_user;

pub const DEFAULT_MATCH_LIMIT: usize = 50;

// Weights in percentage points; they sum to 100.
const SKILL_WEIGHT: f64 = 60.0;
const COLLEGE_WEIGHT: f64 = 25.0;
const YEAR_WEIGHT: f64 = 15.0;

fn skill_set(skills: &[String]) -> HashSet<String> {
    skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Jaccard similarity of the two skill sets, 0 when either is empty.
fn skill_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.union(b).count();
    shared as f64 / union as f64
}

fn same_college(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// An unset year never matches, not even another unset one.
fn same_year(a: &str, b: &str) -> bool {
    !a.trim().is_empty() && a.trim() == b.trim()
}

/// Weighted score in 0..=100. A candidate that agrees on everything scores
/// exactly 100.
fn score(me: &UserRow, my_skills: &HashSet<String>, candidate: &UserRow) -> u8 {
    let skills = skill_overlap(my_skills, &skill_set(&candidate.skills));
    let college = same_college(&me.college, &candidate.college);
    let year = same_year(&me.year, &candidate.year);

    if skills == 1.0 && college && year {
        return 100;
    }

    let total = skills * SKILL_WEIGHT
        + if college { COLLEGE_WEIGHT } else { 0.0 }
        + if year { YEAR_WEIGHT } else { 0.0 };
    total.round_ties_even().clamp(0.0, 100.0) as u8
}

fn to_match(user: UserRow, match_percentage: u8) -> Match {
    Match {
        user_id: user.id,
        name: user.name,
        avatar: user.avatar,
        college: user.college,
        year: user.year,
        skills: user.skills,
        bio: user.bio,
        location: user.location,
        match_percentage,
    }
}

/// Every other user with a non-zero score, best first. Equal scores keep
/// storage order.
pub fn find_matches(db: &Database, caller: Uuid, limit: usize) -> ApiResult<MatchResponse> {
    let me = require_user(db, caller)?;
    let my_skills = skill_set(&me.skills);
    if my_skills.is_empty() || me.college.trim().is_empty() {
        return Err(ApiError::validation(
            "Please complete your profile (skills and college required) before finding matches",
        ));
    }

    let mut matches: Vec<Match> = db
        .list_users()?
        .into_iter()
        .filter(|u| u.id != me.id)
        .filter_map(|u| {
            let pct = score(&me, &my_skills, &u);
            (pct > 0).then(|| to_match(u, pct))
        })
        .collect();

    matches.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    matches.truncate(limit);
    debug!(%caller, count = matches.len(), "matches computed");

    Ok(MatchResponse {
        count: matches.len(),
        matches,
    })
}
