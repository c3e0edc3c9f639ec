use uuid::Uuid;

use connectx_db::Database;
use connectx_db::models::UserRow;
use connectx_types::api::UpdateProfileRequest;
use connectx_types::models::{Profile, PublicUser};

use crate::error::{ApiError, ApiResult};
use crate::services::directory::{Directory, Fields};

pub const SEARCH_LIMIT: usize = 20;
pub const SUGGESTION_LIMIT: usize = 10;

pub fn public_user(user: UserRow) -> PublicUser {
    PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
        avatar: user.avatar,
        headline: user.headline,
        bio: user.bio,
        skills: user.skills,
        college: user.college,
        location: user.location,
        year: user.year,
        connections: user.connections,
        followers: user.followers,
        following: user.following,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub(crate) fn require_user(db: &Database, id: Uuid) -> ApiResult<UserRow> {
    db.get_user(id)?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub fn get_profile(db: &Database, id: Uuid) -> ApiResult<Profile> {
    let user = require_user(db, id)?;

    let related = user
        .connections
        .iter()
        .chain(&user.followers)
        .chain(&user.following)
        .copied();
    let dir = Directory::load(db, related)?;

    Ok(Profile {
        connections: dir.many(&user.connections, Fields::Headline),
        followers: dir.many(&user.followers, Fields::Headline),
        following: dir.many(&user.following, Fields::Headline),
        id: user.id,
        name: user.name,
        email: user.email,
        avatar: user.avatar,
        headline: user.headline,
        bio: user.bio,
        skills: user.skills,
        college: user.college,
        location: user.location,
        year: user.year,
        created_at: user.created_at,
        updated_at: user.updated_at,
    })
}

/// Overwrite only the fields present in `req`.
pub fn update_profile(db: &Database, caller: Uuid, req: UpdateProfileRequest) -> ApiResult<PublicUser> {
    let mut user = require_user(db, caller)?;

    if let Some(name) = req.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Name cannot be empty"));
        }
        user.name = name.to_string();
    }
    if let Some(headline) = req.headline {
        user.headline = headline;
    }
    if let Some(bio) = req.bio {
        user.bio = bio;
    }
    if let Some(skills) = req.skills {
        user.skills = skills;
    }
    if let Some(college) = req.college {
        user.college = college;
    }
    if let Some(location) = req.location {
        user.location = location;
    }
    if let Some(year) = req.year {
        user.year = year;
    }
    if let Some(avatar) = req.avatar {
        user.avatar = avatar;
    }

    if !db.update_profile(&user)? {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(public_user(require_user(db, caller)?))
}

/// Case-insensitive substring match on name, headline or any skill.
pub fn search(db: &Database, query: &str) -> ApiResult<Vec<PublicUser>> {
    Ok(db
        .search_users(query, SEARCH_LIMIT as u32)?
        .into_iter()
        .map(public_user)
        .collect())
}

/// Users the caller is not yet connected to, in storage order.
pub fn suggested(db: &Database, caller: Uuid) -> ApiResult<Vec<PublicUser>> {
    let me = require_user(db, caller)?;

    Ok(db
        .list_users()?
        .into_iter()
        .filter(|u| u.id != me.id && !me.connections.contains(&u.id))
        .take(SUGGESTION_LIMIT)
        .map(public_user)
        .collect())
}
