use std::collections::HashMap;

use uuid::Uuid;

use connectx_db::Database;
use connectx_db::models::UserRow;
use connectx_types::models::UserRef;

/// Which user fields an embedded reference carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fields {
    /// name, avatar
    Basic,
    /// name, avatar, headline
    Headline,
    /// name, avatar, headline, college
    Card,
}

pub fn user_ref(user: &UserRow, fields: Fields) -> UserRef {
    let headline = matches!(fields, Fields::Headline | Fields::Card).then(|| user.headline.clone());
    let college = matches!(fields, Fields::Card).then(|| user.college.clone());

    UserRef {
        id: user.id,
        name: user.name.clone(),
        avatar: user.avatar.clone(),
        headline,
        college,
    }
}

/// The users referenced by a batch of documents, fetched in one query.
pub struct Directory {
    users: HashMap<Uuid, UserRow>,
}

impl Directory {
    pub fn load<I>(db: &Database, ids: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = Uuid>,
    {
        let mut wanted: Vec<Uuid> = ids.into_iter().collect();
        wanted.sort_unstable();
        wanted.dedup();

        let users = db
            .get_users(&wanted)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        Ok(Self { users })
    }

    /// A single reference; a deleted user becomes a placeholder.
    pub fn one(&self, id: Uuid, fields: Fields) -> UserRef {
        self.users
            .get(&id)
            .map(|user| user_ref(user, fields))
            .unwrap_or_else(|| UserRef::unknown(id))
    }

    /// A reference list in the given order; deleted users are dropped.
    pub fn many(&self, ids: &[Uuid], fields: Fields) -> Vec<UserRef> {
        ids.iter()
            .filter_map(|id| self.users.get(id))
            .map(|user| user_ref(user, fields))
            .collect()
    }
}
