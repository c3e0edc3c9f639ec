use crate::models::{CommentDoc, ConnectionRow, MessageRow, OpportunityRow, PostRow, UserRow};
use crate::Database;
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password, avatar, headline, bio, skills, college, \
                            location, connections, followers, following, created_at, updated_at, year";
const CONNECTION_COLUMNS: &str = "id, requester, recipient, status, created_at, updated_at";
const POST_COLUMNS: &str =
    "id, author, content, image, hashtags, likes, comments, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, sender, recipient, content, read, created_at";
const OPPORTUNITY_COLUMNS: &str = "id, title, description, kind, company, location, tags, \
                                   deadline, applicants, created_by, created_at, updated_at";

impl Database {
    // -- Users --

    pub fn insert_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO users ({USER_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
                ),
                rusqlite::params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.password,
                    user.avatar,
                    user.headline,
                    user.bio,
                    to_json(&user.skills)?,
                    user.college,
                    user.location,
                    to_json(&user.connections)?,
                    to_json(&user.followers)?,
                    to_json(&user.following)?,
                    timestamp(&user.created_at),
                    timestamp(&user.updated_at),
                    user.year,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id.to_string()],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                [email],
                user_from_row,
            )
            .optional()
        })
    }

    /// Batch-fetch users by id. Unknown ids are skipped; order is unspecified.
    pub fn get_users(&self, ids: &[Uuid]) -> Result<Vec<UserRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id IN ({})",
                placeholders.join(", ")
            );

            let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(id_strings.iter()), user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Every user in insertion order.
    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid"))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Case-insensitive substring match on name, headline or any skill, in
    /// insertion order. A blank needle matches every user.
    pub fn search_users(&self, needle: &str, limit: u32) -> Result<Vec<UserRow>> {
        let needle = needle.trim().to_lowercase();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE ?1 = ''
                    OR instr(lower(name), ?1) > 0
                    OR instr(lower(headline), ?1) > 0
                    OR EXISTS (SELECT 1 FROM json_each(users.skills)
                               WHERE instr(lower(json_each.value), ?1) > 0)
                 ORDER BY rowid
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![needle, limit], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Persist the editable profile fields of `user`. Returns false if the
    /// user no longer exists.
    pub fn update_profile(&self, user: &UserRow) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET name = ?2, avatar = ?3, headline = ?4, bio = ?5, skills = ?6,
                     college = ?7, location = ?8, year = ?9, updated_at = ?10
                 WHERE id = ?1",
                rusqlite::params![
                    user.id.to_string(),
                    user.name,
                    user.avatar,
                    user.headline,
                    user.bio,
                    to_json(&user.skills)?,
                    user.college,
                    user.location,
                    user.year,
                    timestamp(&Utc::now()),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Add `other` to `user`'s connections if absent. `None` if `user` does not exist.
    pub fn add_connection(&self, user: Uuid, other: Uuid) -> Result<Option<bool>> {
        self.with_conn(|conn| {
            update_id_list(conn, "users", "connections", user, |ids| insert_unique(ids, other))
        })
    }

    /// Remove `other` from `user`'s connections if present.
    pub fn remove_connection(&self, user: Uuid, other: Uuid) -> Result<Option<bool>> {
        self.with_conn(|conn| {
            update_id_list(conn, "users", "connections", user, |ids| remove_all(ids, other))
        })
    }

    // -- Connections --

    /// Open a pending request unless a pending or accepted row already
    /// links the pair. A rejected row is reopened in place with the new
    /// direction. The check and the write share one lock.
    pub fn open_connection_request(&self, row: &ConnectionRow) -> Result<RequestOutcome> {
        self.with_conn(|conn| match connection_between(conn, row.requester, row.recipient)? {
            Some(existing) if existing.status != "rejected" => Ok(RequestOutcome::Exists(existing)),
            Some(rejected) => {
                conn.execute(
                    "UPDATE connections
                     SET requester = ?2, recipient = ?3, status = ?4, updated_at = ?5
                     WHERE id = ?1",
                    rusqlite::params![
                        rejected.id.to_string(),
                        row.requester.to_string(),
                        row.recipient.to_string(),
                        row.status,
                        timestamp(&row.updated_at),
                    ],
                )?;
                Ok(RequestOutcome::Opened(ConnectionRow {
                    id: rejected.id,
                    created_at: rejected.created_at,
                    ..row.clone()
                }))
            }
            None => {
                insert_connection_row(conn, row)?;
                Ok(RequestOutcome::Opened(row.clone()))
            }
        })
    }

    pub fn get_connection(&self, id: Uuid) -> Result<Option<ConnectionRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ?1"),
                [id.to_string()],
                connection_from_row,
            )
            .optional()
        })
    }

    /// The row linking `a` and `b` in either direction, whatever its status.
    pub fn find_connection_between(&self, a: Uuid, b: Uuid) -> Result<Option<ConnectionRow>> {
        self.with_conn(|conn| connection_between(conn, a, b))
    }

    pub fn set_connection_status(&self, id: Uuid, status: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE connections SET status = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id.to_string(), status, timestamp(&Utc::now())],
            )?;
            Ok(())
        })
    }

    pub fn delete_connections_between(&self, a: Uuid, b: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM connections
                 WHERE (requester = ?1 AND recipient = ?2)
                    OR (requester = ?2 AND recipient = ?1)",
                [a.to_string(), b.to_string()],
            )?;
            Ok(deleted)
        })
    }

    pub fn pending_requests_for(&self, recipient: Uuid) -> Result<Vec<ConnectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONNECTION_COLUMNS} FROM connections
                 WHERE recipient = ?1 AND status = 'pending'
                 ORDER BY created_at, rowid"
            ))?;
            let rows = stmt
                .query_map([recipient.to_string()], connection_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Posts --

    pub fn insert_post(&self, post: &PostRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO posts ({POST_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                rusqlite::params![
                    post.id.to_string(),
                    post.author.to_string(),
                    post.content,
                    post.image,
                    to_json(&post.hashtags)?,
                    to_json(&post.likes)?,
                    to_json(&post.comments)?,
                    timestamp(&post.created_at),
                    timestamp(&post.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: Uuid) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                [id.to_string()],
                post_from_row,
            )
            .optional()
        })
    }

    /// Newest first.
    pub fn recent_posts(&self, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, rowid DESC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map([limit], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Toggle a like: removes `user` if present, adds it if not.
    /// `None` if the post does not exist, otherwise `Some(liked)`.
    pub fn toggle_like(&self, post: Uuid, user: Uuid) -> Result<Option<bool>> {
        self.with_conn(|conn| {
            let mut liked = false;
            let found = update_id_list(conn, "posts", "likes", post, |ids| {
                if !remove_all(ids, user) {
                    ids.push(user);
                    liked = true;
                }
                true
            })?;
            Ok(found.map(|_| liked))
        })
    }

    /// Append a comment. Returns false if the post does not exist.
    pub fn push_comment(&self, post: Uuid, comment: &CommentDoc) -> Result<bool> {
        self.with_conn(|conn| {
            let current: Option<String> = conn
                .query_row(
                    "SELECT comments FROM posts WHERE id = ?1",
                    [post.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(current) = current else {
                return Ok(false);
            };

            let mut comments: Vec<CommentDoc> = serde_json::from_str(&current)?;
            comments.push(comment.clone());

            conn.execute(
                "UPDATE posts SET comments = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![post.to_string(), to_json(&comments)?, timestamp(&Utc::now())],
            )?;
            Ok(true)
        })
    }

    pub fn delete_post(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM posts WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                rusqlite::params![
                    message.id.to_string(),
                    message.sender.to_string(),
                    message.recipient.to_string(),
                    message.content,
                    message.read,
                    timestamp(&message.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Both directions between `a` and `b`, oldest first.
    pub fn messages_between(&self, a: Uuid, b: Uuid) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE (sender = ?1 AND recipient = ?2)
                    OR (sender = ?2 AND recipient = ?1)
                 ORDER BY created_at, rowid"
            ))?;
            let rows = stmt
                .query_map([a.to_string(), b.to_string()], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every message sent or received by `user`, newest first.
    pub fn messages_involving(&self, user: Uuid) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE sender = ?1 OR recipient = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user.to_string()], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark every unread message from `sender` to `recipient` as read.
    pub fn mark_thread_read(&self, sender: Uuid, recipient: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE messages SET read = 1 WHERE sender = ?1 AND recipient = ?2 AND read = 0",
                [sender.to_string(), recipient.to_string()],
            )?;
            Ok(updated)
        })
    }

    // -- Opportunities --

    pub fn insert_opportunity(&self, opp: &OpportunityRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO opportunities ({OPPORTUNITY_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                rusqlite::params![
                    opp.id.to_string(),
                    opp.title,
                    opp.description,
                    opp.kind,
                    opp.company,
                    opp.location,
                    to_json(&opp.tags)?,
                    opp.deadline.as_ref().map(timestamp),
                    to_json(&opp.applicants)?,
                    opp.created_by.to_string(),
                    timestamp(&opp.created_at),
                    timestamp(&opp.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_opportunity(&self, id: Uuid) -> Result<Option<OpportunityRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {OPPORTUNITY_COLUMNS} FROM opportunities WHERE id = ?1"),
                [id.to_string()],
                opportunity_from_row,
            )
            .optional()
        })
    }

    /// Newest first.
    pub fn list_opportunities(&self) -> Result<Vec<OpportunityRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([], opportunity_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Add `user` to the applicants. `None` if the opportunity does not exist,
    /// `Some(false)` if the user had already applied.
    pub fn add_applicant(&self, opportunity: Uuid, user: Uuid) -> Result<Option<bool>> {
        self.with_conn(|conn| {
            update_id_list(conn, "opportunities", "applicants", opportunity, |ids| {
                insert_unique(ids, user)
            })
        })
    }
}

/// Outcome of [`Database::open_connection_request`].
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Opened(ConnectionRow),
    Exists(ConnectionRow),
}

fn insert_connection_row(conn: &Connection, row: &ConnectionRow) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO connections ({CONNECTION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        rusqlite::params![
            row.id.to_string(),
            row.requester.to_string(),
            row.recipient.to_string(),
            row.status,
            timestamp(&row.created_at),
            timestamp(&row.updated_at),
        ],
    )?;
    Ok(())
}

fn connection_between(conn: &Connection, a: Uuid, b: Uuid) -> Result<Option<ConnectionRow>> {
    conn.query_row(
        &format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections
             WHERE (requester = ?1 AND recipient = ?2)
                OR (requester = ?2 AND recipient = ?1)
             LIMIT 1"
        ),
        [a.to_string(), b.to_string()],
        connection_from_row,
    )
    .optional()
}

/// Read-modify-write of one JSON id array on one document. `f` returns
/// whether it changed the list; nothing is written otherwise.
/// Returns `None` when the document does not exist.
fn update_id_list<F>(
    conn: &Connection,
    table: &'static str,
    column: &'static str,
    id: Uuid,
    f: F,
) -> Result<Option<bool>>
where
    F: FnOnce(&mut Vec<Uuid>) -> bool,
{
    let current: Option<String> = conn
        .query_row(
            &format!("SELECT {column} FROM {table} WHERE id = ?1"),
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    let Some(current) = current else {
        return Ok(None);
    };

    let mut ids: Vec<Uuid> = serde_json::from_str(&current)?;
    if !f(&mut ids) {
        return Ok(Some(false));
    }

    conn.execute(
        &format!("UPDATE {table} SET {column} = ?2, updated_at = ?3 WHERE id = ?1"),
        rusqlite::params![id.to_string(), to_json(&ids)?, timestamp(&Utc::now())],
    )?;
    Ok(Some(true))
}

fn insert_unique(ids: &mut Vec<Uuid>, id: Uuid) -> bool {
    if ids.contains(&id) {
        return false;
    }
    ids.push(id);
    true
}

fn remove_all(ids: &mut Vec<Uuid>, id: Uuid) -> bool {
    let before = ids.len();
    ids.retain(|existing| *existing != id);
    ids.len() != before
}

// -- Row mapping --

fn user_from_row(row: &Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        avatar: row.get(4)?,
        headline: row.get(5)?,
        bio: row.get(6)?,
        skills: json_at(row, 7)?,
        college: row.get(8)?,
        location: row.get(9)?,
        connections: json_at(row, 10)?,
        followers: json_at(row, 11)?,
        following: json_at(row, 12)?,
        created_at: timestamp_at(row, 13)?,
        updated_at: timestamp_at(row, 14)?,
        year: row.get(15)?,
    })
}

fn connection_from_row(row: &Row) -> rusqlite::Result<ConnectionRow> {
    Ok(ConnectionRow {
        id: uuid_at(row, 0)?,
        requester: uuid_at(row, 1)?,
        recipient: uuid_at(row, 2)?,
        status: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
        updated_at: timestamp_at(row, 5)?,
    })
}

fn post_from_row(row: &Row) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: uuid_at(row, 0)?,
        author: uuid_at(row, 1)?,
        content: row.get(2)?,
        image: row.get(3)?,
        hashtags: json_at(row, 4)?,
        likes: json_at(row, 5)?,
        comments: json_at(row, 6)?,
        created_at: timestamp_at(row, 7)?,
        updated_at: timestamp_at(row, 8)?,
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: uuid_at(row, 0)?,
        sender: uuid_at(row, 1)?,
        recipient: uuid_at(row, 2)?,
        content: row.get(3)?,
        read: row.get(4)?,
        created_at: timestamp_at(row, 5)?,
    })
}

fn opportunity_from_row(row: &Row) -> rusqlite::Result<OpportunityRow> {
    let deadline: Option<String> = row.get(7)?;
    Ok(OpportunityRow {
        id: uuid_at(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        kind: row.get(3)?,
        company: row.get(4)?,
        location: row.get(5)?,
        tags: json_at(row, 6)?,
        deadline: deadline
            .map(|s| parse_timestamp(&s).map_err(|e| conversion_error(7, e)))
            .transpose()?,
        applicants: json_at(row, 8)?,
        created_by: uuid_at(row, 9)?,
        created_at: timestamp_at(row, 10)?,
        updated_at: timestamp_at(row, 11)?,
    })
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn uuid_at(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| conversion_error(idx, e))
}

fn json_at<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
