use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use connectx_db::Database;
use connectx_db::models::{self, MessageRow};
use connectx_types::models::{Conversation, Message};

use crate::error::{ApiError, ApiResult};
use crate::services::directory::{Directory, Fields};

fn expand_messages(db: &Database, rows: Vec<MessageRow>) -> anyhow::Result<Vec<Message>> {
    let dir = Directory::load(db, rows.iter().flat_map(|m| [m.sender, m.recipient]))?;

    Ok(rows
        .into_iter()
        .map(|row| Message {
            id: row.id,
            sender: dir.one(row.sender, Fields::Basic),
            recipient: dir.one(row.recipient, Fields::Basic),
            content: row.content,
            read: row.read,
            created_at: row.created_at,
        })
        .collect())
}

/// Latest message per counterpart, most recent conversation first.
pub fn conversations(db: &Database, caller: Uuid) -> ApiResult<Vec<Conversation>> {
    let mut seen = HashSet::new();
    let latest: Vec<(Uuid, MessageRow)> = db
        .messages_involving(caller)?
        .into_iter()
        .filter_map(|m| {
            let other = if m.sender == caller { m.recipient } else { m.sender };
            seen.insert(other).then_some((other, m))
        })
        .collect();

    let (others, rows): (Vec<Uuid>, Vec<MessageRow>) = latest.into_iter().unzip();
    let messages = expand_messages(db, rows)?;

    Ok(others
        .into_iter()
        .zip(messages)
        .map(|(id, last_message)| Conversation { id, last_message })
        .collect())
}

/// The full exchange with `other`, oldest first. Messages from `other` are
/// marked read afterwards; the returned list still shows their prior state.
pub fn thread(db: &Database, caller: Uuid, other: Uuid) -> ApiResult<Vec<Message>> {
    let rows = db.messages_between(caller, other)?;
    let messages = expand_messages(db, rows)?;

    let marked = db.mark_thread_read(other, caller)?;
    if marked > 0 {
        debug!(%caller, %other, marked, "messages marked read");
    }

    Ok(messages)
}

pub fn send(db: &Database, sender: Uuid, recipient: Uuid, content: &str) -> ApiResult<Message> {
    if content.trim().is_empty() {
        return Err(ApiError::validation("Message content is required"));
    }
    if db.get_user(recipient)?.is_none() {
        return Err(ApiError::not_found("Recipient not found"));
    }

    let row = MessageRow {
        id: Uuid::new_v4(),
        sender,
        recipient,
        content: content.to_string(),
        read: false,
        created_at: models::now(),
    };
    db.insert_message(&row)?;

    expand_messages(db, vec![row])?
        .pop()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("message expansion produced nothing")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectx_db::models::UserRow;

    fn add_user(db: &Database, name: &str) -> Uuid {
        let user = UserRow::new(name, &format!("{}@x.com", name.to_lowercase()), "hash");
        db.insert_user(&user).unwrap();
        user.id
    }

    #[test]
    fn conversation_holds_latest_and_thread_marks_read() {
        let db = Database::open_in_memory().unwrap();
        let sender = add_user(&db, "Sam");
        let reader = add_user(&db, "Rita");

        for text in ["one", "two", "three"] {
            send(&db, sender, reader, text).unwrap();
        }

        let convos = conversations(&db, reader).unwrap();
        assert_eq!(convos.len(), 1);
        assert_eq!(convos[0].id, sender);
        assert_eq!(convos[0].last_message.content, "three");
        assert_eq!(convos[0].last_message.sender.name, "Sam");

        // the sender reading does not mark anything
        thread(&db, sender, reader).unwrap();
        assert!(thread(&db, reader, sender).unwrap().iter().all(|m| !m.read));

        let after = thread(&db, reader, sender).unwrap();
        let contents: Vec<&str> = after.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert!(after.iter().all(|m| m.read));
    }

    #[test]
    fn conversations_group_by_counterpart() {
        let db = Database::open_in_memory().unwrap();
        let me = add_user(&db, "Me");
        let a = add_user(&db, "A");
        let b = add_user(&db, "B");

        send(&db, a, me, "from a").unwrap();
        send(&db, me, b, "to b").unwrap();
        send(&db, me, a, "reply a").unwrap();

        let convos = conversations(&db, me).unwrap();
        let ids: Vec<Uuid> = convos.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(convos[0].last_message.content, "reply a");
    }

    #[test]
    fn send_validation() {
        let db = Database::open_in_memory().unwrap();
        let me = add_user(&db, "Me");
        let other = add_user(&db, "Other");

        assert!(matches!(send(&db, me, other, "  "), Err(ApiError::Validation(_))));
        assert!(matches!(send(&db, me, Uuid::new_v4(), "hi"), Err(ApiError::NotFound(_))));

        let sent = send(&db, me, other, "hi").unwrap();
        assert!(!sent.read);
        assert_eq!(sent.recipient.name, "Other");
        assert_eq!(thread(&db, me, other).unwrap()[0].created_at, sent.created_at);
    }
}
