use tracing::info;
use uuid::Uuid;

use connectx_db::Database;
use connectx_db::models::{self, CommentDoc, PostRow};
use connectx_types::api::{CreatePostRequest, MessageResponse};
use connectx_types::models::{Comment, Post};

use crate::error::{ApiError, ApiResult};
use crate::services::directory::{Directory, Fields};

pub const FEED_LIMIT: u32 = 50;

fn expand_posts(db: &Database, rows: Vec<PostRow>) -> anyhow::Result<Vec<Post>> {
    let referenced = rows
        .iter()
        .flat_map(|p| std::iter::once(p.author).chain(p.comments.iter().map(|c| c.user)));
    let dir = Directory::load(db, referenced)?;

    Ok(rows
        .into_iter()
        .map(|row| Post {
            id: row.id,
            author: dir.one(row.author, Fields::Headline),
            content: row.content,
            image: row.image,
            hashtags: row.hashtags,
            likes: row.likes,
            comments: row
                .comments
                .into_iter()
                .map(|c| Comment {
                    id: c.id,
                    user: dir.one(c.user, Fields::Basic),
                    text: c.text,
                    created_at: c.created_at,
                })
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

fn expand_post(db: &Database, row: PostRow) -> ApiResult<Post> {
    expand_posts(db, vec![row])?
        .pop()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post expansion produced nothing")))
}

fn load_post(db: &Database, id: Uuid) -> ApiResult<Post> {
    let row = db
        .get_post(id)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    expand_post(db, row)
}

pub fn feed(db: &Database) -> ApiResult<Vec<Post>> {
    let rows = db.recent_posts(FEED_LIMIT)?;
    Ok(expand_posts(db, rows)?)
}

pub fn create(db: &Database, author: Uuid, req: CreatePostRequest) -> ApiResult<Post> {
    if req.content.trim().is_empty() {
        return Err(ApiError::validation("Post content is required"));
    }

    let now = models::now();
    let row = PostRow {
        id: Uuid::new_v4(),
        author,
        content: req.content,
        image: req.image.unwrap_or_default(),
        hashtags: req.hashtags.unwrap_or_default(),
        likes: Vec::new(),
        comments: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    db.insert_post(&row)?;

    expand_post(db, row)
}

pub fn get(db: &Database, id: Uuid) -> ApiResult<Post> {
    load_post(db, id)
}

pub fn toggle_like(db: &Database, caller: Uuid, post: Uuid) -> ApiResult<Post> {
    if db.toggle_like(post, caller)?.is_none() {
        return Err(ApiError::not_found("Post not found"));
    }
    load_post(db, post)
}

pub fn add_comment(db: &Database, caller: Uuid, post: Uuid, text: &str) -> ApiResult<Post> {
    if text.trim().is_empty() {
        return Err(ApiError::validation("Comment text is required"));
    }

    let comment = CommentDoc {
        id: Uuid::new_v4(),
        user: caller,
        text: text.to_string(),
        created_at: models::now(),
    };
    if !db.push_comment(post, &comment)? {
        return Err(ApiError::not_found("Post not found"));
    }
    load_post(db, post)
}

pub fn delete(db: &Database, caller: Uuid, post: Uuid) -> ApiResult<MessageResponse> {
    let row = db
        .get_post(post)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if row.author != caller {
        return Err(ApiError::unauthorized("Not authorized to delete this post"));
    }

    db.delete_post(post)?;
    info!(post_id = %post, author = %caller, "post deleted");

    Ok(MessageResponse::new("Post deleted successfully"))
}
