use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use magpie_types::models::{LikeRef, TweetDetail, UserRef};

use crate::Database;
use crate::models::{LikeOutcome, TweetRow};

impl Database {
    // -- Tweets --

    pub fn create_tweet(&self, author_id: i64, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tweets (author_id, content) VALUES (?1, ?2)",
                rusqlite::params![author_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_tweet(&self, id: i64) -> Result<Option<TweetRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, author_id, content FROM tweets WHERE id = ?1",
                    rusqlite::params![id],
                    |row| {
                        Ok(TweetRow {
                            id: row.get(0)?,
                            author_id: row.get(1)?,
                            content: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn remove_tweet(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("DELETE FROM tweets WHERE id = ?1", rusqlite::params![id])?;
            Ok(changed > 0)
        })
    }

    /// Single-tweet projection with author, attachments and likes.
    pub fn tweet_detail(&self, id: i64) -> Result<Option<TweetDetail>> {
        self.with_conn(|conn| {
            let Some((tweet, author)) = query_tweet_with_author(conn, id)? else {
                return Ok(None);
            };
            let mut attachments = query_attachments(conn, &[id])?;
            let mut likes = query_likes(conn, &[id])?;
            Ok(Some(TweetDetail {
                id: tweet.id,
                content: tweet.content,
                attachments: attachments.remove(&id).unwrap_or_default(),
                author,
                likes: likes.remove(&id).unwrap_or_default(),
            }))
        })
    }

    /// Ordered page of tweet projections, newest first. Attachments and
    /// likes are batch-fetched to avoid per-tweet queries.
    pub fn tweet_page(&self, skip: u32, limit: u32) -> Result<Vec<TweetDetail>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.content, u.id, u.name
                 FROM tweets t JOIN users u ON u.id = t.author_id
                 ORDER BY t.created_at DESC, t.id DESC
                 LIMIT ?1 OFFSET ?2",
            )?;
            let base: Vec<(i64, String, UserRef)> = stmt
                .query_map(rusqlite::params![limit, skip], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        UserRef {
                            id: row.get(2)?,
                            name: row.get(3)?,
                        },
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<i64> = base.iter().map(|(id, _, _)| *id).collect();
            let mut attachments = query_attachments(conn, &ids)?;
            let mut likes = query_likes(conn, &ids)?;

            Ok(base
                .into_iter()
                .map(|(id, content, author)| TweetDetail {
                    id,
                    content,
                    attachments: attachments.remove(&id).unwrap_or_default(),
                    author,
                    likes: likes.remove(&id).unwrap_or_default(),
                })
                .collect())
        })
    }

    // -- Likes --

    /// Insert a like edge. A vanished tweet reports `TweetMissing`, a
    /// duplicate like `AlreadyLiked`.
    pub fn create_like(&self, user_id: i64, tweet_id: i64) -> Result<LikeOutcome> {
        self.with_conn(|conn| {
            if !tweet_exists(conn, tweet_id)? {
                return Ok(LikeOutcome::TweetMissing);
            }
            let changed = conn.execute(
                "INSERT OR IGNORE INTO likes (user_id, tweet_id) VALUES (?1, ?2)",
                rusqlite::params![user_id, tweet_id],
            )?;
            if changed == 0 {
                Ok(LikeOutcome::AlreadyLiked)
            } else {
                Ok(LikeOutcome::Created)
            }
        })
    }

    pub fn remove_like(&self, user_id: i64, tweet_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND tweet_id = ?2",
                rusqlite::params![user_id, tweet_id],
            )?;
            Ok(())
        })
    }

    pub fn check_like(&self, user_id: i64, tweet_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM likes WHERE user_id = ?1 AND tweet_id = ?2",
                    rusqlite::params![user_id, tweet_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}

fn tweet_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM tweets WHERE id = ?1", rusqlite::params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn query_tweet_with_author(conn: &Connection, id: i64) -> Result<Option<(TweetRow, UserRef)>> {
    let row = conn.query_row(
        "SELECT t.id, t.author_id, t.content, u.name
         FROM tweets t JOIN users u ON u.id = t.author_id
         WHERE t.id = ?1",
        rusqlite::params![id],
        |row| {
            Ok((
                TweetRow {
                    id: row.get(0)?,
                    author_id: row.get(1)?,
                    content: row.get(2)?,
                },
                UserRef {
                    id: row.get(1)?,
                    name: row.get(3)?,
                },
            ))
        },
    )
    .optional()?;
    Ok(row)
}

/// Batch-fetch attachment paths for a set of tweet ids, keyed by tweet.
fn query_attachments(conn: &Connection, tweet_ids: &[i64]) -> Result<HashMap<i64, Vec<String>>> {
    if tweet_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders: Vec<String> = (1..=tweet_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT tweet_id, path FROM media WHERE tweet_id IN ({}) ORDER BY id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = tweet_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut out: HashMap<i64, Vec<String>> = HashMap::new();
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (tweet_id, path) = row?;
        out.entry(tweet_id).or_default().push(path);
    }
    Ok(out)
}

/// Batch-fetch likers for a set of tweet ids, keyed by tweet.
fn query_likes(conn: &Connection, tweet_ids: &[i64]) -> Result<HashMap<i64, Vec<LikeRef>>> {
    if tweet_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders: Vec<String> = (1..=tweet_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT l.tweet_id, l.user_id, u.name
         FROM likes l JOIN users u ON u.id = l.user_id
         WHERE l.tweet_id IN ({})
         ORDER BY l.user_id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = tweet_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut out: HashMap<i64, Vec<LikeRef>> = HashMap::new();
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            LikeRef {
                user_id: row.get(1)?,
                name: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (tweet_id, like) = row?;
        out.entry(tweet_id).or_default().push(like);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_tweet() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("alice", "hash", true).unwrap();
        let tweet = db.create_tweet(user, "hello").unwrap();
        (db, user, tweet)
    }

    #[test]
    fn test_like_lifecycle() {
        let (db, user, tweet) = db_with_tweet();

        assert_eq!(db.create_like(user, tweet).unwrap(), LikeOutcome::Created);
        assert_eq!(db.create_like(user, tweet).unwrap(), LikeOutcome::AlreadyLiked);
        assert!(db.check_like(user, tweet).unwrap());

        db.remove_like(user, tweet).unwrap();
        assert!(!db.check_like(user, tweet).unwrap());
    }

    #[test]
    fn test_like_on_missing_tweet() {
        let (db, user, _) = db_with_tweet();
        assert_eq!(db.create_like(user, 999).unwrap(), LikeOutcome::TweetMissing);
    }

    #[test]
    fn test_tweet_detail_joins() {
        let (db, user, tweet) = db_with_tweet();
        let other = db.create_user("bob", "hash", true).unwrap();
        db.create_like(other, tweet).unwrap();

        let media = db.create_media("uploads/a.png").unwrap();
        db.associate_media(tweet, &[media]).unwrap();

        let detail = db.tweet_detail(tweet).unwrap().unwrap();
        assert_eq!(detail.author.id, user);
        assert_eq!(detail.attachments, vec!["uploads/a.png".to_string()]);
        assert_eq!(detail.likes.len(), 1);
        assert_eq!(detail.likes[0].user_id, other);

        assert!(db.tweet_detail(999).unwrap().is_none());
    }

    #[test]
    fn test_tweet_page_is_newest_first() {
        let (db, user, first) = db_with_tweet();
        let second = db.create_tweet(user, "later").unwrap();

        let page = db.tweet_page(0, 50).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, second);
        assert_eq!(page[1].id, first);

        let rest = db.tweet_page(1, 50).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, first);
    }

    #[test]
    fn test_remove_tweet_cascades_likes() {
        let (db, user, tweet) = db_with_tweet();
        db.create_like(user, tweet).unwrap();

        assert!(db.remove_tweet(tweet).unwrap());
        assert!(!db.remove_tweet(tweet).unwrap());
        assert!(!db.check_like(user, tweet).unwrap());
    }
}
