use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use magpie_types::models::{UserDetail, UserPatch, UserRef};

use crate::Database;
use crate::models::{FollowOutcome, UnfollowOutcome, UserRow};

impl Database {
    // -- Users --

    pub fn create_user(&self, name: &str, password_hash: &str, active: bool) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, hashed_password, active) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, password_hash, active],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, name, hashed_password, active FROM users WHERE id = ?1", rusqlite::params![id])
        })
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, name, hashed_password, active FROM users WHERE name = ?1", rusqlite::params![name])
        })
    }

    /// Resolve a long-lived API key to its owner.
    pub fn get_user_by_api_key(&self, api_key: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT u.id, u.name, u.hashed_password, u.active
                 FROM users u JOIN tokens t ON t.user_id = u.id
                 WHERE t.api_key = ?1",
                rusqlite::params![api_key],
            )
        })
    }

    pub fn get_users(&self, skip: u32, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, hashed_password, active FROM users ORDER BY id LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![limit, skip], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Apply a partial update, returning the merged row. `None` when the
    /// user does not exist.
    pub fn update_user(&self, id: i64, patch: &UserPatch) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let Some(current) = query_user(
                conn,
                "SELECT id, name, hashed_password, active FROM users WHERE id = ?1",
                rusqlite::params![id],
            )?
            else {
                return Ok(None);
            };

            let name = patch.name.clone().unwrap_or(current.name);
            let active = patch.active.unwrap_or(current.active);
            conn.execute(
                "UPDATE users SET name = ?1, active = ?2 WHERE id = ?3",
                rusqlite::params![name, active, id],
            )?;

            Ok(Some(UserRow {
                id,
                name,
                hashed_password: current.hashed_password,
                active,
            }))
        })
    }

    /// Delete a user. Tokens, tweets, likes and follow edges cascade.
    pub fn remove_user(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id])?;
            Ok(changed > 0)
        })
    }

    /// Full projection with both sides of the follow relation joined in.
    pub fn user_detail(&self, id: i64) -> Result<Option<UserDetail>> {
        self.with_conn(|conn| {
            let Some(user) = query_user(
                conn,
                "SELECT id, name, hashed_password, active FROM users WHERE id = ?1",
                rusqlite::params![id],
            )?
            else {
                return Ok(None);
            };

            let followers = query_refs(
                conn,
                "SELECT u.id, u.name FROM follows f JOIN users u ON u.id = f.follower_id
                 WHERE f.followed_id = ?1 ORDER BY u.id",
                id,
            )?;
            let following = query_refs(
                conn,
                "SELECT u.id, u.name FROM follows f JOIN users u ON u.id = f.followed_id
                 WHERE f.follower_id = ?1 ORDER BY u.id",
                id,
            )?;

            Ok(Some(UserDetail {
                id: user.id,
                name: user.name,
                followers,
                following,
            }))
        })
    }

    // -- API keys --

    pub fn create_api_key(&self, user_id: i64, api_key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tokens (api_key, user_id) VALUES (?1, ?2)",
                rusqlite::params![api_key, user_id],
            )?;
            Ok(())
        })
    }

    // -- Follows --

    /// Insert a follow edge. A duplicate edge reports `AlreadyExists`
    /// rather than an error; a missing target reports `TargetMissing`.
    pub fn add_follow(&self, follower_id: i64, followed_id: i64) -> Result<FollowOutcome> {
        self.with_conn(|conn| {
            if !user_exists(conn, followed_id)? {
                return Ok(FollowOutcome::TargetMissing);
            }
            let changed = conn.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                rusqlite::params![follower_id, followed_id],
            )?;
            if changed == 0 {
                Ok(FollowOutcome::AlreadyExists)
            } else {
                Ok(FollowOutcome::Created)
            }
        })
    }

    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<UnfollowOutcome> {
        self.with_conn(|conn| {
            if !user_exists(conn, followed_id)? {
                return Ok(UnfollowOutcome::TargetMissing);
            }
            let changed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                rusqlite::params![follower_id, followed_id],
            )?;
            if changed == 0 {
                Ok(UnfollowOutcome::NotFollowing)
            } else {
                Ok(UnfollowOutcome::Removed)
            }
        })
    }

    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                    rusqlite::params![follower_id, followed_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}

fn user_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", rusqlite::params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        hashed_password: row.get(2)?,
        active: row.get(3)?,
    })
}

fn query_user(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    Ok(stmt.query_row(params, user_from_row).optional()?)
}

fn query_refs(conn: &Connection, sql: &str, id: i64) -> Result<Vec<UserRef>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(rusqlite::params![id], |row| {
            Ok(UserRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_users() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("alice", "hash-a", true).unwrap();
        let b = db.create_user("bob", "hash-b", true).unwrap();
        (db, a, b)
    }

    #[test]
    fn test_api_key_resolution() {
        let (db, a, _) = db_with_users();
        db.create_api_key(a, "test").unwrap();

        let user = db.get_user_by_api_key("test").unwrap().unwrap();
        assert_eq!(user.id, a);
        assert!(db.get_user_by_api_key("nope").unwrap().is_none());
    }

    #[test]
    fn test_add_follow_is_idempotent() {
        let (db, a, b) = db_with_users();

        assert_eq!(db.add_follow(a, b).unwrap(), FollowOutcome::Created);
        assert_eq!(db.add_follow(a, b).unwrap(), FollowOutcome::AlreadyExists);

        let detail = db.user_detail(a).unwrap().unwrap();
        assert_eq!(detail.following.len(), 1);
        assert_eq!(detail.following[0].id, b);
    }

    #[test]
    fn test_follow_target_missing() {
        let (db, a, _) = db_with_users();
        assert_eq!(db.add_follow(a, 999).unwrap(), FollowOutcome::TargetMissing);
        assert_eq!(db.unfollow(a, 999).unwrap(), UnfollowOutcome::TargetMissing);
    }

    #[test]
    fn test_unfollow_without_edge_is_benign() {
        let (db, a, b) = db_with_users();
        assert_eq!(db.unfollow(a, b).unwrap(), UnfollowOutcome::NotFollowing);

        db.add_follow(a, b).unwrap();
        assert_eq!(db.unfollow(a, b).unwrap(), UnfollowOutcome::Removed);
        assert!(!db.is_following(a, b).unwrap());
    }

    #[test]
    fn test_user_detail_has_both_sides() {
        let (db, a, b) = db_with_users();
        db.add_follow(a, b).unwrap();

        let a_detail = db.user_detail(a).unwrap().unwrap();
        assert!(a_detail.followers.is_empty());
        assert_eq!(a_detail.following[0].name, "bob");

        let b_detail = db.user_detail(b).unwrap().unwrap();
        assert_eq!(b_detail.followers[0].name, "alice");
        assert!(b_detail.following.is_empty());
    }

    #[test]
    fn test_update_user_merges_patch() {
        let (db, a, _) = db_with_users();
        let patch = UserPatch {
            active: Some(false),
            ..Default::default()
        };

        let row = db.update_user(a, &patch).unwrap().unwrap();
        assert_eq!(row.name, "alice");
        assert!(!row.active);
        assert!(db.update_user(999, &patch).unwrap().is_none());
    }

    #[test]
    fn test_remove_user_cascades() {
        let (db, a, b) = db_with_users();
        db.create_api_key(a, "test").unwrap();
        db.add_follow(a, b).unwrap();

        assert!(db.remove_user(a).unwrap());
        assert!(!db.remove_user(a).unwrap());
        assert!(db.get_user_by_api_key("test").unwrap().is_none());
        assert!(db.user_detail(b).unwrap().unwrap().followers.is_empty());
    }

    #[test]
    fn test_remove_user_cascades_attached_media() {
        let (db, a, _) = db_with_users();
        let tweet = db.create_tweet(a, "with pic").unwrap();
        let media = db.create_media("uploads/a.png").unwrap();
        db.associate_media(tweet, &[media]).unwrap();

        assert_eq!(
            db.media_paths_for_author(a).unwrap(),
            vec!["uploads/a.png".to_string()]
        );

        assert!(db.remove_user(a).unwrap());
        assert!(db.get_tweet(tweet).unwrap().is_none());
        assert!(db.get_media(media).unwrap().is_none());
        assert!(db.media_paths_for_author(a).unwrap().is_empty());
    }
}
