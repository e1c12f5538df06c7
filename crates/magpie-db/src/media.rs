use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::MediaRow;

impl Database {
    /// Create a media row for an uploaded file. The row exists before the
    /// physical write completes; `tweet_id` stays NULL until the media is
    /// attached at tweet creation.
    pub fn create_media(&self, path: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO media (path) VALUES (?1)",
                rusqlite::params![path],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_media(&self, id: i64) -> Result<Option<MediaRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, path, tweet_id FROM media WHERE id = ?1",
                    rusqlite::params![id],
                    |row| {
                        Ok(MediaRow {
                            id: row.get(0)?,
                            path: row.get(1)?,
                            tweet_id: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// How many of the given ids exist and are not yet attached to a
    /// tweet. Tweet creation compares this against the requested count.
    pub fn count_unattached(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT COUNT(*) FROM media WHERE tweet_id IS NULL AND id IN ({})",
                placeholders.join(", ")
            );
            let params: Vec<&dyn rusqlite::types::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
            let count: i64 = conn.query_row(&sql, params.as_slice(), |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    /// Batch-attach uploaded media to a freshly created tweet.
    pub fn associate_media(&self, tweet_id: i64, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.with_conn(|conn| {
            let placeholders: Vec<String> = (2..=ids.len() + 1).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "UPDATE media SET tweet_id = ?1 WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&tweet_id];
            params.extend(ids.iter().map(|id| id as &dyn rusqlite::types::ToSql));
            conn.execute(&sql, params.as_slice())?;
            Ok(())
        })
    }

    pub fn media_paths_for_tweet(&self, tweet_id: i64) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT path FROM media WHERE tweet_id = ?1 ORDER BY id")?;
            let rows = stmt
                .query_map(rusqlite::params![tweet_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Paths of every attachment on any of the author's tweets. Collected
    /// before a user delete so the physical files can be cleaned up once
    /// the rows have cascaded away.
    pub fn media_paths_for_author(&self, author_id: i64) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.path FROM media m JOIN tweets t ON t.id = m.tweet_id
                 WHERE t.author_id = ?1 ORDER BY m.id",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![author_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn remove_media_for_tweet(&self, tweet_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM media WHERE tweet_id = ?1",
                rusqlite::params![tweet_id],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unattached_then_associated() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("alice", "hash", true).unwrap();
        let m1 = db.create_media("uploads/a.png").unwrap();
        let m2 = db.create_media("uploads/b.jpg").unwrap();

        assert_eq!(db.count_unattached(&[m1, m2]).unwrap(), 2);
        assert_eq!(db.count_unattached(&[m1, 999]).unwrap(), 1);

        let tweet = db.create_tweet(user, "with pics").unwrap();
        db.associate_media(tweet, &[m1, m2]).unwrap();

        assert_eq!(db.count_unattached(&[m1, m2]).unwrap(), 0);
        assert_eq!(
            db.media_paths_for_tweet(tweet).unwrap(),
            vec!["uploads/a.png".to_string(), "uploads/b.jpg".to_string()]
        );
    }

    #[test]
    fn test_remove_media_for_tweet() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("alice", "hash", true).unwrap();
        let m = db.create_media("uploads/a.png").unwrap();
        let tweet = db.create_tweet(user, "pic").unwrap();
        db.associate_media(tweet, &[m]).unwrap();

        db.remove_media_for_tweet(tweet).unwrap();
        assert!(db.get_media(m).unwrap().is_none());
        assert!(db.media_paths_for_tweet(tweet).unwrap().is_empty());
    }
}
