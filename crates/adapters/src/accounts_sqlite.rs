//! SQLite social account store

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use social_autopilot_domain::{Platform, SocialAccount, SocialAccountStore, StoreError};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// SQLite-backed `social_accounts` table, unique on `(user_id, platform)`
pub struct SqliteSocialAccountStore {
    pool: SqlitePool,
}

type AccountRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

impl SqliteSocialAccountStore {
    /// Open the database, creating it and its schema if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS social_accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                access_token TEXT NOT NULL,
                instagram_account_id TEXT,
                instagram_account_name TEXT,
                page_id TEXT,
                page_access_token TEXT,
                expires_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, platform)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Number of stored accounts across all users
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM social_accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(count.0)
    }
}

fn format_time(at: OffsetDateTime) -> Result<String, StoreError> {
    at.format(&Rfc3339)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_time(text: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(text, &Rfc3339).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn from_row(row: AccountRow) -> Result<SocialAccount, StoreError> {
    let (
        user_id,
        platform,
        access_token,
        instagram_account_id,
        instagram_account_name,
        page_id,
        page_access_token,
        expires_at,
        updated_at,
    ) = row;

    Ok(SocialAccount {
        user_id,
        platform: platform
            .parse()
            .map_err(|e: social_autopilot_domain::UnknownPlatform| {
                StoreError::Serialization(e.to_string())
            })?,
        access_token: SecretString::from(access_token),
        instagram_account_id,
        instagram_account_name,
        page_id,
        page_access_token: page_access_token.map(SecretString::from),
        expires_at: expires_at.as_deref().map(parse_time).transpose()?,
        updated_at: parse_time(&updated_at)?,
    })
}

const SELECT_COLUMNS: &str = "SELECT user_id, platform, access_token, instagram_account_id, \
     instagram_account_name, page_id, page_access_token, expires_at, updated_at \
     FROM social_accounts";

#[async_trait]
impl SocialAccountStore for SqliteSocialAccountStore {
    async fn upsert(&self, account: &SocialAccount) -> Result<(), StoreError> {
        let updated_at = format_time(account.updated_at)?;
        let expires_at = account.expires_at.map(format_time).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO social_accounts
            (user_id, platform, access_token, instagram_account_id, instagram_account_name,
             page_id, page_access_token, expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, platform) DO UPDATE SET
                access_token = excluded.access_token,
                instagram_account_id = excluded.instagram_account_id,
                instagram_account_name = excluded.instagram_account_name,
                page_id = excluded.page_id,
                page_access_token = excluded.page_access_token,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&account.user_id)
        .bind(account.platform.as_str())
        .bind(account.access_token.expose_secret())
        .bind(&account.instagram_account_id)
        .bind(&account.instagram_account_name)
        .bind(&account.page_id)
        .bind(
            account
                .page_access_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
        )
        .bind(&expires_at)
        .bind(&updated_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<SocialAccount>, StoreError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE user_id = ? AND platform = ?", SELECT_COLUMNS))
                .bind(user_id)
                .bind(platform.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(from_row).transpose()
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SocialAccount>, StoreError> {
        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = ? ORDER BY platform",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(from_row).collect()
    }

    async fn delete(&self, user_id: &str, platform: Platform) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM social_accounts WHERE user_id = ? AND platform = ?")
            .bind(user_id)
            .bind(platform.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn account(token: &str) -> SocialAccount {
        SocialAccount {
            user_id: "u42".to_string(),
            platform: Platform::Instagram,
            access_token: SecretString::from(token.to_string()),
            instagram_account_id: Some("17841".to_string()),
            instagram_account_name: Some("beanthere".to_string()),
            page_id: Some("page-1".to_string()),
            page_access_token: Some(SecretString::from("page-token".to_string())),
            expires_at: Some(datetime!(2024-08-01 00:00:00 UTC)),
            updated_at: datetime!(2024-06-01 09:00:00 UTC),
        }
    }

    #[tokio::test]
    async fn test_account_roundtrip() {
        let store = SqliteSocialAccountStore::in_memory().await.unwrap();
        store.upsert(&account("tok-1")).await.unwrap();

        let stored = store
            .get("u42", Platform::Instagram)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.access_token.expose_secret(), "tok-1");
        assert_eq!(stored.instagram_account_name.as_deref(), Some("beanthere"));
        assert_eq!(
            stored.page_access_token.unwrap().expose_secret(),
            "page-token"
        );
        assert_eq!(stored.expires_at, Some(datetime!(2024-08-01 00:00:00 UTC)));
        assert!(store.get("u42", Platform::Tiktok).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_user_and_platform() {
        let store = SqliteSocialAccountStore::in_memory().await.unwrap();
        store.upsert(&account("tok-1")).await.unwrap();
        store.upsert(&account("tok-2")).await.unwrap();

        let mut other = account("tok-3");
        other.platform = Platform::Facebook;
        store.upsert(&other).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let rows = store.list_for_user("u42").await.unwrap();
        assert_eq!(rows.len(), 2);
        let instagram = rows
            .iter()
            .find(|r| r.platform == Platform::Instagram)
            .unwrap();
        assert_eq!(instagram.access_token.expose_secret(), "tok-2");
    }

    #[tokio::test]
    async fn test_delete_reports_whether_row_existed() {
        let store = SqliteSocialAccountStore::in_memory().await.unwrap();
        store.upsert(&account("tok")).await.unwrap();
        assert!(store.delete("u42", Platform::Instagram).await.unwrap());
        assert!(!store.delete("u42", Platform::Instagram).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("accounts.db");
        {
            let store = SqliteSocialAccountStore::new(&path).await.unwrap();
            store.upsert(&account("persisted")).await.unwrap();
        }
        let reopened = SqliteSocialAccountStore::new(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }
}
