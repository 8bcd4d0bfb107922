use sqlx::{Row, SqlitePool};

#[async_trait::async_trait]
pub trait Table {
    type Record<'a>;

    fn get_name(&self) -> &str;
    fn get_pool(&self) -> &SqlitePool;

    /// Column carrying the unique key rows are looked up by.
    fn key_column(&self) -> &str {
        "link"
    }

    async fn create(&self) -> Result<(), sqlx::Error>;

    /// Returns the number of rows written; zero means the key was already present.
    async fn insert<'a>(&self, record: Self::Record<'a>) -> Result<u64, sqlx::Error>;

    async fn is_exist<I: AsRef<str> + Send + Sync>(&self, key: I) -> Result<bool, sqlx::Error> {
        let query = format!(
            "SELECT {key} FROM {table} WHERE {key} = ?",
            key = self.key_column(),
            table = self.get_name()
        );
        Ok(sqlx::query(&query)
            .bind(key.as_ref())
            .fetch_optional(self.get_pool())
            .await?
            .is_some())
    }

    async fn count(&self) -> Result<u32, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", self.get_name());
        Ok(sqlx::query(&query)
            .fetch_one(self.get_pool())
            .await?
            .try_get(0)?)
    }
}
