use super::ClassifiedAd;
use crate::{utils, CrawlerError, Store, Table};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::path::Path;

pub struct AdTable {
    name: String,
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl Table for AdTable {
    type Record<'a> = &'a ClassifiedAd;

    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create(&self) -> Result<(), sqlx::Error> {
        if !utils::is_table_exists(self.get_pool(), &self.name).await? {
            let query = format!(
                r#"
                        CREATE TABLE {} (
                            id INTEGER PRIMARY KEY AUTOINCREMENT,
                            link TEXT NOT NULL UNIQUE,
                            title TEXT NOT NULL,
                            price TEXT NOT NULL,
                            description TEXT NOT NULL,
                            region TEXT,
                            sub_region TEXT,
                            posted_at DATETIME,
                            updated_at DATETIME,
                            scraped_at DATETIME NOT NULL
                        )
                    "#,
                &self.name
            );
            sqlx::query(query.as_str()).execute(self.get_pool()).await?;
        }
        Ok(())
    }

    async fn insert<'a>(&self, record: Self::Record<'a>) -> Result<u64, sqlx::Error> {
        let mut tx = self.get_pool().begin().await?;
        let query = format!(
            r#"INSERT OR IGNORE INTO {} (
                link,
                title,
                price,
                description,
                region,
                sub_region,
                posted_at,
                updated_at,
                scraped_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            self.name
        );
        let inserted = sqlx::query(&query)
            .bind(record.link.trim())
            .bind(&record.title)
            .bind(&record.price)
            .bind(&record.description)
            .bind(&record.region)
            .bind(&record.sub_region)
            .bind(record.posted_at)
            .bind(record.updated_at)
            .bind(utils::get_now())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(inserted)
    }
}

pub struct CagunsData {
    pub name: String,
    pub ads: AdTable,
    pool: SqlitePool,
}

impl CagunsData {
    pub async fn new<P: AsRef<Path>>(database: P) -> Result<CagunsData, CrawlerError> {
        let opt = SqliteConnectOptions::new()
            .filename(database)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        let name = "caguns".to_string();
        let p = CagunsData {
            ads: AdTable {
                name: format!("{}_ads", name),
                pool: pool.clone(),
            },
            name,
            pool,
        };

        if !utils::is_table_exists(&p.pool, &p.ads.name).await? {
            tracing::debug!("Create table {}", p.ads.name);
            p.ads.create().await?;
        } else {
            tracing::debug!("Use table {}", p.ads.name);
        }

        Ok(p)
    }

    pub async fn count(&self) -> Result<u32, CrawlerError> {
        Ok(self.ads.count().await?)
    }

    /// Stored links in insertion order.
    pub async fn links(&self) -> Result<Vec<String>, CrawlerError> {
        let mut links: Vec<String> = vec![];
        let query = format!("SELECT link FROM {} ORDER BY id", self.ads.get_name());
        for row in sqlx::query(&query).fetch_all(&self.pool).await? {
            links.push(row.try_get("link")?);
        }
        Ok(links)
    }
}

#[async_trait::async_trait]
impl Store for CagunsData {
    type Record = ClassifiedAd;

    async fn exists(&self, link: &str) -> Result<bool, CrawlerError> {
        Ok(self.ads.is_exist(link).await?)
    }

    async fn insert(&self, record: &ClassifiedAd) -> Result<(), CrawlerError> {
        match self.ads.insert(record).await? {
            0 => Err(CrawlerError::StoreConflict {
                link: record.link.clone(),
            }),
            _ => Ok(()),
        }
    }
}
