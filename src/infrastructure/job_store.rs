//! SQLite storage for canonical job records
//!
//! One table, `cleaned_jobs_data`, in canonical column order with `job_id`
//! as primary key. Re-inserting a known identifier is skipped, so loading
//! the same dataset twice is harmless.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::domain::job::CanonicalRecord;
use crate::infrastructure::config::non_empty_parent;

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS cleaned_jobs_data (
        title TEXT,
        link TEXT,
        company_name TEXT,
        job_description TEXT,
        skills TEXT,
        location TEXT,
        experience TEXT,
        salary TEXT,
        job_id TEXT PRIMARY KEY,
        job_function TEXT,
        industry TEXT,
        specialization TEXT,
        role TEXT,
        qualification TEXT,
        employment_type TEXT,
        vacancies INTEGER
    )
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO cleaned_jobs_data (
        title, link, company_name, job_description, skills, location,
        experience, salary, job_id, job_function, industry, specialization,
        role, qualification, employment_type, vacancies
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(job_id) DO NOTHING
"#;

#[derive(Clone)]
pub struct JobStore {
    pool: Arc<SqlitePool>,
}

impl JobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url`, creating the database file when missing
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        if let Some(parent) = non_empty_parent(options.get_filename()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {}", database_url))?;

        Ok(Self::new(pool))
    }

    /// In-memory database on a single connection
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        Ok(Self::new(pool))
    }

    pub async fn create_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&*self.pool)
            .await
            .context("Failed to create cleaned_jobs_data")?;
        info!("Table 'cleaned_jobs_data' ready");
        Ok(())
    }

    /// Insert all records in one transaction. Returns rows actually inserted.
    pub async fn insert_records(&self, records: &[CanonicalRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for record in records {
            let result = sqlx::query(INSERT_SQL)
                .bind(&record.title)
                .bind(&record.link)
                .bind(&record.company_name)
                .bind(&record.job_description)
                .bind(&record.skills)
                .bind(&record.location)
                .bind(&record.experience)
                .bind(&record.salary)
                .bind(&record.job_id)
                .bind(&record.job_function)
                .bind(&record.industry)
                .bind(&record.specialization)
                .bind(&record.role)
                .bind(&record.qualification)
                .bind(&record.employment_type)
                .bind(i64::from(record.vacancies))
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert job {}", record.job_id))?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        info!(
            "Inserted {} of {} records into 'cleaned_jobs_data'",
            inserted,
            records.len()
        );
        Ok(inserted)
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM cleaned_jobs_data")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Identifiers in storage order
    pub async fn job_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT job_id FROM cleaned_jobs_data ORDER BY rowid")
            .fetch_all(&*self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("job_id")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(job_id: &str, title: &str) -> CanonicalRecord {
        CanonicalRecord {
            title: Some(title.to_string()),
            link: None,
            company_name: Some("Acme".to_string()),
            job_description: None,
            skills: Some("Rust, SQL".to_string()),
            location: Some("Pune".to_string()),
            experience: Some("2-4 yrs".to_string()),
            salary: "Not Disclosed".to_string(),
            job_id: job_id.to_string(),
            job_function: None,
            industry: None,
            specialization: None,
            role: "Developer".to_string(),
            qualification: "Any Graduate".to_string(),
            employment_type: None,
            vacancies: 2,
        }
    }

    async fn store() -> JobStore {
        let store = JobStore::in_memory().await.unwrap();
        store.create_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = store().await;
        let inserted = store
            .insert_records(&[record("1", "A"), record("2", "B")])
            .await
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.job_ids().await.unwrap(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_duplicate_job_ids_are_skipped() {
        let store = store().await;
        store.insert_records(&[record("1", "First")]).await.unwrap();

        let inserted = store
            .insert_records(&[record("1", "Second"), record("3", "Third")])
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        let title: Option<String> =
            sqlx::query("SELECT title FROM cleaned_jobs_data WHERE job_id = '1'")
                .fetch_one(&*store.pool)
                .await
                .unwrap()
                .get("title");
        assert_eq!(title.as_deref(), Some("First"));
    }

    #[tokio::test]
    async fn test_create_schema_is_repeatable() {
        let store = store().await;
        store.create_schema().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("db").join("jobs.db");
        let url = format!("sqlite://{}", path.display());

        let store = JobStore::connect(&url).await.unwrap();
        store.create_schema().await.unwrap();

        assert!(path.exists());
    }
}
