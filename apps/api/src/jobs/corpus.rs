//! Job corpus access: the read-only query surface over the `jobs` table.
//!
//! Default: `PgJobCorpus` (sqlx / PostgreSQL).
//! `AppState` holds an `Arc<dyn JobCorpus>` so the pipeline never touches SQL directly.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::models::job::JobRecord;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("job query failed: {0}")]
    Query(#[from] sqlx::Error),
}

#[async_trait]
pub trait JobCorpus: Send + Sync {
    /// Every job, in corpus order (newest first).
    async fn list_all(&self) -> Result<Vec<JobRecord>, CorpusError>;

    /// Jobs whose id is in `ids`, in corpus order. Unknown ids are skipped.
    async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<JobRecord>, CorpusError>;

    /// Jobs whose title contains any of `title_terms` (case-insensitive) OR whose
    /// required skills overlap `skill_terms` (case-insensitive), in corpus order.
    async fn search(
        &self,
        title_terms: &[String],
        skill_terms: &[String],
    ) -> Result<Vec<JobRecord>, CorpusError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL backend
// ────────────────────────────────────────────────────────────────────────────

const JOB_COLUMNS: &str = r#"
    id::text AS id,
    title,
    company,
    description,
    location,
    type,
    salary_range,
    posted_at,
    COALESCE(requirements, '{}') AS requirements,
    COALESCE(required_skills, '{}') AS required_skills
"#;

const CORPUS_ORDER: &str = "ORDER BY posted_at DESC NULLS LAST, id";

pub struct PgJobCorpus {
    pool: PgPool,
}

impl PgJobCorpus {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobCorpus for PgJobCorpus {
    async fn list_all(&self) -> Result<Vec<JobRecord>, CorpusError> {
        let jobs = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs {CORPUS_ORDER}"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<JobRecord>, CorpusError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let jobs = sqlx::query_as::<_, JobRecord>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id::text = ANY($1) {CORPUS_ORDER}"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn search(
        &self,
        title_terms: &[String],
        skill_terms: &[String],
    ) -> Result<Vec<JobRecord>, CorpusError> {
        let title_patterns: Vec<String> = title_terms
            .iter()
            .map(|t| format!("%{}%", escape_like(t.trim())))
            .collect();
        let skills_lower: Vec<String> = skill_terms.iter().map(|s| s.trim().to_lowercase()).collect();

        if title_patterns.is_empty() && skills_lower.is_empty() {
            return Ok(vec![]);
        }

        let jobs = sqlx::query_as::<_, JobRecord>(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE title ILIKE ANY($1)
               OR EXISTS (
                   SELECT 1 FROM unnest(COALESCE(required_skills, '{{}}')) AS skill
                   WHERE lower(skill) = ANY($2)
               )
            {CORPUS_ORDER}
            "#
        ))
        .bind(&title_patterns)
        .bind(&skills_lower)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }
}

/// Escapes LIKE wildcards so model-suggested titles match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend (tests)
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Vec-backed corpus with the same matching rules as the SQL queries.
    #[derive(Default)]
    pub struct InMemoryJobCorpus {
        pub jobs: Vec<JobRecord>,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl InMemoryJobCorpus {
        pub fn new(jobs: Vec<JobRecord>) -> Self {
            Self {
                jobs,
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn check(&self) -> Result<(), CorpusError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CorpusError::Query(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl JobCorpus for InMemoryJobCorpus {
        async fn list_all(&self) -> Result<Vec<JobRecord>, CorpusError> {
            self.check()?;
            Ok(self.jobs.clone())
        }

        async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<JobRecord>, CorpusError> {
            self.check()?;
            Ok(self
                .jobs
                .iter()
                .filter(|j| ids.contains(&j.id))
                .cloned()
                .collect())
        }

        async fn search(
            &self,
            title_terms: &[String],
            skill_terms: &[String],
        ) -> Result<Vec<JobRecord>, CorpusError> {
            self.check()?;
            let titles: Vec<String> = title_terms.iter().map(|t| t.trim().to_lowercase()).collect();
            let skills: Vec<String> = skill_terms.iter().map(|s| s.trim().to_lowercase()).collect();
            Ok(self
                .jobs
                .iter()
                .filter(|j| {
                    let title = j.title.to_lowercase();
                    titles.iter().any(|t| title.contains(t.as_str()))
                        || j
                            .required_skills
                            .iter()
                            .any(|s| skills.contains(&s.to_lowercase()))
                })
                .cloned()
                .collect())
        }
    }

    pub fn job(id: &str, title: &str, skills: &[&str]) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            description: Some(format!("{title} at Acme")),
            location: Some("Remote".to_string()),
            job_type: Some("full-time".to_string()),
            salary_range: None,
            posted_at: None,
            requirements: vec![],
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{job, InMemoryJobCorpus};
    use super::*;

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("C++ 100%"), "C++ 100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn test_in_memory_search_matches_title_or_skill() {
        let corpus = InMemoryJobCorpus::new(vec![
            job("1", "Senior React Developer", &["JavaScript"]),
            job("2", "Sales Manager", &["Negotiation"]),
            job("3", "Data Engineer", &["python"]),
        ]);
        let found = corpus
            .search(&["react developer".into()], &["Python".into()])
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_in_memory_list_by_ids_skips_unknown() {
        let corpus = InMemoryJobCorpus::new(vec![job("a", "A", &[]), job("b", "B", &[])]);
        let found = corpus
            .list_by_ids(&["b".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");
    }
}
