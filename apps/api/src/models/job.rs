use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A job listing as stored in the `jobs` table. Read-only from this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub company: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub job_type: Option<String>,
    pub salary_range: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_arrays_default_to_empty() {
        let job: JobRecord = serde_json::from_str(
            r#"{
                "id": "a",
                "title": "Backend Engineer",
                "company": "Acme",
                "description": null,
                "location": "Remote",
                "type": "full-time",
                "salary_range": null,
                "posted_at": null
            }"#,
        )
        .unwrap();
        assert!(job.requirements.is_empty());
        assert!(job.required_skills.is_empty());
        assert_eq!(job.job_type.as_deref(), Some("full-time"));
    }

    #[test]
    fn test_job_type_serializes_as_type() {
        let job = JobRecord {
            id: "a".into(),
            title: "Designer".into(),
            company: "Acme".into(),
            description: None,
            location: None,
            job_type: Some("contract".into()),
            salary_range: None,
            posted_at: None,
            requirements: vec![],
            required_skills: vec![],
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "contract");
        assert!(value.get("job_type").is_none());
    }
}
