// Resume analysis prompts, one system instruction per analysis mode.
// The job summary (if any) is appended after the instruction; the user message is the resume.

/// Role line shared by all analysis prompts.
pub const ANALYST_ROLE: &str = "You are an expert technical recruiter analyzing a candidate's resume.";

pub const PROFILE_INSTRUCTION: &str = r#"Analyze the resume and return a JSON object with this EXACT schema:
{
  "titles": ["up to 5 job titles the candidate is a strong fit for"],
  "skills": ["up to 10 key skills, as short canonical names"],
  "experience": "one-line summary of total years and seniority"
}"#;

pub const SCORED_INSTRUCTION: &str = r#"Analyze the resume against the AVAILABLE JOBS and return a JSON object with this EXACT schema:
{
  "titles": ["up to 5 job titles the candidate is a strong fit for"],
  "skills": ["up to 15 key skills, as short canonical names"],
  "experience": "one-line summary of total years and seniority",
  "relevance": 0,
  "bestMatches": [
    {"jobId": "id taken from a [job:ID] token", "matchScore": 0, "matchingSkills": ["skill"]}
  ]
}
relevance and matchScore are integers from 0 to 100. Only use job ids that appear in AVAILABLE JOBS."#;

pub const MATCHED_IDS_INSTRUCTION: &str = r#"Select the AVAILABLE JOBS that fit the resume and return a JSON object with this EXACT schema:
{
  "matchedJobIds": ["id taken from a [job:ID] token"]
}
Order ids from best to worst fit. Only use job ids that appear in AVAILABLE JOBS."#;

/// Heading placed before the condensed job corpus.
pub const AVAILABLE_JOBS_HEADING: &str = "AVAILABLE JOBS:";
