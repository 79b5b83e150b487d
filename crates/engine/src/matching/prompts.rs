// All LLM prompt constants for the matching module.

/// System prompt for match analysis — enforces strict, JSON-only grading.
pub const MATCH_SYSTEM: &str = "You are an experienced recruiter and job coach. \
    Understand the requirements and give targeted insights and guidance. \
    Verify matches strictly to avoid hallucinations. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object.";

/// Match analysis prompt template.
/// Replace `{job_text}` and `{resume_text}` before sending.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"You are analyzing a potential mismatch. Be skeptical.

JOB DESCRIPTION (THE GROUND TRUTH):
{job_text}

RESUME (THE CANDIDATE):
{resume_text}

Task:
Return a JSON object with this exact structure:
{
  "score": <number 0-100>,
  "summary": "<1 sentence explanation>",
  "matched_skills": ["skill1", "skill2", ...],
  "missing_skills": ["skill1", "skill2", ...],
  "tips": ["tip1", "tip2", "tip3"]
}

Rules for missing_skills:
- Identify hard skills explicitly required in the Job Description that are NOT in the Resume.
- DEEP SEMANTIC CHECK: Do not perform a simple keyword search. Understand the concept.
  - If the JD asks for "CI/CD" and the Resume has "Jenkins pipelines", that IS a match. Do NOT list it as missing.
  - If the JD asks for "Leadership" and the Resume shows "Managed a team of 5", that IS a match.
- List only skills where the candidate truly lacks the core competency.
- Rank by importance (deal-breakers first). Max 5."#;

/// System prompt for profile extraction — content-preserving, JSON-only.
pub const PROFILE_EXTRACT_SYSTEM: &str = "You are a resume parsing assistant. \
    Extract data into structured JSON. Do not summarize. Maintain original content. \
    You MUST respond with valid JSON only.";

/// Profile extraction prompt template. Replace `{resume_text}` before sending.
pub const PROFILE_EXTRACT_TEMPLATE: &str = r#"Extract the following from this resume text into valid JSON format:
1. "personal_info" (object with "name", "email", "phone", "linkedin", "portfolio", "location")
2. "summary" (concise 2-3 sentence overview)
3. "skills" (array of strings)
4. "experience" (array of objects with "title", "company", "dates", "description")
    - "description": keep bullet points, details, and metrics.
    - "dates": start - end.
5. "education" (array of objects with "school", "degree", "dates")
6. "projects" (array of objects with "name", "technologies", "description")
    - Extract significant projects listed.
    - "technologies": comma-separated string of used tech.
    - "description": brief summary of what was built/accomplished.
7. "certifications" (array of objects with "name", "issuer", "date")

RESUME TEXT:
{resume_text}

JSON Output only. No markdown."#;
