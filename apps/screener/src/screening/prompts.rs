// Prompt constants and the prompt builder for resume screening.

use chrono::NaiveDateTime;

/// System prompt sent with every screening call.
pub const SCREENING_SYSTEM: &str = "You are a precise AI Recruiter. Output JSON only.";

/// Builds the screening prompt. Pure: the same inputs always give the same prompt.
///
/// `now` anchors ongoing roles ("Present") to a concrete month and year. Neither
/// payload is truncated.
pub fn build_prompt(resume_text: &str, jd_text: &str, now: NaiveDateTime) -> String {
    let current_month = now.format("%B %Y");

    format!(
        r#"You are a Senior Technical Recruiter and Hiring Manager with 20 years of experience in talent acquisition.
Your task is to evaluate a resume against a specific job description with high precision.

### EXPERIENCE CALCULATION
Today's date is {current_month}. Compute total relevant experience as follows:
1. Find the start date of the earliest relevant role.
2. Find the end date of the most recent role. If a role ends in "Present", "Current", "Now" or "Till date", use {current_month} as its end date.
3. Report the span in fractional years rounded to one decimal, e.g. "5.5 years (Calculated from 2019-2024)".
Do not double count overlapping roles.

### SCORING CRITERIA
You must assign a 'match_percentage' (0-100) based on this strict rubric:
- **0-59 (Rejected):** Lacks critical skills, experience significantly below requirements, or irrelevant background.
- **60-84 (Maybe):** Has most core skills but lacks "nice-to-haves", slightly junior, or transferable skills present but not direct match.
- **85-100 (Recommended):** Strong match for core and secondary skills, relevant experience years aligned, cultural fit indicators present.
The 'final_recommendation' MUST agree with the score range: Rejected (<60), Maybe (60-84), Recommended (>=85).

### ANALYSIS INSTRUCTIONS
1. **Identity:** Extract the candidate's name. Use "Unknown" if it cannot be found.
2. **Experience & Education:** Identify years of relevant experience (see EXPERIENCE CALCULATION) and the highest education level.
3. **Hard Skills:** Compare the tech stack and hard skills in the JD against the resume.
4. **Contextual Match:** Do not just keyword match. If the JD asks for "Cloud" and the resume says "AWS", that is a match.
5. **Gaps:** Be specific about what is missing (e.g. "Missing Docker experience" is better than "Missing tools").

### OUTPUT FORMAT
Return the result as a valid JSON object ONLY. Do not use Markdown formatting.

{{
  "applicant_name": "Full Name or 'Unknown'",
  "years_experience": "e.g. 5.5 years (Calculated from 2019-2024)",
  "education_level": "e.g. B.Tech Computer Science",
  "match_percentage": 75,
  "final_recommendation": "Maybe",
  "strengths": [
    "Specific technical strength 1",
    "Specific technical strength 2",
    "Soft skill strength"
  ],
  "missing_skills": [
    "Specific missing skill 1",
    "Specific missing skill 2"
  ],
  "skills_gap": "A detailed 2-3 sentence explanation of the gap between the candidate's profile and the JD requirements.",
  "summary": "A professional executive summary (3-4 sentences) justifying the score and recommendation. Mention key fit and major red flags if any."
}}

### DATA
**Job Description:**
{jd_text}

**Resume Text:**
{resume_text}
"#
    )
}
