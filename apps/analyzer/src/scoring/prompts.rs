// ATS scoring prompt templates.

pub const ATS_SYSTEM: &str = "\
You are an expert Applicant Tracking System (ATS) evaluator. \
You assess resumes the way automated screening software and recruiters do: \
keyword coverage, standard section headings, parseable formatting, quantified \
achievements and clarity.";

pub const ATS_PROMPT_TEMPLATE: &str = r#"Evaluate the following resume for ATS compatibility.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "ats_score": integer from 0 to 100,
  "feedback": "2-4 sentences of concrete, actionable feedback"
}

RULES:
1. ats_score is a whole number between 0 and 100 inclusive.
2. feedback names the most important improvements first.
3. Judge only the text above; do not invent experience that is not present."#;
