// LLM prompt constants for the extraction module.
// Field-level instructions travel inside the JSON schema descriptions.

/// System prompt for job-detail extraction.
pub const JOB_DETAILS_SYSTEM: &str = "You are an expert HR analyst. \
    Extract the required job details from a job description. \
    You MUST respond with valid JSON only, matching the provided schema exactly.";

/// Job-detail extraction prompt. Replace `{description}` before sending.
pub const JOB_DETAILS_PROMPT_TEMPLATE: &str = "Your task is to extract the required job details \
from the following job description:\n\n{description}";

pub const TECHNICAL_SKILLS_DESCRIPTION: &str = "A list of specific, granular TECHNICAL skills \
explicitly mentioned in the job description: programming languages (e.g. Python, SQL), cloud \
platforms (e.g. AWS, Azure), software tools (e.g. Tableau, Docker). Extract only the keyword \
(\"experience with Amazon Web Services\" -> \"AWS\"). Return [] when none are mentioned.";

pub const SOFT_SKILLS_DESCRIPTION: &str = "A list of key SOFT SKILLS explicitly mentioned in the \
job description, as general concepts (\"Effective communication skills\" -> \"Communication\"). \
Return [] when none are mentioned.";

pub const DOMAIN_SKILLS_DESCRIPTION: &str = "A list of DOMAIN-SPECIFIC business or professional \
skills explicitly mentioned in the job description that are not programming or IT skills. Each \
entry must be a single short concept, never a sentence. Return [] when none are mentioned.";

pub const EXPERIENCE_DESCRIPTION: &str = "Required years of professional experience as a single \
integer. \"at least 5 years\" -> 5, \"5-7 years\" -> 5 (lower bound), \"three years\" -> 3, \
\"4.5 years\" -> 5 (round to nearest). If no experience is mentioned, return -1.";

pub const EDUCATION_DESCRIPTION: &str = "Highest level of education required, standardized to one \
of the allowed values. \"B.S. in Computer Science\" -> \"Bachelor's\"; \"Master's preferred, \
Bachelor's required\" -> \"Master's\". If no education level is mentioned, return \"Unspecified\".";

/// Location refinement prompt. Replace `{description}` before sending.
pub const LOCATION_PROMPT_TEMPLATE: &str = "Extract the city and state from the following job \
description. If no location is mentioned, return 'unknown' for the missing field. \
Description: {description}";

pub const CITY_DESCRIPTION: &str = "City of the job posting. If the job is remote, the city where \
the company is based. 'unknown' when not stated.";

pub const STATE_DESCRIPTION: &str = "The 2-letter US state abbreviation of the job posting, e.g. CA, \
NY. If the job is remote, the state where the company is based. 'unknown' when not stated.";
