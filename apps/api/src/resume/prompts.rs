// All LLM prompt constants for the resume builder.

use crate::llm_client::prompts::FENCED_JSON_INSTRUCTION;

/// System prompt opening every build conversation.
pub const BUILDER_SYSTEM: &str = r#"You are an expert resume builder agent designed to create tailored, professional resumes. Your task is to analyze job descriptions, match them with user profiles, and generate optimized resumes that follow specific templates.

GUIDELINES:
1. Carefully analyze the job description to identify key requirements, skills, and qualifications.
2. Review the user's profile to understand their experience, skills, education, and achievements.
3. Tailor the resume to highlight experiences and skills most relevant to the job description.
4. Use strong action verbs and quantify achievements whenever possible.
5. Follow the exact structure of the provided template.
6. Format the final output as valid JSON that matches the template structure.
7. Be concise, professional, and honest. Do not invent information not present in the user's profile."#;

/// Replace: {job_description}
pub const ANALYZE_JOB_PROMPT: &str = r#"STEP 1: Analyze the job description below and identify the key requirements, skills, and qualifications.

JOB DESCRIPTION:
{job_description}

Please provide a detailed analysis of what the employer is looking for in an ideal candidate."#;

/// Replace: {user_profile}
pub const REVIEW_PROFILE_PROMPT: &str = r#"STEP 2: Based on your analysis of the job requirements, review my profile below and identify the most relevant experiences, skills, and achievements that match them.

MY PROFILE:
{user_profile}

Please list the key elements from my profile that should be highlighted in the resume."#;

/// Replace: {template}, {format}
pub const GENERATE_RESUME_PROMPT: &str = r#"STEP 3: Now create my resume in JSON format following the exact structure of the template below.

TEMPLATE STRUCTURE:
{template}

Based on your analysis of the job requirements and my profile, create a tailored resume.

IMPORTANT:
1. The output must be valid JSON that matches the EXACT structure of the template.
2. All fields in the template must be present in your output.
3. Do not repeat a section or add sections the template does not have.
4. Focus on the experiences and skills most relevant to the job description.
5. {format}"#;

/// Replace: {error}, {template}, {format}
pub const REPAIR_PROMPT: &str = r#"ERROR: {error}

Please try again to create a valid JSON resume that exactly matches the template structure below:

{template}

{format}"#;

/// Replace: {resume}
pub const EDITOR_SYSTEM: &str = r#"You are an expert resume editor. You have a current resume in JSON format and need to update it based on the user's instructions.

Current resume:
{resume}

Make precise updates based on the user's instructions while keeping the same JSON structure. Return only the updated JSON with no additional text or explanations."#;

/// Replace: {instruction}
pub const EDIT_INSTRUCTION_PROMPT: &str =
    "Please update this resume according to the following instruction: {instruction}";

pub const GENERATION_PARSE_ERROR: &str = "Failed to extract valid JSON from the response.";
pub const REPAIR_PARSE_ERROR: &str =
    "Still unable to extract valid JSON. Please check the template format.";
pub const NO_RESUME_ERROR: &str = "No resume to update. Please generate a resume first.";

pub fn generate_resume_prompt(template: &str) -> String {
    GENERATE_RESUME_PROMPT
        .replace("{template}", template)
        .replace("{format}", FENCED_JSON_INSTRUCTION)
}

pub fn repair_prompt(error: &str, template: &str) -> String {
    REPAIR_PROMPT
        .replace("{error}", error)
        .replace("{template}", template)
        .replace("{format}", FENCED_JSON_INSTRUCTION)
}
