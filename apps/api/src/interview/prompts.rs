// All LLM prompt constants for the interview module.

/// System prompt for question generation.
pub const QUESTION_SYSTEM: &str = "You are an experienced technical interviewer. \
    You write clear, specific interview questions grounded in a candidate's resume. \
    Respond with the questions only: no numbering, no headings, no commentary.";

/// Question generation prompt template.
/// Replace: {resume}, {tech_stack}, {difficulty}, {question_count}, {separator}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate {question_count} technical interview questions for the candidate below.

TECH STACK TO FOCUS ON:
{tech_stack}

DIFFICULTY: {difficulty} on a scale of 1 (introductory) to 5 (expert).

RULES:
1. Tie each question to the tech stack and, where possible, to a project or role in the resume.
2. Each question must be answerable in a few sentences of free text.
3. Do not repeat questions or ask two questions in one.
4. Separate each question with '{separator}'. Don't include any newlines in the questions.

CANDIDATE RESUME:
{resume}"#;

/// System prompt for answer grading.
pub const EVALUATION_SYSTEM: &str = "You are a strict but fair technical interviewer grading \
    a candidate's free-text answers. Judge technical accuracy and completeness only. \
    Never reward confident-sounding answers that are wrong.";

/// Answer grading prompt template.
/// Replace: {qa_pairs}, {answer_count}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Grade each of the {answer_count} candidate responses below.

{qa_pairs}
For each response, provide EXACTLY ONE classification from: 'Incorrect', 'Partially correct', or 'Completely correct'.
A response that says the candidate does not know, or that does not address the question, is 'Incorrect'.

Reply with one line per response, in this exact format and nothing else:
Answer 1: <classification>
Answer 2: <classification>
..."#;
