//! # Default Prompt Templates
//!
//! Prompts used by the [`SqlTrainer`](crate::SqlTrainer).
//!
//! Placeholders are written as `{name}` and substituted with `str::replace`.

/// System prompt for turning a question into SQL.
///
/// Placeholders: `{dialect}`, `{context}`
pub const SQL_GENERATION_SYSTEM_PROMPT: &str = "You are a {dialect} expert. Write one {dialect} query that answers the user's question, using only the tables and knowledge given below.

{context}# Response Rules
1. If the context is enough, reply with a single valid {dialect} query and nothing else.
2. If the context is not enough, explain briefly what is missing instead of guessing table or column names.
3. Prefer the tables most relevant to the question.
4. If the same question appears in the examples, reuse its SQL exactly.";

/// User prompt for SQL generation.
///
/// Placeholders: `{examples}`, `{question}`
pub const SQL_GENERATION_USER_PROMPT: &str = "{examples}# Question
{question}";

/// System prompt for guessing the business question a query answers.
pub const QUESTION_GENERATION_SYSTEM_PROMPT: &str = "You are given a SQL query. Reply with the business question the query answers, phrased the way an analyst would ask it. Reply with the question only. Do not mention table names.";

/// Renders the context block of the SQL generation system prompt.
pub fn build_context(ddls: &[String], documentation: &[String]) -> String {
    let mut context = String::new();
    if !ddls.is_empty() {
        context.push_str("# Tables\n");
        for ddl in ddls {
            context.push_str(ddl);
            context.push_str("\n\n");
        }
    }
    if !documentation.is_empty() {
        context.push_str("# Additional Knowledge\n");
        for doc in documentation {
            context.push_str("- ");
            context.push_str(doc);
            context.push('\n');
        }
        context.push('\n');
    }
    context
}

/// Renders previously answered questions as few-shot examples.
pub fn build_examples(examples: &[(String, String)]) -> String {
    if examples.is_empty() {
        return String::new();
    }
    let mut out = String::from("# Examples\n");
    for (question, sql) in examples {
        out.push_str(&format!("Question: {question}\nSQL:\n{sql}\n\n"));
    }
    out
}
