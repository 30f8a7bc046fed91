//! Prompt templates
//!
//! Each builder fills one fixed instruction template. Summary and history
//! arrive already formatted (`None` when empty).

/// Product table description shown to the SQL generator
pub const PRODUCT_SCHEMA: &str = r#"table: product
fields:
product_link - string (hyperlink to product)
title - string (name of the product)
brand - string (brand of the product)
price - integer (price of the product in Indian Rupees)
discount - float (discount on the product. 10 percent discount is represented as 0.1, 20 percent as 0.2, and such.)
avg_rating - float (average rating of the product. Range 0-5, 5 is the highest.)
total_ratings - integer (total number of ratings for the product)"#;

/// Answer prompt for FAQ lookups
pub fn faq_answer(query: &str, context: &str, summary: &str, history: &str) -> String {
    format!(
        r#"Given the following context and question, answer using this context only.
If the answer is not found in the context, say "I don't know". Do not make up an answer.

Summary of earlier conversation:
{summary}

Recent conversation:
{history}

Question:
{query}

Context:
{context}"#
    )
}

/// Answer prompt for general questions about the assistant and shopping
pub fn general_answer(query: &str, context: &str, summary: &str, history: &str) -> String {
    format!(
        r#"Given the following context, question, summary of earlier chats and recent conversation, answer using these elements only.
If the answer is not found in them, say "I don't know". Do not make up an answer.

Summary of earlier conversation:
{summary}

Recent conversation:
{history}

Question:
{query}

Context:
{context}"#
    )
}

/// System prompt that asks for a single SQL query in `<SQL>` tags
pub fn sql_generation() -> String {
    format!(
        r#"You are an expert in understanding the database schema and writing SQL queries for a natural language question about the data.
The schema is provided in the schema tags.
<schema>
{PRODUCT_SCHEMA}
</schema>
Brand names can be in any case, so compare with LOWER(brand) and use LIKE '%...%' to match the brand. Never use ILIKE.
Write a single SQL query for the question provided.
The query must select every field (SELECT *).

Only the SQL query is needed, nothing more. Always put the SQL between <SQL></SQL> tags."#
    )
}

/// System prompt that turns query rows into a product list
pub fn sql_answer(summary: &str, history: &str) -> String {
    format!(
        r#"You answer shopping questions from the data returned for them.
You will be given Question: and Data:. Data is a list of product records.
Answer only from Data. Do not write phrases like 'Based on the data' or any other technical words.
Just a plain, simple natural language response.
If Data is None, say that no matching products were found.

Summary of earlier conversation:
{summary}

Recent conversation:
{history}

When listing products, always use this format, one product per line, as a numbered list:
Product title: Rs. price (discount percent off), Rating: rating <product link>
For example:
1. Campus Women Running Shoes: Rs. 1104 (35 percent off), Rating: 4.4 <link>
2. Campus Women Running Shoes: Rs. 1104 (35 percent off), Rating: 4.4 <link>"#
    )
}

/// User message pairing the question with its rows
pub fn sql_answer_input(question: &str, data: &str) -> String {
    format!("Question: {question}\nData: {data}")
}

/// System prompt for the fallback agent
pub fn fallback_system(summary: &str, history: &str) -> String {
    format!(
        r#"You are a polite e-commerce assistant.

Your role:
- Handle unclear or unsupported requests
- Ask for clarification when needed
- Gently redirect to shopping-related help
- Never invent facts
- Keep responses short and friendly

Conversation summary:
{summary}

Recent conversation:
{history}"#
    )
}

/// Summarization prompt over a formatted transcript
pub fn summary(conversation: &str) -> String {
    format!(
        r#"Summarize the following conversation.
Keep only key facts and user intent.

Conversation:
{conversation}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faq_prompt_contains_all_parts() {
        let prompt = faq_answer("can I pay cash?", "COD is available", "None", "None");
        assert!(prompt.contains("can I pay cash?"));
        assert!(prompt.contains("COD is available"));
        assert!(prompt.contains("I don't know"));
    }

    #[test]
    fn test_sql_generation_mentions_tags_and_schema() {
        let prompt = sql_generation();
        assert!(prompt.contains("<SQL></SQL>"));
        assert!(prompt.contains("avg_rating"));
    }
}
