/// The only table the model is told about.
pub const TABLE_NAME: &str = "restaurants";

pub const TABLE_COLUMNS: [&str; 9] = [
    "id",
    "name",
    "special_dish",
    "rating",
    "location",
    "cuisine",
    "contact_number",
    "opening_hours",
    "created_at",
];

/// Fixed instruction template with the question interpolated as-is.
pub fn prepare_prompt(question: &str) -> String {
    format!(
        r#"
Convert the following natural language query to a MySQL query.
The query should be for a {} table with columns:
{}

Natural language query: {}

Return only the SQL query without any explanation or formatting.
"#,
        TABLE_NAME,
        TABLE_COLUMNS.join(", "),
        question
    )
}
