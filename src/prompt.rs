//! Prompt construction for structured output.

use crate::schema::{FieldKind, FieldSpec, OutputSchema, FLASHCARD_FIELDS};

/// Build the full instruction string for `schema`, embedding `text` verbatim.
pub fn build_prompt(schema: OutputSchema, text: &str) -> String {
    format!(
        r#"{task}

Text:
{text}

You MUST respond with a single JSON object containing exactly these fields:
{fields}

Example format:
{skeleton}

Output only the JSON object. Do not include any markdown formatting, code blocks, or explanations before or after it."#,
        task = schema.task(),
        text = text,
        fields = describe_fields(schema.fields()),
        skeleton = skeleton(schema.fields()),
    )
}

/// One bullet per field: name, type and description
fn describe_fields(fields: &[FieldSpec]) -> String {
    let mut lines = Vec::with_capacity(fields.len());
    for field in fields {
        lines.push(format!(
            "- \"{}\" ({}): {}",
            field.name,
            field.kind.type_name(),
            field.description
        ));
        if field.kind == FieldKind::FlashcardList {
            for card_field in FLASHCARD_FIELDS {
                lines.push(format!(
                    "    - \"{}\" ({}, required): {}",
                    card_field.name,
                    card_field.kind.type_name(),
                    card_field.description
                ));
            }
        }
    }
    lines.join("\n")
}

/// Example JSON object with placeholder values, fields in declaration order
fn skeleton(fields: &[FieldSpec]) -> String {
    let body = fields
        .iter()
        .map(|field| format!("  \"{}\": {}", field.name, placeholder(field)))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{{\n{}\n}}", body)
}

fn placeholder(field: &FieldSpec) -> String {
    match field.kind {
        FieldKind::Text | FieldKind::NonEmptyText => format!("\"<{}>\"", field.name),
        FieldKind::TextList { min, .. } => {
            let items: Vec<String> = (1..=min).map(|i| format!("\"tag{}\"", i)).collect();
            format!("[{}]", items.join(", "))
        }
        FieldKind::FlashcardList => {
            let card = FLASHCARD_FIELDS
                .iter()
                .map(|f| format!("\"{}\": \"<{}>\"", f.name, f.name))
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{{{}}}]", card)
        }
    }
}
