//! Output schemas - the structured shapes the LLM is asked to produce.
//!
//! Each [`OutputSchema`] declares its required fields once. The prompt builder
//! reads the declarations to describe the shape to the model, and the parser
//! reads the same declarations to check what comes back.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Smallest number of tags a valid response may carry
pub const MIN_TAGS: usize = 3;
/// Largest number of tags a valid response may carry
pub const MAX_TAGS: usize = 5;

/// Summary-only output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    /// Concise summary of the text in 2-3 sentences
    pub summary: String,
}

/// Tags-only output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TagSet {
    /// 3-5 short topical tags for the text
    pub tags: Vec<String>,
}

/// A question/answer pair for spaced-repetition study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Flashcard {
    /// The prompt or question
    pub front: String,
    /// The answer or explanation
    pub back: String,
}

/// Summary, tags and flashcards produced from a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CombinedResult {
    /// Concise summary of the text in 2-3 sentences
    pub summary: String,
    /// 3-5 short topical tags for the text
    pub tags: Vec<String>,
    /// Question/answer flashcards covering the key facts of the text
    pub flashcards: Vec<Flashcard>,
}

impl CombinedResult {
    /// Check if the result carries any flashcards
    pub fn has_flashcards(&self) -> bool {
        !self.flashcards.is_empty()
    }
}

/// The shape a single field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON string
    Text,
    /// A JSON string that is not blank
    NonEmptyText,
    /// An array of strings whose length lies within `min..=max`
    TextList { min: usize, max: usize },
    /// An array of objects, each matching [`FLASHCARD_FIELDS`]
    FlashcardList,
}

impl FieldKind {
    /// Short type name used in prompts and diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::NonEmptyText => "string",
            FieldKind::TextList { .. } => "array of strings",
            FieldKind::FlashcardList => "array of objects",
        }
    }
}

/// A required field of an output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

const SUMMARY_FIELD: FieldSpec = FieldSpec {
    name: "summary",
    kind: FieldKind::Text,
    description: "A concise summary of the text in 2-3 sentences",
};

const TAGS_FIELD: FieldSpec = FieldSpec {
    name: "tags",
    kind: FieldKind::TextList {
        min: MIN_TAGS,
        max: MAX_TAGS,
    },
    description: "A list of 3-5 relevant tags for the input text",
};

const FLASHCARDS_FIELD: FieldSpec = FieldSpec {
    name: "flashcards",
    kind: FieldKind::FlashcardList,
    description: "Question/answer flashcards covering the key facts of the text",
};

/// Fields every flashcard object must carry.
pub const FLASHCARD_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "front",
        kind: FieldKind::NonEmptyText,
        description: "The question or prompt shown on the front of the card",
    },
    FieldSpec {
        name: "back",
        kind: FieldKind::NonEmptyText,
        description: "The answer or explanation shown on the back of the card",
    },
];

/// One of the structured outputs the service can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputSchema {
    Summary,
    Tags,
    Combined,
}

impl OutputSchema {
    /// Required fields, in the order they are presented to the model
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            OutputSchema::Summary => &[SUMMARY_FIELD],
            OutputSchema::Tags => &[TAGS_FIELD],
            OutputSchema::Combined => &[SUMMARY_FIELD, TAGS_FIELD, FLASHCARDS_FIELD],
        }
    }

    /// Natural-language description of the task this schema answers
    pub fn task(&self) -> &'static str {
        match self {
            OutputSchema::Summary => "Summarize the following text in 2-3 sentences.",
            OutputSchema::Tags => "Generate a list of 3-5 relevant tags for the following text.",
            OutputSchema::Combined => {
                "Study the following text. Summarize it in 2-3 sentences, generate 3-5 relevant \
                 tags, and write question/answer flashcards covering its key facts."
            }
        }
    }

    /// Stable lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            OutputSchema::Summary => "summary",
            OutputSchema::Tags => "tags",
            OutputSchema::Combined => "combined",
        }
    }

    /// JSON Schema of the typed result for this output
    pub fn json_schema(&self) -> Result<serde_json::Value, serde_json::Error> {
        let schema = match self {
            OutputSchema::Summary => schemars::schema_for!(Summary),
            OutputSchema::Tags => schemars::schema_for!(TagSet),
            OutputSchema::Combined => schemars::schema_for!(CombinedResult),
        };
        serde_json::to_value(schema)
    }
}

impl std::str::FromStr for OutputSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputSchema::Summary),
            "tags" => Ok(OutputSchema::Tags),
            "combined" => Ok(OutputSchema::Combined),
            other => Err(format!("unknown schema: {}", other)),
        }
    }
}

/// A typed result that can be produced from a validated model response.
pub trait StructuredOutput: DeserializeOwned {
    /// The schema the raw response is validated against
    const SCHEMA: OutputSchema;
}

impl StructuredOutput for Summary {
    const SCHEMA: OutputSchema = OutputSchema::Summary;
}

impl StructuredOutput for TagSet {
    const SCHEMA: OutputSchema = OutputSchema::Tags;
}

impl StructuredOutput for CombinedResult {
    const SCHEMA: OutputSchema = OutputSchema::Combined;
}
