use super::model::Record;
use crate::{err, error::GroundedError};

/// The sentence the model must answer with when the records do not contain the answer.
pub const FALLBACK_ANSWER: &str = "The dataset does not contain this information.";

/// Instruction template sent to the generator on every question.
pub const STARTUP_TEMPLATE: &str = r#"You are a factual startup data assistant.

You must strictly follow these rules:
- Use ONLY the provided startup dataset records.
- Do NOT hallucinate or assume missing values.
- Do NOT generate predictions or business insights unless explicitly present in the records.
- Do NOT compute derived metrics unless they are already present.
- If the answer is not found in the records, respond exactly with:
  "The dataset does not contain this information."

Startup dataset records:
{records}

User question:
{question}
"#;

const RECORDS_SLOT: &str = "records";
const QUESTION_SLOT: &str = "question";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Records,
    Question,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(Slot),
}

/// A template with a `{records}` and a `{question}` slot.
///
/// The template is split into segments once so rendering is a single pass;
/// slot markers appearing in the substituted values are never expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Create a template from arbitrary text.
    /// Errors if either of the `{records}` or `{question}` slots is missing.
    pub fn new(template: &str) -> Result<Self, GroundedError> {
        let this = Self::parse(template);

        for (slot, name) in [(Slot::Records, RECORDS_SLOT), (Slot::Question, QUESTION_SLOT)] {
            if !this.segments.contains(&Segment::Slot(slot)) {
                return err!(ParseConfig, "template is missing the '{{{name}}}' slot");
            }
        }

        Ok(this)
    }

    /// The instruction template for the startup dataset.
    pub fn startup() -> Self {
        Self::parse(STARTUP_TEMPLATE)
    }

    /// Everything up to the first slot.
    pub fn preamble(&self) -> &str {
        match self.segments.first() {
            Some(Segment::Text(text)) => text,
            _ => "",
        }
    }

    /// Substitute the records and the question into the template.
    ///
    /// Records are written in the given order, one per line. An empty list of records
    /// leaves the records slot empty.
    pub fn render(&self, records: &[Record], question: &str) -> String {
        let records = records
            .iter()
            .map(Record::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        let mut out = String::with_capacity(self.len() + records.len() + question.len());

        for segment in self.segments.iter() {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(Slot::Records) => out.push_str(&records),
                Segment::Slot(Slot::Question) => out.push_str(question),
            }
        }

        out
    }

    fn len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Text(text) => text.len(),
                Segment::Slot(_) => 0,
            })
            .sum()
    }

    fn parse(template: &str) -> Self {
        let mut segments = vec![];
        let mut text = String::new();
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            let (before, after) = rest.split_at(start);
            text.push_str(before);

            let slot = after[1..].find('}').and_then(|end| {
                let slot = match &after[1..end + 1] {
                    RECORDS_SLOT => Slot::Records,
                    QUESTION_SLOT => Slot::Question,
                    _ => return None,
                };
                Some((slot, end + 2))
            });

            match slot {
                Some((slot, consumed)) => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Slot(slot));
                    rest = &after[consumed..];
                }
                None => {
                    text.push('{');
                    rest = &after[1..];
                }
            }
        }

        text.push_str(rest);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Self { segments }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::startup()
    }
}
