use crate::infrastructure::error::ExtractionError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The structured payload an AI operation expects to find in provider text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    Todos,
    News,
    Advice,
}

const ADVICE_ARRAY_FIELDS: [&str; 4] = [
    "budgetBreakdown",
    "investmentRecommendations",
    "savingsGoals",
    "tips",
];

impl ExpectedShape {
    pub fn root_field(self) -> &'static str {
        match self {
            Self::Todos => "todos",
            Self::News => "news",
            Self::Advice => "advice",
        }
    }

    fn check(self, document: &Value) -> Result<(), ExtractionError> {
        let field = self.root_field();
        let Some(root) = document.get(field) else {
            return Err(ExtractionError::SchemaMismatch(format!("missing `{field}`")));
        };
        match self {
            Self::Todos | Self::News => {
                if !root.is_array() {
                    return Err(ExtractionError::SchemaMismatch(format!(
                        "`{field}` must be an array"
                    )));
                }
            }
            Self::Advice => {
                if !root.is_object() {
                    return Err(ExtractionError::SchemaMismatch(
                        "`advice` must be an object".to_string(),
                    ));
                }
                for nested in ADVICE_ARRAY_FIELDS {
                    if !root.get(nested).is_some_and(Value::is_array) {
                        return Err(ExtractionError::SchemaMismatch(format!(
                            "`advice.{nested}` must be an array"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Returns the span from the first `{` to the last `}`.
///
/// This is a heuristic, not a parser: prose that contains stray braces before
/// or after the payload widens the span and the parse step then fails.
pub fn json_span(raw_text: &str) -> Result<&str, ExtractionError> {
    let start = raw_text.find('{').ok_or(ExtractionError::NoJsonFound)?;
    let end = raw_text.rfind('}').ok_or(ExtractionError::NoJsonFound)?;
    if end < start {
        return Err(ExtractionError::NoJsonFound);
    }
    Ok(&raw_text[start..=end])
}

/// Locates, parses and shape-checks the embedded JSON object, then decodes it
/// into `T`. Field-level type errors during decoding count as a schema mismatch.
pub fn extract<T>(raw_text: &str, shape: ExpectedShape) -> Result<T, ExtractionError>
where
    T: DeserializeOwned,
{
    let span = json_span(raw_text)?;
    let document: Value = serde_json::from_str(span)
        .map_err(|error| ExtractionError::ParseFailure(error.to_string()))?;
    shape.check(&document)?;
    serde_json::from_value(document)
        .map_err(|error| ExtractionError::SchemaMismatch(error.to_string()))
}
