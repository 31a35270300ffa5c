use serde::{Deserialize, Deserializer, Serialize};
use surrealdb::sql::Datetime;
use surrealdb::RecordId;

/// The one persisted entity: a structured recipe.
///
/// Previews (freshly extracted, not yet saved) carry `id: None` and
/// `added_on: None`; both are filled in by the store on insert. After
/// insert a record is immutable except for deletion.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Recipe {
    #[serde(default, skip_serializing)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub prep_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cook_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_servings")]
    pub servings: Option<Servings>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub ingredients: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub instructions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cuisine: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub meal_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: Option<String>,
    /// Base64 image bytes, present only when the user uploaded one manually
    #[serde(default)]
    pub image_data_b64: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source_url: Option<String>,
    /// Stamped by the store at insert time, immutable afterwards
    #[serde(default)]
    pub added_on: Option<Datetime>,
}

/// Servings come back from the model as either text ("4-6 מנות") or a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Servings {
    Count(i64),
    Text(String),
}

impl std::fmt::Display for Servings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Servings::Count(n) => write!(f, "{n}"),
            Servings::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Recipe {
    /// Build a recipe from a model-produced JSON value.
    ///
    /// This is the coercion boundary: wrong-typed or missing list fields
    /// become empty lists, non-string list elements are dropped, and
    /// unknown fields are ignored. Only a non-object input is rejected.
    pub fn from_model_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Record key as a plain string, usable in URLs and delete calls.
    pub fn id_key(&self) -> Option<String> {
        self.id.as_ref().map(|id| id.key().to_string())
    }

    /// Title to display, never empty.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => crate::i18n::tr("untitled_recipe"),
        }
    }
}

/// Accept a string, trim it, and treat null/empty/other types as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept a count, a fractional count, or free text; anything else is absent.
fn lenient_servings<'de, D>(deserializer: D) -> Result<Option<Servings>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(count) => Some(Servings::Count(count)),
            None => Some(Servings::Text(n.to_string())),
        },
        serde_json::Value::String(s) if !s.trim().is_empty() => {
            Some(Servings::Text(s.trim().to_string()))
        }
        _ => None,
    })
}

/// Accept a list of strings; anything that is not a list becomes an empty
/// list, and non-string elements inside a list are dropped.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
