use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde::Serialize;
use serde_json::Value;

/// The canonical structured output of tailoring.
///
/// Deserialization is lenient: the provider response is free-form JSON, so
/// missing fields default, `null` becomes empty, and scalars in string
/// positions are stringified. Serialization always emits every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct ResumeRecord {
    #[serde(default, deserialize_with = "string_list")]
    pub executive_summary: Vec<String>,
    #[serde(default, deserialize_with = "object_or_default")]
    pub personal_info: PersonalInfo,
    #[serde(default, deserialize_with = "string_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "entry_list")]
    pub experience: Vec<JobEntry>,
    #[serde(default, deserialize_with = "entry_list")]
    pub projects: Vec<ProjectEntry>,
    #[serde(default, deserialize_with = "entry_list")]
    pub education: Vec<EduEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct PersonalInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub linkedin: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub github: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
}

impl PersonalInfo {
    /// Contact fields in display order, blanks dropped.
    pub fn contact_items(&self) -> Vec<&str> {
        [
            &self.phone,
            &self.email,
            &self.linkedin,
            &self.github,
            &self.location,
        ]
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct JobEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "string_list")]
    pub points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct ProjectEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "string_list")]
    pub points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct EduEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub school: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
}

/// How the provider response was turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParseOutcome {
    Parsed,
    /// The response was not usable JSON; the record is the fixed fallback shape.
    Fallback { reason: String, raw_excerpt: String },
}

/// A tailoring result: the record plus the outcome sentinel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailoredResume {
    pub record: ResumeRecord,
    pub outcome: ParseOutcome,
}

impl TailoredResume {
    pub fn parsed(record: ResumeRecord) -> Self {
        Self {
            record,
            outcome: ParseOutcome::Parsed,
        }
    }

    /// True when the record is the fallback shape rather than provider data.
    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, ParseOutcome::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.outcome {
            ParseOutcome::Parsed => None,
            ParseOutcome::Fallback { reason, .. } => Some(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field deserializers
// ---------------------------------------------------------------------------

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value).unwrap_or_default())
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    })
}

/// Keeps the entries that convert and drops the rest, so one malformed item
/// does not discard the whole list.
fn entry_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Object(map) => vec![Value::Object(map)],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Anything other than an object falls back to the default.
fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_default())
}
