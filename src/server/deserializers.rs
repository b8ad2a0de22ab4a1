use serde::{Deserialize, Deserializer};

// forms send "" for fields the user left blank, that is the same as not sending them
pub fn deserialize_non_blank_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}
