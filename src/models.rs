//! Core data models for the FAQ agent

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder `field_key` carried by checkpoint steps
pub const NO_FIELD: &str = "N/A";

//
// ================= Field values =================
//

/// A single scalar held in a template or record.
///
/// Catalog files spell these as plain JSON scalars; a reference to another
/// named entity is written `{"ref": "<name>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Reference {
        #[serde(rename = "ref")]
        name: String,
    },
    Text(String),
}

impl FieldValue {
    pub fn reference(name: impl Into<String>) -> Self {
        FieldValue::Reference { name: name.into() }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" on whole reals
            FieldValue::Real(v) => write!(f, "{:?}", v),
            FieldValue::Reference { name } => write!(f, "{}", name),
            FieldValue::Text(v) => write!(f, "{}", v),
        }
    }
}

//
// ================= Catalog entries =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalQuestion {
    pub text: String,
    #[serde(default)]
    pub alternates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub faq_key: u32,
    pub faq: String,
    pub fields: IndexMap<String, FieldValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionStep {
    pub faq_key: u32,
    pub sequence: u32,
    pub is_prompt: bool,
    pub display_text: String,
    #[serde(default)]
    pub field_key: Option<String>,
}

impl InteractionStep {
    /// Field this step populates; `None` for checkpoints.
    pub fn prompt_field(&self) -> Option<&str> {
        if !self.is_prompt {
            return None;
        }
        self.field_key
            .as_deref()
            .filter(|key| !key.is_empty() && *key != NO_FIELD)
    }
}

//
// ================= Record =================
//

/// The structured answer built up during a session.
///
/// Iterates template fields first, then fields added later in the order
/// they were first set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_template(template: &Template) -> Self {
        Self {
            fields: template.fields.clone(),
        }
    }

    /// Overwrites in place, or appends when the key is new.
    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "  {}: {}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_template() -> Template {
        let mut fields = IndexMap::new();
        fields.insert("nickname".to_string(), FieldValue::Text("current home".into()));
        fields.insert("balance".to_string(), FieldValue::Integer(1_000_000));
        fields.insert("APR".to_string(), FieldValue::Real(0.8));
        fields.insert("connection".to_string(), FieldValue::reference("refinance"));
        Template {
            faq_key: 2000,
            faq: "Buy now and refinance later".to_string(),
            fields,
        }
    }

    #[test]
    fn test_record_keeps_template_order_then_new_fields() {
        let template = sample_template();
        let mut record = Record::from_template(&template);

        record.set("zip", FieldValue::Text("94110".into()));
        record.set("balance", FieldValue::Integer(5));
        record.set("age", FieldValue::Integer(40));

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(
            keys,
            vec!["nickname", "balance", "APR", "connection", "zip", "age"]
        );
        assert_eq!(record.get("balance"), Some(&FieldValue::Integer(5)));
        // template itself untouched
        assert_eq!(template.fields["balance"], FieldValue::Integer(1_000_000));
    }

    #[test]
    fn test_field_value_json_shapes() {
        let parsed: IndexMap<String, FieldValue> = serde_json::from_str(
            r#"{"a": 1000, "b": 0.8, "c": "primary saving", "d": {"ref": "primaryhome"}}"#,
        )
        .unwrap();

        assert_eq!(parsed["a"], FieldValue::Integer(1000));
        assert_eq!(parsed["b"], FieldValue::Real(0.8));
        assert_eq!(parsed["c"], FieldValue::Text("primary saving".into()));
        assert_eq!(parsed["d"], FieldValue::reference("primaryhome"));

        let json = serde_json::to_string(&parsed["d"]).unwrap();
        assert_eq!(json, r#"{"ref":"primaryhome"}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Real(3.0).to_string(), "3.0");
        assert_eq!(FieldValue::Real(0.8).to_string(), "0.8");
        assert_eq!(FieldValue::reference("refinance").to_string(), "refinance");

        let record = Record::from_template(&sample_template());
        let rendered = record.to_string();
        assert!(rendered.starts_with("  nickname: current home\n"));
        assert!(rendered.contains("  connection: refinance\n"));
    }

    #[test]
    fn test_checkpoint_has_no_prompt_field() {
        let checkpoint = InteractionStep {
            faq_key: 1000,
            sequence: 3,
            is_prompt: false,
            display_text: "continue".into(),
            field_key: Some(NO_FIELD.into()),
        };
        assert_eq!(checkpoint.prompt_field(), None);

        let prompt = InteractionStep {
            is_prompt: true,
            field_key: Some("rent".into()),
            ..checkpoint
        };
        assert_eq!(prompt.prompt_field(), Some("rent"));
    }
}
