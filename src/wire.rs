use serde::Serialize;
use serde_json::Value;

/// Describes one feature of an application's input, output or metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Feature {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl Feature {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind: kind.into(),
            description: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Everything needed to register an application.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApplicationSpec {
    pub name: String,
    pub label: String,
    pub description: String,
    /// e.g. `regression`, `binary_classification`.
    pub prediction_type: String,
    /// Explanatory features.
    pub data_input: Vec<Feature>,
    /// Prediction target.
    pub data_output: Feature,
    /// Illustrative features.
    pub metadata: Vec<Feature>,
    /// Free-form settings such as a decision threshold.
    pub params: Value,
}

/// Everything needed to register a model under an application.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelSpec {
    pub name: String,
    pub label: String,
    pub description: String,
    pub version: String,
    pub params: Value,
}

/// Settings of an API key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyParams {
    /// Granted rights, e.g. `search` or `addObject`.
    pub acl: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub referers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Seconds before the key expires; `0` never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<u64>,
    /// `0` disables the limit.
    #[serde(
        rename = "maxQueriesPerIPPerHour",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_queries_per_ip_per_hour: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hits_per_query: Option<u64>,
}

impl ApiKeyParams {
    pub fn new<I, S>(acl: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            acl: acl.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Formats `template`, percent-encoding each argument into its `{}` slot.
pub(crate) fn endpoint(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut parts = template.split("{}").peekable();
    while let Some(part) = parts.next() {
        out.push_str(part);
        if parts.peek().is_some() {
            if let Some(arg) = args.next() {
                out.push_str(&urlencoding::encode(arg));
            }
        }
    }
    out
}
