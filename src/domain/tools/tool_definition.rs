//! Tool definition - schema and metadata for one retrieval capability.
//!
//! A definition is authored once per capability and is immutable at query
//! time. Several definitions may wrap the same backend with different
//! parameter shapes; the definition describes the access pattern, not the
//! storage layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{QueryId, ValidationError};

use super::{ParameterSchema, ToolInvocation};

/// How targeted a tool is. Used to break ties between tools that are
/// alternative access paths to the same information.
///
/// Ordering: `Generic < Filtered < Structured`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specificity {
    /// Free-text search over everything.
    #[default]
    Generic,
    /// Search narrowed by metadata filters.
    Filtered,
    /// Exact lookup over structured data.
    Structured,
}

/// Definition of a tool the router can invoke.
///
/// # Examples
///
/// ```
/// use rag_router::domain::tools::{ParamSpec, ParamType, ParameterSchema, ToolDefinition};
///
/// let definition = ToolDefinition::new(
///     "search_text",
///     "Keyword search over documents",
///     ParameterSchema::new().field(ParamSpec::required("query", ParamType::String, "Search terms")),
/// );
/// assert_eq!(definition.name(), "search_text");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "search_blueprint")
    name: String,

    /// Human-readable description for the router prompt and docs
    description: String,

    /// Extra guidance on when (not) to use the tool
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    usage_notes: Vec<String>,

    parameters: ParameterSchema,

    /// Bumped whenever the parameter contract changes
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default)]
    specificity: Specificity,

    /// Tools sharing a group are mutually exclusive alternatives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exclusive_group: Option<String>,
}

fn default_version() -> u32 {
    1
}

impl ToolDefinition {
    /// Creates a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage_notes: Vec::new(),
            parameters,
            version: default_version(),
            specificity: Specificity::default(),
            exclusive_group: None,
        }
    }

    /// Adds a usage note.
    pub fn with_usage_note(mut self, note: impl Into<String>) -> Self {
        self.usage_notes.push(note.into());
        self
    }

    /// Sets the contract version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the specificity tier.
    pub fn with_specificity(mut self, specificity: Specificity) -> Self {
        self.specificity = specificity;
        self
    }

    /// Places the tool in a group of mutually exclusive alternatives.
    pub fn with_exclusive_group(mut self, group: impl Into<String>) -> Self {
        self.exclusive_group = Some(group.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn usage_notes(&self) -> &[String] {
        &self.usage_notes
    }

    pub fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    pub fn exclusive_group(&self) -> Option<&str> {
        self.exclusive_group.as_deref()
    }

    /// Returns the parameters as a JSON Schema object.
    pub fn parameters_json_schema(&self) -> Value {
        self.parameters.to_json_schema()
    }

    /// Validates raw parameters and produces an invocation for a query.
    ///
    /// This is the only way to build a [`ToolInvocation`], so an invocation
    /// with partially-invalid parameters cannot exist.
    pub fn instantiate(
        &self,
        query_id: QueryId,
        raw_parameters: &Value,
    ) -> Result<ToolInvocation, ValidationError> {
        let parameters = self.parameters.validate(raw_parameters)?;
        Ok(ToolInvocation::validated(query_id, self.name.clone(), parameters))
    }

    /// Converts to OpenAI tool format.
    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_json_schema()
            }
        })
    }

    /// Converts to Anthropic tool format.
    pub fn to_anthropic_format(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.parameters_json_schema()
        })
    }

    /// Renders the tool as a prompt section for the router.
    pub fn describe_for_prompt(&self) -> String {
        let mut out = format!("### {}\n{}\n", self.name, self.description);
        for note in &self.usage_notes {
            out.push_str(&format!("- {}\n", note));
        }
        out.push_str("Parameters (JSON Schema):\n");
        out.push_str(&self.parameters_json_schema().to_string());
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::{ParamSpec, ParamType};
    use serde_json::json;

    fn sample() -> ToolDefinition {
        ToolDefinition::new(
            "search_blueprint",
            "Search blueprint images by description and date",
            ParameterSchema::new()
                .field(ParamSpec::required("description", ParamType::String, "Subject"))
                .field(ParamSpec::optional("start_date", ParamType::Date, "From")),
        )
        .with_specificity(Specificity::Filtered)
        .with_usage_note("Use for drawings, plans and blueprints")
    }

    #[test]
    fn specificity_orders_generic_lowest() {
        assert!(Specificity::Generic < Specificity::Filtered);
        assert!(Specificity::Filtered < Specificity::Structured);
    }

    #[test]
    fn instantiate_validates_parameters() {
        let def = sample();
        let query_id = QueryId::new();

        let ok = def
            .instantiate(query_id, &json!({ "description": "city hall" }))
            .unwrap();
        assert_eq!(ok.tool_name(), "search_blueprint");
        assert_eq!(ok.query_id(), query_id);

        let err = def.instantiate(query_id, &json!({})).unwrap_err();
        assert_eq!(err, ValidationError::missing("description"));
    }

    #[test]
    fn to_openai_format_has_correct_structure() {
        let openai = sample().to_openai_format();

        assert_eq!(openai["type"], "function");
        assert_eq!(openai["function"]["name"], "search_blueprint");
        assert_eq!(openai["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn to_anthropic_format_has_correct_structure() {
        let anthropic = sample().to_anthropic_format();

        assert_eq!(anthropic["name"], "search_blueprint");
        assert!(anthropic["input_schema"]["properties"].is_object());
    }

    #[test]
    fn prompt_description_includes_notes_and_schema() {
        let text = sample().describe_for_prompt();
        assert!(text.starts_with("### search_blueprint"));
        assert!(text.contains("- Use for drawings"));
        assert!(text.contains("\"required\":[\"description\"]"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "name": "my_tool",
            "description": "My tool",
            "parameters": { "fields": [] }
        }"#;

        let def: ToolDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.version(), 1);
        assert_eq!(def.specificity(), Specificity::Generic);
        assert!(def.exclusive_group().is_none());
    }
}
