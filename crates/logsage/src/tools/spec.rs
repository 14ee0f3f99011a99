//! Structured tool descriptions with usage guidance.
//!
//! `ToolSpec` turns a purpose plus optional guidance (when to use, when not
//! to, examples, output format) into the single description string the model
//! sees. Only the name and purpose are required, so building never fails.

use crate::ToolDef;

/// A structured tool specification.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name (must be unique within a ToolSet).
    pub name: String,
    /// One-sentence purpose: "Retrieves log entries for a specific log level".
    pub purpose: String,
    pub when_to_use: Option<String>,
    /// Guidance that keeps the model from confusing similar tools.
    pub when_not_to_use: Option<String>,
    pub parameters: serde_json::Value,
    pub examples: Vec<UsageExample>,
    pub output_format: Option<String>,
}

/// A usage example for a tool.
#[derive(Debug, Clone)]
pub struct UsageExample {
    pub input: String,
    pub output: String,
}

impl ToolSpec {
    /// Start a spec with the required fields. Parameters default to an
    /// empty object schema.
    pub fn builder(name: impl Into<String>, purpose: impl Into<String>) -> ToolSpecBuilder {
        ToolSpecBuilder {
            spec: ToolSpec {
                name: name.into(),
                purpose: purpose.into(),
                when_to_use: None,
                when_not_to_use: None,
                parameters: serde_json::json!({"type": "object", "properties": {}}),
                examples: Vec::new(),
                output_format: None,
            },
        }
    }

    /// Render the description string for the LLM.
    pub fn to_description(&self) -> String {
        let mut desc = self.purpose.trim_end_matches('.').to_string();
        desc.push('.');
        if let Some(when) = &self.when_to_use {
            desc.push_str(&format!("\nWhen to use: {when}"));
        }
        if let Some(when_not) = &self.when_not_to_use {
            desc.push_str(&format!("\nWhen NOT to use: {when_not}"));
        }
        if !self.examples.is_empty() {
            desc.push_str("\nExamples:");
            for ex in &self.examples {
                desc.push_str(&format!("\n  - Input: {} -> {}", ex.input, ex.output));
            }
        }
        if let Some(format) = &self.output_format {
            desc.push_str(&format!("\nOutput format: {format}"));
        }
        desc
    }

    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef::new(
            self.name.clone(),
            self.to_description(),
            self.parameters.clone(),
        )
    }
}

/// Builder for [`ToolSpec`].
#[derive(Debug, Clone)]
pub struct ToolSpecBuilder {
    spec: ToolSpec,
}

impl ToolSpecBuilder {
    pub fn when_to_use(mut self, when: impl Into<String>) -> Self {
        self.spec.when_to_use = Some(when.into());
        self
    }

    pub fn when_not_to_use(mut self, when_not: impl Into<String>) -> Self {
        self.spec.when_not_to_use = Some(when_not.into());
        self
    }

    pub fn parameters(mut self, params: serde_json::Value) -> Self {
        self.spec.parameters = params;
        self
    }

    /// Derive JSON Schema parameters from a type implementing `schemars::JsonSchema`,
    /// so the schema and the deserializer cannot diverge.
    pub fn parameters_for<T: schemars::JsonSchema>(self) -> Self {
        self.parameters(crate::json_schema_for::<T>())
    }

    pub fn example(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.spec.examples.push(UsageExample {
            input: input.into(),
            output: output.into(),
        });
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.spec.output_format = Some(format.into());
        self
    }

    pub fn build(self) -> ToolSpec {
        self.spec
    }

    /// Shortcut for `.build().to_tool_def()`.
    pub fn to_tool_def(self) -> ToolDef {
        self.spec.to_tool_def()
    }
}
