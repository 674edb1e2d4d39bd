//! Tool catalog models.
//!
//! These mirror the JSON the MCP server publishes in its `tools` SSE event:
//!
//! ```json
//! { "tools": [ { "name": "...", "description": "...", "parameters": { ... } } ] }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Catalog
// =============================================================================

/// Schema of a single tool parameter.
///
/// Fields the server sends beyond the known ones (`enum`, `items`, ...) are
/// kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A server-defined tool and its parameter schema.
///
/// A `null` description or parameter map reads as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: BTreeMap<String, ParameterSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Tools in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCatalog {
    pub tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Tool types offered by the host's discovery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolType {
    #[default]
    All,
    SearchTool,
    UpdateTool,
    ReportTool,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::SearchTool => "search_tool",
            Self::UpdateTool => "update_tool",
            Self::ReportTool => "report_tool",
        }
    }

    pub fn filter(&self) -> ToolFilter {
        ToolFilter::from_value(Some(self.as_str()))
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "search_tool" => Ok(Self::SearchTool),
            "update_tool" => Ok(Self::UpdateTool),
            "report_tool" => Ok(Self::ReportTool),
            other => Err(format!(
                "unknown tool type '{other}' (expected all, search_tool, update_tool or report_tool)"
            )),
        }
    }
}

/// Name filter applied to a discovered catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolFilter {
    /// Keep every tool.
    #[default]
    All,
    /// Keep tools whose name contains the needle (case-sensitive).
    Contains(String),
}

impl ToolFilter {
    /// Absent, empty and `"all"` all mean no filtering.
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            None | Some("") | Some("all") => Self::All,
            Some(needle) => Self::Contains(needle.to_string()),
        }
    }

    pub fn matches(&self, tool: &ToolDefinition) -> bool {
        match self {
            Self::All => true,
            Self::Contains(needle) => tool.name.contains(needle.as_str()),
        }
    }

    /// Retain matching tools, preserving server order.
    pub fn apply(&self, catalog: ToolCatalog) -> ToolCatalog {
        match self {
            Self::All => catalog,
            Self::Contains(_) => ToolCatalog {
                tools: catalog
                    .tools
                    .into_iter()
                    .filter(|t| self.matches(t))
                    .collect(),
            },
        }
    }
}

impl fmt::Display for ToolFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Contains(needle) => write!(f, "contains '{needle}'"),
        }
    }
}
