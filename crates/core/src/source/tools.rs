//! Tool/function schemas rendered into a `<tools>` envelope.

use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct ToolsSource {
    pub tools: Vec<Value>,
}

impl ToolsSource {
    pub fn new(tools: Vec<Value>) -> Self {
        Self { tools }
    }

    /// `None` when there are no tools.
    pub fn render(&self) -> Option<String> {
        if self.tools.is_empty() {
            return None;
        }
        let json = serde_json::to_string(&self.tools).unwrap_or_default();
        Some(format!("<tools>{json}</tools>"))
    }
}
