//! Prompt templates for medrag.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub entities: EntityPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for medical entity extraction from a search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityPrompts {
    pub user: String,
}

impl Default for EntityPrompts {
    fn default() -> Self {
        Self {
            user: concat!(
                "Extract the following from this medical query: ",
                "1. Relevant medical topics (as a list of strings), ",
                "2. Diagnoses (as a list of strings), ",
                "3. Chief complaints or symptoms (as a list of strings). ",
                "Respond as a JSON object with keys: topics, diagnoses, complaints. ",
                "Query: \"{{query}}\""
            )
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let entities_path = custom_path.join("entities.toml");
            if entities_path.exists() {
                let content = std::fs::read_to_string(&entities_path)?;
                prompts.entities = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Render the entity extraction prompt for a query.
    pub fn entity_prompt(&self, query: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        self.render_with_custom(&self.entities.user, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.entities.user.contains("{{query}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_entity_prompt_embeds_query() {
        let prompts = Prompts::default();
        let rendered = prompts.entity_prompt("chest pain on exertion");
        assert!(rendered.ends_with("Query: \"chest pain on exertion\""));
        assert!(rendered.starts_with("Extract the following from this medical query: "));
    }

    #[test]
    fn test_custom_variables_do_not_override_query() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("query".to_string(), "ignored".to_string());
        assert!(prompts.entity_prompt("syncope").contains("\"syncope\""));
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("entities.toml"),
            "user = \"Find {{specialty}} terms in {{query}}\"\n",
        )
        .unwrap();

        let mut vars = HashMap::new();
        vars.insert("specialty".to_string(), "cardiology".to_string());
        let prompts = Prompts::load(dir.path().to_str(), Some(&vars)).unwrap();

        assert_eq!(
            prompts.entity_prompt("murmur"),
            "Find cardiology terms in murmur"
        );
    }
}
