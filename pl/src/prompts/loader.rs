//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::DocumentView;
use crate::technique::{TECHNIQUES, resolve_technique};

/// Context for the Chad system prompt
#[derive(Debug, Clone, Serialize)]
pub struct SystemContext {
    pub reset_marker: String,
    pub techniques: Vec<TechniqueContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechniqueContext {
    pub name: String,
    pub sections: Vec<SectionContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionContext {
    /// 1-based position within the technique
    pub index: usize,
    pub label: String,
    pub description: String,
}

impl SystemContext {
    /// Context listing every registered technique's section structure
    pub fn new(reset_marker: impl Into<String>) -> Self {
        Self {
            reset_marker: reset_marker.into(),
            techniques: TECHNIQUES
                .iter()
                .map(|t| TechniqueContext {
                    name: t.name.to_string(),
                    sections: t
                        .sections
                        .iter()
                        .enumerate()
                        .map(|(i, s)| SectionContext {
                            index: i + 1,
                            label: s.label.to_string(),
                            description: s.description.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Context for the prompt-state block
#[derive(Debug, Clone, Serialize)]
pub struct PromptStateContext {
    /// Technique name, or "Not set"
    pub technique: String,
    /// One "  - key: preview" line per section
    pub sections: String,
}

impl PromptStateContext {
    pub fn from_view(view: &DocumentView, preview_chars: usize) -> Self {
        let technique = match view.technique_id.as_deref() {
            Some(reference) => resolve_technique(reference)
                .map(|t| t.name.to_string())
                .unwrap_or_else(|| reference.to_string()),
            None => "Not set".to_string(),
        };
        let sections = view
            .sections
            .iter()
            .map(|s| format!("  - {}: {}", s.key, preview(&s.content, preview_chars)))
            .collect::<Vec<_>>()
            .join("\n");
        Self { technique, sections }
    }
}

/// First `max_chars` characters, with "..." when anything was cut
pub fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.promptly/prompts/`)
    user_dir: Option<PathBuf>,
    /// Repo default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `root` (looks for `.promptly/prompts/` and `prompts/`)
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let user_dir = root.join(".promptly/prompts");
        let repo_dir = root.join("prompts");

        Self {
            hbs: Self::engine(),
            user_dir: if user_dir.exists() { Some(user_dir) } else { None },
            repo_dir: if repo_dir.exists() { Some(repo_dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.promptly/prompts/{name}.pmt`
    /// 2. Repo default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from user override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(ref repo_dir) = self.repo_dir {
            let path = repo_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from repo: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read repo prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        let template = self.load_template(template_name)?;
        debug!(%template_name, "render: called");

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Chad's system prompt
    pub fn system_prompt(&self, reset_marker: &str) -> Result<String> {
        info!(%reset_marker, "Rendering system prompt");
        self.render("chad-system", &SystemContext::new(reset_marker))
    }

    /// Chad's opening message
    pub fn greeting(&self) -> Result<String> {
        self.load_template("greeting")
    }

    /// Prompt-state block for the next user turn; empty when the document has no sections
    pub fn prompt_state(&self, view: &DocumentView, preview_chars: usize) -> Result<String> {
        if view.sections.is_empty() {
            debug!("prompt_state: no sections, skipping");
            return Ok(String::new());
        }
        self.render("prompt-state", &PromptStateContext::from_view(view, preview_chars))
    }
}
