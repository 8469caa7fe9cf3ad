//! Prompt library for the narrative generator
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/somnia/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! A prompt file is Markdown with YAML front matter (`id`, `version`,
//! `task_type`) followed by `# System` and `# User` sections. Placeholders are
//! written `{{name}}`.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

mod defaults {
    pub const GENERATE_INSIGHTS: &str = include_str!("../../../prompts/generate_insights.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Journal-wide narrative insight under a strict JSON contract
    GenerateInsights,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateInsights => "generate_insights",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::GenerateInsights]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::GenerateInsights => defaults::GENERATE_INSIGHTS,
        }
    }

    fn file_name(&self) -> String {
        format!("{}.md", self.as_str())
    }
}

/// Prompt front matter
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    pub task_type: String,
}

/// A loaded prompt
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Body after the front matter
    pub content: String,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn is_override(&self) -> bool {
        self.override_path.is_some()
    }

    pub fn system_section(&self) -> Option<&str> {
        section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        section(&self.content, "# User")
    }

    /// Rendered system text (empty when the prompt has no system section)
    pub fn render_system(&self, vars: &HashMap<&str, String>) -> String {
        self.system_section()
            .map(|s| substitute(s, vars))
            .unwrap_or_default()
    }

    /// Rendered user text; falls back to the whole body without sections
    pub fn render_user(&self, vars: &HashMap<&str, String>) -> String {
        substitute(self.user_section().unwrap_or(&self.content), vars)
    }
}

/// Prompt library with a per-instance cache
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Embedded prompts only (no override lookup)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt, loading it on first use
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("prompt {}", id.as_str())))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(path) = self.override_path(id) {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read prompt override {}: {}", path.display(), e))
            })?;
            let (metadata, content) = parse_prompt(&content)?;
            tracing::debug!(prompt = id.as_str(), path = %path.display(), "Using prompt override");
            return Ok(Prompt {
                metadata,
                content,
                override_path: Some(path),
            });
        }

        let (metadata, content) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content,
            override_path: None,
        })
    }

    /// Path of an existing override file for `id`
    pub fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|dir| dir.join(id.file_name()))
            .filter(|path| path.exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompt override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("somnia").join("prompts").join("overrides"))
}

fn parse_prompt(raw: &str) -> Result<(PromptMetadata, String)> {
    let rest = raw
        .trim()
        .strip_prefix("---")
        .ok_or_else(|| Error::Config("Prompt must start with YAML front matter (---)".into()))?;
    let end = rest
        .find("\n---")
        .ok_or_else(|| Error::Config("Prompt front matter is not closed".into()))?;

    let metadata: PromptMetadata = serde_yaml::from_str(rest[..end].trim())
        .map_err(|e| Error::Config(format!("Invalid prompt front matter: {}", e)))?;
    let body = rest[end + 4..].trim().to_string();

    Ok((metadata, body))
}

fn section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)? + header.len();
    let after = &content[start..];
    let end = after.find("\n# ").unwrap_or(after.len());
    Some(after[..end].trim())
}

fn substitute(template: &str, vars: &HashMap<&str, String>) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{{{}}}}}", key), value)
    })
}
