//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, config) and shared utilities (open_db)
//! - `dreams` - Journal commands (add, list, show, delete)
//! - `analytics` - Statistics, distributions, trend, frequency and patterns
//! - `insights` - Narrative insights and the insight cache
//! - `import` - Journal JSON import/export

pub mod analytics;
pub mod core;
pub mod dreams;
pub mod import;
pub mod insights;

// Re-export command functions for main.rs
pub use analytics::*;
pub use core::*;
pub use dreams::*;
pub use import::*;
pub use insights::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
