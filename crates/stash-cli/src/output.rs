//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use stash_core::{Bookmark, UrlMetadata, View};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single bookmark
    pub fn print_bookmark(&self, bookmark: &Bookmark) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", bookmark.id);
                println!("Title:       {}", bookmark.display_title());
                println!("URL:         {}", bookmark.url);
                if let Some(ref desc) = bookmark.metadata_description {
                    println!("Description: {}", desc);
                }
                if let Some(ref image) = bookmark.metadata_image {
                    println!("Image:       {}", image);
                }
                println!("Flags:       {}", flags(bookmark));
                println!(
                    "Created:     {}",
                    bookmark.created_at.format("%Y-%m-%d %H:%M")
                );
            }
            OutputFormat::Json => print_json(bookmark),
            OutputFormat::Quiet => println!("{}", bookmark.id),
        }
    }

    /// Print one view's bookmarks
    pub fn print_bookmarks(&self, bookmarks: &[Bookmark], view: View) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No {} bookmarks.", view);
                    return;
                }
                for bookmark in bookmarks {
                    let pin = if bookmark.is_permanent { "*" } else { " " };
                    println!(
                        "{} {} | {} | {}",
                        pin,
                        short_id(&bookmark.id),
                        truncate(bookmark.display_title(), 35),
                        truncate(&bookmark.url, 45)
                    );
                }
                println!("\n{} {} bookmark(s)", bookmarks.len(), view);
            }
            OutputFormat::Json => print_json(bookmarks),
            OutputFormat::Quiet => {
                for bookmark in bookmarks {
                    println!("{}", bookmark.id);
                }
            }
        }
    }

    /// Print freshly fetched metadata
    pub fn print_metadata(&self, metadata: &UrlMetadata) {
        match self.format {
            OutputFormat::Human => {
                let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "(none)".to_string());
                println!("Title:       {}", show(&metadata.title));
                println!("Description: {}", show(&metadata.description));
                println!("Image:       {}", show(&metadata.image));
            }
            OutputFormat::Json => print_json(metadata),
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn flags(bookmark: &Bookmark) -> String {
    let mut flags = Vec::new();
    if bookmark.is_archived {
        flags.push("archived");
    }
    if bookmark.is_permanent {
        flags.push("important");
    }
    if flags.is_empty() {
        "(none)".to_string()
    } else {
        flags.join(", ")
    }
}

/// First 8 characters of an id
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
