//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use linkcart_core::{ImportReport, LinkRecord};

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
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single link
    pub fn print_link(&self, link: &LinkRecord) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", link.id);
                println!("Title:    {}", link.title);
                println!("URL:      {}", link.url);
                if !link.tags.is_empty() {
                    println!("Tags:     {}", link.tags.join(", "));
                }
                println!("Favorite: {}", if link.favorite { "yes" } else { "no" });
                println!("Created:  {}", link.created_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(link),
            OutputFormat::Quiet => {
                println!("{}", link.id);
            }
        }
    }

    /// Print a list of links
    pub fn print_links(&self, links: &[&LinkRecord]) {
        match self.format {
            OutputFormat::Human => {
                if links.is_empty() {
                    println!("No links found.");
                    return;
                }
                for link in links {
                    println!("{}", link_row(link));
                }
                println!("\n{} link(s)", links.len());
            }
            OutputFormat::Json => print_json(&links),
            OutputFormat::Quiet => {
                for link in links {
                    println!("{}", link.id);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print the outcome of an import
    pub fn print_import_report(&self, report: &ImportReport) {
        match self.format {
            OutputFormat::Human => {
                let mut line = format!("✓ Imported {} link(s)", report.imported);
                if report.skipped > 0 {
                    line.push_str(&format!(", skipped {}", report.skipped));
                }
                if report.replaced > 0 {
                    line.push_str(&format!(", replaced {}", report.replaced));
                }
                println!("{}", line);
            }
            OutputFormat::Json => print_json(report),
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

    /// Print a progress note to stderr (human mode only)
    pub fn progress(&self, message: &str) {
        if self.format == OutputFormat::Human {
            eprintln!("{}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
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

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to format JSON: {}", e),
    }
}

/// One-line summary used by list views
fn link_row(link: &LinkRecord) -> String {
    let star = if link.favorite { "★" } else { " " };
    let mut row = format!(
        "{} {} | {} | {}",
        star,
        link.id.short(),
        truncate(&link.title, 35),
        truncate(&link.url, 45)
    );
    if !link.tags.is_empty() {
        row.push_str(&format!(" [{}]", link.tag_line()));
    }
    row
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
