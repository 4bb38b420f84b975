/// Console presentation helpers for the CLI
///
/// Library modules never print; everything user-facing goes through here.
use colored::*;
use std::io::IsTerminal;

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "\n{} {}",
        "⚠".yellow(),
        format!("Warning: {}", message).yellow()
    );
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("\n{} {}", "✗".red(), format!("Error: {}", message).red());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green().bold(), message);
}

pub fn print_tip(message: &str) {
    println!("\n{} {}", "→".cyan(), format!("Tip: {}", message).dimmed());
}

/// Print a section header
pub fn print_section(title: &str) {
    let width = terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(80);
    let line = "─".repeat(width.min(60));
    println!("\n{} {}", "▶".cyan(), title.bold());
    println!("{}", line.dimmed());
}

/// Print a key/value line inside a section
pub fn print_item(label: &str, value: &str) {
    println!("  {} {} {}", "•".dimmed(), format!("{}:", label).yellow(), value);
}

/// Print a statistics table using comfy_table
pub fn print_stats_table(title: &str, stats: Vec<(&str, String)>) {
    use comfy_table::modifiers::UTF8_ROUND_CORNERS;
    use comfy_table::presets::UTF8_FULL;
    use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new(title)
            .add_attribute(Attribute::Bold)
            .fg(TableColor::Cyan),
        Cell::new("").add_attribute(Attribute::Bold),
    ]);

    for (label, value) in stats {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).fg(TableColor::Green),
        ]);
    }

    println!("\n{}", table);
}

/// Print formatted number with thousands separator
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Check if colors should be disabled
pub fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err()
        && std::env::var("CLICOLOR").unwrap_or_else(|_| "1".to_string()) != "0"
}

/// Whether progress bars and colors should be drawn
pub fn interactive_output(plain: bool) -> bool {
    !plain && std::io::stderr().is_terminal()
}

/// Set the global color mode once, before any output.
pub fn init(plain: bool) {
    if plain || !colors_enabled() || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
}
