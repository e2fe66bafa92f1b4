//! Terminal output helpers for the demo.

use wristlink_core::pages::PageView;

/// Print a section header.
pub fn section(title: &str) {
    println!();
    println!("── {title} ──");
}

/// Print a (possibly multi-line) update from one endpoint.
pub fn endpoint_lines(endpoint: &str, text: &str) {
    let mut lines = text.lines();
    if let Some(first) = lines.next() {
        println!("{endpoint:>5} │ {first}");
    }
    for line in lines {
        println!("      │ {line}");
    }
}

/// Print the watch page table, marking the current page.
pub fn render_pages(pages: &[PageView]) {
    for page in pages {
        let marker = if page.is_current { "▸" } else { " " };
        let color = page
            .color
            .map_or_else(String::new, |c| format!(" [{c}]"));
        if page.status_line.is_empty() {
            println!("  {marker} {}{color}", page.command);
        } else {
            let mut lines = page.status_line.lines();
            let first = lines.next().unwrap_or_default();
            println!("  {marker} {}{color}: {first}", page.command);
            for line in lines {
                println!("      {line}");
            }
        }
    }
}
