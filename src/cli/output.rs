//! Terminal output for the CLI

use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::models::{ADMIN_LEVEL, USER_LEVEL};
use crate::auth::{Role, User};

fn line(marker: ColoredString, message: &str) {
    println!("{} {}", marker, message);
}

pub fn success(message: &str) {
    line("✓".green(), message);
}

/// Errors go to stderr
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn warn(message: &str) {
    line("⚠".yellow(), message);
}

pub fn info(message: &str) {
    line("ℹ".blue(), message);
}

/// Colour for a privilege level: admin-grade red, user-grade yellow, the rest green
fn level_color(level: i32) -> Color {
    if level >= ADMIN_LEVEL {
        Color::Red
    } else if level >= USER_LEVEL {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Print roles, weakest first
pub fn print_role_table(roles: &[Role]) {
    if roles.is_empty() {
        info("No roles found. Seed them with 'demoyork seed-roles'");
        return;
    }

    let mut sorted: Vec<&Role> = roles.iter().collect();
    sorted.sort_by_key(|role| role.level);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["Name", "Level", "Description", "Id"]
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );

    for role in sorted {
        table.add_row(vec![
            Cell::new(&role.name),
            Cell::new(role.level).fg(level_color(role.level)),
            Cell::new(&role.description),
            Cell::new(&role.id),
        ]);
    }

    println!("{table}");
}

/// One-line summary of a freshly created account
pub fn print_created_user(user: &User, role: &Role) {
    success(&format!(
        "Created user '{}' <{}> with role {}",
        user.username,
        user.email,
        role.to_string().bold()
    ));
    info(&format!("User id: {}", user.id));
}
