use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table};

use mapzo::Route;
use mapzo::views::EventCard;

use crate::theme::{ICONS, THEME};

/// Global CLI options that affect output
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub no_color: bool,
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    fn line(&self, icon: &str, message: &str, color: colored::Color) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }

    pub fn success(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.line(ICONS.success, message, THEME.success));
        }
    }

    /// Errors are printed even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.line(ICONS.error, message, THEME.error));
    }

    pub fn warning(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.line(ICONS.warning, message, THEME.warning));
        }
    }

    pub fn info(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.line(ICONS.info, message, THEME.info));
        }
    }

    pub fn heading(&self, text: &str) {
        if !self.options.quiet {
            let output = if self.options.no_color {
                format!("\n{text}\n{}", "=".repeat(text.chars().count()))
            } else {
                format!("\n{}", text.color(THEME.primary).bold())
            };
            println!("{output}");
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if !self.options.quiet {
            let output = if self.options.no_color {
                format!("{key}: {value}")
            } else {
                format!("{}: {}", key.color(THEME.key).bold(), value.color(THEME.value))
            };
            println!("{output}");
        }
    }

    pub fn bullet(&self, text: &str) {
        if !self.options.quiet {
            let output = if self.options.no_color {
                format!("  {} {text}", ICONS.bullet)
            } else {
                format!("  {} {text}", ICONS.bullet.color(THEME.muted))
            };
            println!("{output}");
        }
    }

    /// Prints raw text, e.g. a TOML document.
    pub fn raw(&self, text: &str) {
        if !self.options.quiet {
            println!("{text}");
        }
    }

    pub fn table(&self, table: &Table) {
        if !self.options.quiet {
            println!("{table}");
        }
    }

    pub fn create_table(&self) -> Table {
        let mut table = Table::new();
        if !self.options.no_color {
            table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        } else {
            table.load_preset(comfy_table::presets::ASCII_FULL);
        }
        table
    }

    pub fn add_table_header(&self, table: &mut Table, headers: &[&str]) {
        let header_cells: Vec<Cell> = headers
            .iter()
            .map(|h| {
                let cell = Cell::new(h).add_attribute(Attribute::Bold);
                if self.options.no_color { cell } else { cell.fg(TableColor::Cyan) }
            })
            .collect();
        table.set_header(header_cells);
    }

    pub fn routes_table(&self) -> Table {
        let mut table = self.create_table();
        self.add_table_header(&mut table, &["Fragment", "Route", "Tab", "View switcher"]);
        for route in Route::ALL {
            table.add_row(vec![
                Cell::new(route.fragment()),
                Cell::new(route.name()),
                Cell::new(route.tab().label()),
                Cell::new(if route.is_discover() { "yes" } else { "" }),
            ]);
        }
        table
    }

    pub fn events_table(&self, cards: &[EventCard]) -> Table {
        let mut table = self.create_table();
        if cards.is_empty() {
            table.add_row(vec![Cell::new("No events found")]);
            return table;
        }
        self.add_table_header(&mut table, &["Event", "When", "Venue", "Price", "Likes", "Going", "You"]);
        for card in cards {
            let mut marks = Vec::new();
            if card.liked {
                marks.push("♥");
            }
            if card.saved {
                marks.push("🔖");
            }
            if card.attending {
                marks.push("✓");
            }
            let title = format!("{} {}", card.emoji, card.title);
            let title_cell = if card.is_live && !self.options.no_color {
                Cell::new(format!("{title} (live)")).fg(TableColor::Red)
            } else if card.is_live {
                Cell::new(format!("{title} (live)"))
            } else {
                Cell::new(title)
            };
            table.add_row(vec![
                title_cell,
                Cell::new(&card.when),
                Cell::new(&card.venue),
                Cell::new(&card.price),
                Cell::new(card.like_count),
                Cell::new(card.attending_count),
                Cell::new(marks.join(" ")),
            ]);
        }
        table
    }
}
