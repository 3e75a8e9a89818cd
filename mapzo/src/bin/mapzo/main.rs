mod demo;
mod output;
mod theme;

use std::fmt::Write;
use std::io::{self, Write as IoWrite};
use std::path::PathBuf;

use anyhow::Result;
use clap::{
    Args, ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, RgbColor, Style},
    },
    error::ErrorKind,
};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};

use demo::{DemoArgs, handle_demo};
use mapzo::MapzoConfig;
use output::{GlobalOptions, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("MAPZO_CONFIG", "Path of the config file (default: mapzo.toml)"),
    ("MAPZO_BACKEND_URL", "Backend project url referenced by the default config"),
    ("MAPZO_ANON_KEY", "Public backend key referenced by the default config"),
    ("RUST_LOG", "Log filter, e.g. mapzo=debug"),
];

#[derive(Parser)]
#[command(name = "mapzo")]
#[command(version)]
#[command(
    about = "Client core of the Mapzo event-discovery app",
    long_about = r#"Inspect and exercise the Mapzo client core:

• Hash routes and the tabs they belong to
• The effective configuration
• A scripted session against the in-memory backend

Commands:
  routes    Print the route table
  config    Print the effective configuration
  demo      Run a scripted session
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Config file to load
    #[arg(long, global = true, env = "MAPZO_CONFIG", default_value = "mapzo.toml")]
    config: PathBuf,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn parse_with_styles() -> Self {
        let command = build_cli_command();
        let matches = match command.styles(help_styles()).try_get_matches() {
            Ok(matches) => matches,
            Err(err) => exit_with(err),
        };
        match Cli::from_arg_matches(&matches) {
            Ok(cli) => cli,
            Err(err) => exit_with(err),
        }
    }
}

fn exit_with(err: clap::error::Error) -> ! {
    let to_stdout = matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
    let _ = if to_stdout {
        print_blank_line_stdout()
    } else {
        print_blank_line_stderr()
    };
    if let Err(print_err) = err.print()
        && print_err.kind() != io::ErrorKind::BrokenPipe
    {
        eprintln!("Failed to display help: {print_err}");
    }
    let _ = if to_stdout {
        print_blank_line_stdout()
    } else {
        print_blank_line_stderr()
    };
    std::process::exit(err.exit_code());
}

#[derive(Subcommand)]
enum Commands {
    /// Print every hash route with its tab
    Routes,

    /// Print the effective configuration as TOML
    Config(ConfigArgs),

    /// Run a scripted session against the in-memory backend
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Only print the path the configuration is read from
    #[arg(long)]
    path: bool,
}

fn build_cli_command() -> Command {
    let use_color = detect_color_support();
    let mut command = Cli::command().after_long_help(render_top_level_appendix(use_color));
    command = command.color(if use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    });
    if let Some(subcommand) = command.find_subcommand_mut("demo") {
        let updated = subcommand.clone().after_long_help(render_examples(demo::EXAMPLES, use_color));
        *subcommand = updated;
    }
    command
}

fn render_examples(commands: &[&str], use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();
    let heading = stylize("Examples:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{heading}");
    for command in commands {
        let arrow = stylize(ICONS.arrow, theme.secondary, false, use_color);
        let command_text = stylize(command, theme.secondary, false, use_color);
        let _ = writeln!(buffer, "  {arrow} {command_text}");
    }
    buffer
}

fn render_top_level_appendix(use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let env_heading = stylize("Environment Variables:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{env_heading}");
    for (key, description) in ENVIRONMENT_VARIABLES {
        let key_text = stylize(key, theme.key, true, use_color);
        let value_text = stylize(description, theme.value, false, use_color);
        let _ = writeln!(buffer, "  {key_text}  {value_text}");
    }

    buffer.push('\n');
    let tip_heading = stylize("Tip:", theme.highlight, true, use_color);
    let tip_text = stylize(
        "Use 'mapzo <command> --help' to view examples for each command.",
        theme.secondary,
        false,
        use_color,
    );
    let _ = writeln!(buffer, "{tip_heading} {tip_text}");
    buffer
}

fn print_blank_line_stdout() -> io::Result<()> {
    let mut stdout = io::stdout();
    IoWrite::write_all(&mut stdout, b"\n")?;
    IoWrite::flush(&mut stdout)
}

fn print_blank_line_stderr() -> io::Result<()> {
    let mut stderr = io::stderr();
    IoWrite::write_all(&mut stderr, b"\n")?;
    IoWrite::flush(&mut stderr)
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }
    let styled = text.color(color);
    if bold { styled.bold().to_string() } else { styled.to_string() }
}

fn detect_color_support() -> bool {
    ShouldColorize::from_env().should_colorize()
}

fn help_styles() -> Styles {
    let theme = &THEME;
    Styles::styled()
        .usage(style_from_color(theme.primary).bold())
        .header(style_from_color(theme.highlight).bold())
        .literal(style_from_color(theme.secondary))
        .placeholder(style_from_color(theme.muted))
        .valid(style_from_color(theme.success))
        .invalid(style_from_color(theme.warning))
        .error(style_from_color(theme.error).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    Style::new().fg_color(Some(color_to_clap_color(color)))
}

fn color_to_clap_color(color: ThemeColor) -> ClapColor {
    match color {
        ThemeColor::Black => ClapColor::Ansi(AnsiColor::Black),
        ThemeColor::Red => ClapColor::Ansi(AnsiColor::Red),
        ThemeColor::Green => ClapColor::Ansi(AnsiColor::Green),
        ThemeColor::Yellow => ClapColor::Ansi(AnsiColor::Yellow),
        ThemeColor::Blue => ClapColor::Ansi(AnsiColor::Blue),
        ThemeColor::Magenta => ClapColor::Ansi(AnsiColor::Magenta),
        ThemeColor::Cyan => ClapColor::Ansi(AnsiColor::Cyan),
        ThemeColor::White => ClapColor::Ansi(AnsiColor::White),
        ThemeColor::BrightBlack => ClapColor::Ansi(AnsiColor::BrightBlack),
        ThemeColor::BrightRed => ClapColor::Ansi(AnsiColor::BrightRed),
        ThemeColor::BrightGreen => ClapColor::Ansi(AnsiColor::BrightGreen),
        ThemeColor::BrightYellow => ClapColor::Ansi(AnsiColor::BrightYellow),
        ThemeColor::BrightBlue => ClapColor::Ansi(AnsiColor::BrightBlue),
        ThemeColor::BrightMagenta => ClapColor::Ansi(AnsiColor::BrightMagenta),
        ThemeColor::BrightCyan => ClapColor::Ansi(AnsiColor::BrightCyan),
        ThemeColor::BrightWhite => ClapColor::Ansi(AnsiColor::BrightWhite),
        ThemeColor::TrueColor { r, g, b } => ClapColor::Rgb(RgbColor(r, g, b)),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    if cli.no_color {
        colored::control::set_override(false);
    }
    let output = OutputManager::new(GlobalOptions {
        quiet: cli.quiet,
        no_color: cli.no_color,
    });

    let _ = print_blank_line_stdout();
    match execute(cli, &output).await {
        Ok(()) => {
            let _ = print_blank_line_stdout();
        }
        Err(err) => {
            output.error(&format!("{err:#}"));
            let _ = print_blank_line_stdout();
            std::process::exit(1);
        }
    }
}

async fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    match cli.command {
        Commands::Routes => {
            output.heading("Routes");
            output.table(&output.routes_table());
        }
        Commands::Config(args) => {
            if args.path {
                output.raw(&cli.config.display().to_string());
                return Ok(());
            }
            if !cli.config.exists() {
                output.warning(&format!("{} not found, showing defaults", cli.config.display()));
            }
            let config = MapzoConfig::load(&cli.config)?;
            output.raw(&config.to_toml_string()?);
        }
        Commands::Demo(args) => {
            let config = MapzoConfig::load(&cli.config)?;
            handle_demo(args, config, output).await?;
        }
    }
    Ok(())
}
