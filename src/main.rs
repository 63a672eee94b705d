use clap::{ArgAction, Parser};
use catmd::files::OsFiles;
use catmd::{assemble, config, links, output};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "catmd")]
#[command(about = "Concatenate linked markdown documents into one")]
#[command(long_about = "\
Concatenate linked markdown documents into one

Starting from ROOT, internal links are followed depth-first and every
reachable document is written once, in the order it is first reached.

  index.md ──▶ guide.md ──▶ setup.md      output: index, guide, setup, faq
      └──────▶ faq.md

Each document:
  Headers:    opens with exactly one level-1 header; '# filename' is added
              (and existing headers demoted) when needed
  Footnotes:  'Text[^1].' with '[^1]: See more.' becomes 'Text (See more).'
  Links:      links to included documents point at their section anchor;
              everything else is left as written

Only files inside the scope directory (default: ROOT's directory) are
followed. Run 'catmd --gen-config' to generate a documented catmd.toml.")]
#[command(version)]
struct Cli {
    /// Root markdown document
    #[arg(required_unless_present = "gen_config")]
    root: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only follow links to files inside this directory
    #[arg(long)]
    scope: Option<PathBuf>,

    /// Configuration file (default: catmd.toml in the scope directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the traversal plan and unreachable documents without writing
    #[arg(long)]
    check: bool,

    /// With --check, print the plan as JSON
    #[arg(long, requires = "check")]
    json: bool,

    /// Print a stock catmd.toml with all options documented
    #[arg(long)]
    gen_config: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }
    let Some(root) = cli.root.as_deref() else {
        return Err("missing root document".into());
    };

    let config = load_config(root, &cli)?;
    let scope = cli.scope.as_deref();

    if cli.check {
        let plan = assemble::plan(root, scope, &config, &OsFiles)?;
        if cli.json {
            println!("{}", output::plan_json(&plan)?);
        } else {
            output::print_plan(&plan);
        }
        return Ok(());
    }

    // Traverse before opening the output so a failed run leaves no file behind.
    let (scope, order) = assemble::prepare(root, scope, &config, &OsFiles)?;
    match &cli.output {
        Some(path) => {
            let mut sink = BufWriter::new(File::create(path)?);
            let report = assemble::assemble(order, &scope, &config, &mut sink)?;
            output::print_run_report(&report, path);
        }
        None => {
            let mut sink = io::stdout().lock();
            assemble::assemble(order, &scope, &config, &mut sink)?;
        }
    }

    Ok(())
}

/// Explicit `--config`, or `catmd.toml` in the scope directory.
fn load_config(root: &Path, cli: &Cli) -> Result<config::Config, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.config {
        return Ok(config::load_config_file(path)?);
    }
    let scope = links::determine_scope(root, cli.scope.as_deref(), &OsFiles)?;
    Ok(config::load_config(scope.path())?)
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
