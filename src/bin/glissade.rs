use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glissade", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a page document.
    Validate(ValidateArgs),
    /// Replay an input script against a page and print the final state.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input page JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input page JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Input script JSON (array of `{at, kind, ...}` steps).
    #[arg(long)]
    script: Option<PathBuf>,

    /// Number of ticks to run (at 60 ticks/sec).
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Scramble noise seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print a line whenever the observable state changes.
    #[arg(long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn read_page_json(path: &Path) -> anyhow::Result<glissade::Page> {
    let f = File::open(path).with_context(|| format!("open page '{}'", path.display()))?;
    let r = BufReader::new(f);
    let page: glissade::Page = serde_json::from_reader(r).with_context(|| "parse page JSON")?;
    Ok(page)
}

fn read_script_json(path: &Path) -> anyhow::Result<Vec<glissade::ScriptStep>> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let r = BufReader::new(f);
    let steps: Vec<glissade::ScriptStep> =
        serde_json::from_reader(r).with_context(|| "parse script JSON")?;
    Ok(steps)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let page = read_page_json(&args.in_path)?;
    page.validate()?;

    let sections = page.with_attr(glissade::page::attr::NAV_SECTION).len();
    eprintln!(
        "ok: {} elements, {} nav sections, content height {:.0}px",
        page.elements.len(),
        sections,
        page.content_height()
    );
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let page = read_page_json(&args.in_path)?;

    let mut steps = match &args.script {
        Some(path) => read_script_json(path)?,
        None => Vec::new(),
    };
    steps.sort_by_key(|s| s.at);

    let cfg = glissade::EngineConfig {
        seed: args.seed,
        ..glissade::EngineConfig::default()
    };
    let mut orch = glissade::Orchestrator::boot(page, cfg)?;

    let mut pending = steps.into_iter().peekable();
    let mut last_state = String::new();
    for tick in 0..args.ticks {
        while let Some(step) = pending.next_if(|s| s.at.0 <= tick) {
            orch.dispatch(step.event);
        }
        orch.tick();

        if args.trace {
            let report = orch.report();
            let state = format!(
                "scroll {:>8.1}  section {:?}  title {:?}",
                report.scroll_pos, report.active_section, report.active_title
            );
            if state != last_state {
                eprintln!("tick {tick:>5}  {state}");
                last_state = state;
            }
        }
    }

    let report = orch.report();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
