use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use surgical_edit::config::{
    apply_plan, discover_plans, load_from_path, ApplyMode, EditOutcome, EditReport, Summary,
};
use surgical_edit::logging::init_logging;
use surgical_edit::Recipe;

#[derive(Parser)]
#[command(name = "surgical-edit")]
#[command(about = "Format-preserving structural edits for TOML and YAML files", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter (e.g. `debug`, `surgical_edit=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply edit plans to a repository
    Apply {
        #[command(flatten)]
        target: PlanArgs,

        /// Compute the edits without writing any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show a unified diff of every applied edit
        #[arg(short, long)]
        diff: bool,
    },

    /// Report what `apply` would change; exits 1 if anything would change or fail
    Check {
        #[command(flatten)]
        target: PlanArgs,
    },

    /// List the available edit recipes
    Recipes,
}

#[derive(Args)]
struct PlanArgs {
    /// Repository root (defaults to the current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Plan file, or directory of plan files (defaults to <root>/edits)
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// Print one JSON object per edit instead of human-readable output
    #[arg(long)]
    json: bool,
}

impl PlanArgs {
    fn root(&self) -> Result<PathBuf> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => env::current_dir().context("cannot determine current directory")?,
        };
        root.canonicalize()
            .with_context(|| format!("repository root {} does not exist", root.display()))
    }

    fn plan_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let location = self.plan.clone().unwrap_or_else(|| root.join("edits"));
        Ok(discover_plans(location)?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    init_logging(cli.log_level.as_deref(), cli.no_color);

    let failed = match cli.command {
        Commands::Apply {
            target,
            dry_run,
            diff,
        } => {
            let mode = if dry_run {
                ApplyMode::DryRun
            } else {
                ApplyMode::Write
            };
            let summary = run_plans(&target, mode, diff)?;
            summary.failed > 0
        }
        Commands::Check { target } => {
            let summary = run_plans(&target, ApplyMode::DryRun, false)?;
            summary.failed > 0 || summary.applied > 0
        }
        Commands::Recipes => {
            cmd_recipes();
            false
        }
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_plans(args: &PlanArgs, mode: ApplyMode, show_diff: bool) -> Result<Summary> {
    let root = args.root()?;
    let plan_files = args.plan_files(&root)?;

    if !args.json {
        println!("Repository: {}", root.display());
        if mode == ApplyMode::DryRun {
            println!("{}", "[DRY RUN - no files are written]".cyan());
        }
        println!();
    }

    let mut all_reports = Vec::new();
    for plan_file in plan_files {
        let plan = load_from_path(&plan_file)?;
        let reports = apply_plan(&plan, &root, mode)
            .with_context(|| format!("cannot apply plan {}", plan_file.display()))?;

        if args.json {
            for report in &reports {
                println!("{}", serde_json::to_string(report)?);
            }
        } else {
            let name = if plan.meta.name.is_empty() {
                plan_file.display().to_string()
            } else {
                plan.meta.name.clone()
            };
            println!("{} {}", "Plan".bold(), name);
            for report in &reports {
                print_report(report, mode, show_diff);
            }
            println!();
        }
        all_reports.extend(reports);
    }

    let summary = Summary::of(&all_reports);
    if !args.json {
        print_summary(&summary, mode);
    }
    Ok(summary)
}

fn print_report(report: &EditReport, mode: ApplyMode, show_diff: bool) {
    let file = report.file.display();
    match &report.outcome {
        EditOutcome::Applied {
            changes,
            before,
            after,
        } => {
            let verb = match mode {
                ApplyMode::Write => "Applied to",
                ApplyMode::DryRun => "Would apply to",
            };
            println!("{} {}: {} {}", "✓".green(), report.id, verb, file);
            for change in changes {
                println!(
                    "    line {}: {} -> {}",
                    change.line,
                    change.before.red(),
                    change.after.green()
                );
            }
            if show_diff {
                display_diff(&report.file, before, after);
            }
        }
        EditOutcome::AlreadyPatched => {
            println!("{} {}: Already patched in {}", "⊙".yellow(), report.id, file);
        }
        EditOutcome::NotApplicable { reason } => {
            println!(
                "{} {}: Not applicable to {} ({})",
                "⊘".cyan(),
                report.id,
                file,
                reason.dimmed()
            );
        }
        EditOutcome::Failed { reason } => {
            eprintln!("{} {}: Failed - {}", "✗".red(), report.id, reason);
            eprintln!("  File: {}", file);
        }
    }
}

fn print_summary(summary: &Summary, mode: ApplyMode) {
    let applied = match mode {
        ApplyMode::Write => "applied",
        ApplyMode::DryRun => "would apply",
    };
    println!("{}", "Summary:".bold());
    println!("  {} {}", summary.applied.to_string().green(), applied);
    println!(
        "  {} already patched",
        summary.already_patched.to_string().yellow()
    );
    println!(
        "  {} not applicable",
        summary.not_applicable.to_string().cyan()
    );
    println!("  {} failed", summary.failed.to_string().red());
}

/// Show a unified line diff between two versions of a document.
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for hunk in diff.unified_diff().context_radius(2).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{change}").red(),
                ChangeTag::Insert => format!("+{change}").green(),
                ChangeTag::Equal => format!(" {change}").normal(),
            };
            print!("{line}");
            if change.missing_newline() {
                println!();
            }
        }
    }
}

fn cmd_recipes() {
    println!("{}", "Recipes:".bold());
    for recipe in Recipe::ALL {
        println!(
            "  {} ({}): {}",
            recipe.id().green(),
            recipe.grammar(),
            recipe.description()
        );
        for line in recipe.pattern().lines() {
            println!("      {}", line.trim_end().dimmed());
        }
    }
}
