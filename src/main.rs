use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use rulepatch::{builtin, load_rule_set, snapshot, PatchRunner, RuleOutcome, RuleSet, RunReport};
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rulepatch")]
#[command(about = "Apply an ordered set of text rules to one source file", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a rule set to a file and write the result in place
    Apply {
        /// File to patch (defaults to the rule set's target)
        file: Option<PathBuf>,

        #[command(flatten)]
        source: RuleSource,

        /// Dry run - show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show a line diff of the changes
        #[arg(short, long)]
        diff: bool,

        /// Copy the file to <FILE>.orig before writing
        #[arg(long)]
        backup: bool,

        /// Refuse to write if any rule was skipped
        #[arg(long)]
        strict: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report which rules would apply, without writing
    Check {
        /// File to check (defaults to the rule set's target)
        file: Option<PathBuf>,

        #[command(flatten)]
        source: RuleSource,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in rule sets
    List,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct RuleSource {
    /// TOML rule file
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Built-in rule set name (see `rulepatch list`)
    #[arg(short, long)]
    builtin: Option<String>,
}

impl RuleSource {
    fn load(&self) -> Result<RuleSet> {
        if let Some(path) = &self.rules {
            return Ok(load_rule_set(path)?);
        }
        let name = self.builtin.as_deref().unwrap_or_default();
        builtin::lookup(name).with_context(|| {
            format!("unknown built-in rule set '{name}' (run `rulepatch list`)")
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            file,
            source,
            dry_run,
            diff,
            backup,
            strict,
            json,
        } => cmd_apply(
            file,
            &source,
            ApplyOptions {
                dry_run,
                diff,
                backup,
                strict,
                json,
            },
        ),

        Commands::Check { file, source, json } => cmd_check(file, &source, json),

        Commands::List => cmd_list(),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rulepatch={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Helper: pick the explicit file, falling back to the rule set's target.
fn resolve_target(file: Option<PathBuf>, rules: &RuleSet) -> Result<PathBuf> {
    if let Some(path) = file {
        return Ok(path);
    }
    match rules.target() {
        Some(target) => Ok(target.to_path_buf()),
        None => anyhow::bail!(
            "{}\n  rule set '{}' has no default target; pass the file to patch explicitly",
            "No file to patch.".red(),
            rules.name()
        ),
    }
}

struct ApplyOptions {
    dry_run: bool,
    diff: bool,
    backup: bool,
    strict: bool,
    json: bool,
}

fn cmd_apply(file: Option<PathBuf>, source: &RuleSource, options: ApplyOptions) -> Result<()> {
    let rules = source.load()?;
    let target = resolve_target(file, &rules)?;

    let mut report = PatchRunner::new(&rules).plan(&target)?;

    if !options.json {
        print_header(&rules, &target);
        print_records(&report);
    }

    let refused = options.strict && !report.all_applied();
    if options.dry_run {
        if !options.json {
            println!("{}", "\n[DRY RUN - file not written]".cyan());
        }
    } else if refused {
        eprintln!(
            "{} {} rule(s) skipped; not writing {} (--strict)",
            "✗".red(),
            report.skipped_count(),
            target.display()
        );
    } else {
        if options.backup {
            let backup = snapshot(&target)?;
            if !options.json {
                println!("{}", format!("Backup: {}", backup.display()).dimmed());
            }
        }
        report.write()?;
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else {
        if options.diff && report.changed() {
            display_diff(&target, &report.original, &report.buffer);
        }
        print_summary(&report);
    }

    if refused {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(file: Option<PathBuf>, source: &RuleSource, json: bool) -> Result<()> {
    let rules = source.load()?;
    let target = resolve_target(file, &rules)?;

    let report = PatchRunner::new(&rules).plan(&target)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else {
        print_header(&rules, &target);
        print_records(&report);
        print_summary(&report);
    }

    if !report.all_applied() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_list() -> Result<()> {
    for set in builtin::all() {
        println!("{}", set.name().bold());
        if let Some(description) = set.description() {
            println!("  {}", description);
        }
        if let Some(target) = set.target() {
            println!("  {}", format!("target: {}", target.display()).dimmed());
        }
        for (index, named) in set.rules().iter().enumerate() {
            println!("  {:>2}. {} [{}]", index, named.id, named.rule.kind());
        }
        println!();
    }
    Ok(())
}

fn print_header(rules: &RuleSet, target: &Path) {
    println!("Rules: {} ({} rules)", rules.name(), rules.len());
    println!("File: {}", target.display());
    println!();
}

fn print_records(report: &RunReport) {
    for record in &report.records {
        match record.outcome {
            RuleOutcome::Applied { .. } => {
                println!(
                    "{} #{} {} [{}]: {}",
                    "✓".green(),
                    record.index,
                    record.id,
                    record.kind,
                    record.outcome
                );
            }
            RuleOutcome::NoMatch => {
                println!(
                    "{} #{} {} [{}]: skipped (expected text not found)",
                    "⊘".yellow(),
                    record.index,
                    record.id,
                    record.kind
                );
                if let Some(hint) = &record.hint {
                    println!(
                        "    {}",
                        format!(
                            "closest match at line {} ({:.0}% similar), first difference at line {}:",
                            hint.line,
                            hint.similarity * 100.0,
                            hint.divergent_line
                        )
                        .yellow()
                    );
                    println!("      expected: {}", hint.expected.trim_end().dimmed());
                    println!("      found:    {}", hint.found.trim_end().dimmed());
                }
            }
        }
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", report.applied_count()).green());
    println!("  {} skipped", format!("{}", report.skipped_count()).yellow());
    if report.written {
        println!("  {}", format!("wrote {}", report.file.display()).green());
    } else {
        println!("  {}", "not written".dimmed());
    }
    if report.skipped_count() > 0 {
        println!(
            "{}",
            "Some rules were skipped: review the file manually before relying on it".yellow()
        );
    }
}

/// Helper: Show line diff between original and patched content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
