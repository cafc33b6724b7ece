//! catalogctl - ArgoCD catalog blueprint and changelog tooling.

use anyhow::{bail, Context};
use argocd_catalog_blueprints::{
    argocd_blueprints, load_file, resolve_order, to_json, validate_entity, validate_with,
    Blueprint, Entity, RegistrationPlan,
};
use argocd_catalog_changelog::{
    category_warnings, insert_entry, next_version, parse_file, validate, write_file, Bump,
    ChangelogEntry,
};
use argocd_catalog_common::{hash, CatalogConfig};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use semver::Version;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "catalogctl")]
#[command(
    author,
    version,
    about = "Validate ArgoCD catalog blueprints and maintain the integration changelog"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with blueprint documents
    Blueprints {
        #[command(subcommand)]
        command: BlueprintCommands,
    },

    /// Work with the towncrier changelog
    Changelog {
        #[command(subcommand)]
        command: ChangelogCommands,
    },
}

#[derive(Subcommand)]
enum BlueprintCommands {
    /// Load and validate a blueprint document
    Validate {
        /// Blueprint document (JSON or YAML); defaults to the bundled ArgoCD blueprints
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the registration order
    Order {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Re-serialize the loaded document as JSON
    Render {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Check an entity against its blueprint
    CheckEntity {
        /// Blueprint identifier
        #[arg(long)]
        blueprint: String,

        /// Entity JSON file
        #[arg(long)]
        entity: PathBuf,

        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ChangelogCommands {
    /// Parse the changelog and check entry ordering
    Check {
        #[arg(long, default_value = "CHANGELOG.md")]
        file: PathBuf,
    },

    /// Add a release entry after the start marker
    Add {
        #[arg(long, default_value = "CHANGELOG.md")]
        file: PathBuf,

        /// Category heading, e.g. Improvements
        #[arg(long)]
        category: String,

        /// Release note (repeatable)
        #[arg(long = "note", required = true)]
        notes: Vec<String>,

        /// Explicit version; defaults to bumping the latest entry
        #[arg(long)]
        version: Option<Version>,

        /// Release date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Project name in the heading
        #[arg(long)]
        project: Option<String>,

        /// Version component to bump (patch, minor, major)
        #[arg(long, default_value = "patch")]
        bump: Bump,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = CatalogConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Blueprints { command } => run_blueprints(command, &config, cli.format),
        Commands::Changelog { command } => run_changelog(command, &config, cli.format),
    }
}

fn load_blueprints(file: Option<&Path>) -> anyhow::Result<Vec<Blueprint>> {
    match file {
        Some(path) => {
            info!("Loading blueprints from {:?}", path);
            load_file(path).with_context(|| format!("Failed to load {}", path.display()))
        }
        None => argocd_blueprints().context("Failed to load bundled blueprints"),
    }
}

fn run_blueprints(
    command: BlueprintCommands,
    config: &CatalogConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        BlueprintCommands::Validate { file } => {
            let blueprints = load_blueprints(file.as_deref())?;
            let fingerprint = hash::fingerprint(&blueprints)?;

            match validate_with(&blueprints, &config.blueprints) {
                Ok(report) => {
                    if format == OutputFormat::Json {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&json!({
                                "valid": true,
                                "report": report,
                                "fingerprint": fingerprint,
                            }))?
                        );
                    } else {
                        println!(
                            "Blueprints are valid ({} blueprints, {} relations)",
                            report.blueprints, report.relations
                        );
                        println!("Fingerprint: {}", fingerprint);
                        for warning in &report.warnings {
                            println!("  warning: {}", warning);
                        }
                    }
                }
                Err(err) => {
                    if format == OutputFormat::Json {
                        let violations: Vec<String> =
                            err.violations.iter().map(|v| v.to_string()).collect();
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&json!({
                                "valid": false,
                                "violations": violations,
                                "fingerprint": fingerprint,
                            }))?
                        );
                    } else {
                        println!("Blueprints have errors:");
                        for violation in &err.violations {
                            println!("  - {}", violation);
                        }
                    }
                    std::process::exit(1);
                }
            }
        }

        BlueprintCommands::Order { file } => {
            let blueprints = load_blueprints(file.as_deref())?;
            let plan = resolve_order(&blueprints);
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
        }

        BlueprintCommands::Render { file } => {
            let blueprints = load_blueprints(file.as_deref())?;
            println!("{}", to_json(&blueprints)?);
        }

        BlueprintCommands::CheckEntity {
            blueprint,
            entity,
            file,
        } => {
            let blueprints = load_blueprints(file.as_deref())?;
            let Some(target) = blueprints.iter().find(|b| b.identifier == blueprint) else {
                bail!("Blueprint `{}` is not declared", blueprint);
            };

            let content = argocd_catalog_common::error::read_to_string(&entity)?;
            let parsed: Entity = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse entity {}", entity.display()))?;

            match validate_entity(target, &parsed) {
                Ok(()) => {
                    if format == OutputFormat::Json {
                        println!("{}", json!({"valid": true, "entity": parsed.identifier}));
                    } else {
                        println!(
                            "Entity `{}` matches {}",
                            parsed.identifier,
                            target.display_name()
                        );
                    }
                }
                Err(err) => {
                    if format == OutputFormat::Json {
                        let violations: Vec<String> =
                            err.violations.iter().map(|v| v.to_string()).collect();
                        println!(
                            "{}",
                            json!({"valid": false, "entity": err.entity, "violations": violations})
                        );
                    } else {
                        println!("Entity `{}` has errors:", err.entity);
                        for violation in &err.violations {
                            println!("  - {}", violation);
                        }
                    }
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn print_plan(plan: &RegistrationPlan) {
    println!("Registration order:");
    for (i, identifier) in plan.order().iter().enumerate() {
        println!("  {}. {}", i + 1, identifier);
    }
    if !plan.deferred.is_empty() {
        println!("Deferred relations:");
        for deferred in &plan.deferred {
            println!(
                "  {}.{} -> {}",
                deferred.blueprint, deferred.name, deferred.relation.target
            );
        }
    }
    for cycle in &plan.cycles {
        println!("Cycle: {}", cycle.join(" <-> "));
    }
}

fn run_changelog(
    command: ChangelogCommands,
    config: &CatalogConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let settings = &config.changelog;

    match command {
        ChangelogCommands::Check { file } => {
            let changelog = parse_file(&file, settings)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let warnings = category_warnings(&changelog.entries, settings);
            let result = validate(&changelog.entries);

            if format == OutputFormat::Json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "valid": result.is_ok(),
                        "entries": changelog.entries.len(),
                        "latest": changelog.head().map(|e| e.version.to_string()),
                        "error": result.as_ref().err().map(|e| e.to_string()),
                        "warnings": warnings,
                    }))?
                );
            } else {
                match &result {
                    Ok(()) => println!(
                        "Changelog is valid ({} entries)",
                        changelog.entries.len()
                    ),
                    Err(err) => println!("Changelog has errors:\n  - {}", err),
                }
                for warning in &warnings {
                    println!("  warning: {}", warning);
                }
            }

            if result.is_err() {
                std::process::exit(1);
            }
        }

        ChangelogCommands::Add {
            file,
            category,
            notes,
            version,
            date,
            project,
            bump,
        } => {
            let mut changelog = parse_file(&file, settings)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            let version = match (version, changelog.head()) {
                (Some(version), _) => version,
                (None, Some(head)) => next_version(&head.version, bump),
                (None, None) => Version::new(0, 1, 0),
            };
            if let Some(existing) = changelog.find(&version) {
                bail!(
                    "{} already has a release {} ({})",
                    file.display(),
                    existing.version,
                    existing.date
                );
            }
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let project = project.unwrap_or_else(|| settings.project.clone());

            if !settings.is_known_category(&category) {
                warn!("Category `{}` is not a known towncrier category", category);
            }

            let mut entry = ChangelogEntry::new(project, version, date);
            for note in notes {
                entry.add_note(category.as_str(), note);
            }
            let heading = entry.heading();

            insert_entry(&mut changelog, entry)
                .with_context(|| format!("Cannot add {} to {}", heading, file.display()))?;
            write_file(&file, &changelog)
                .with_context(|| format!("Failed to write {}", file.display()))?;

            if format == OutputFormat::Json {
                println!("{}", json!({"added": heading, "file": file.display().to_string()}));
            } else {
                println!("Added {} to {}", heading, file.display());
            }
        }
    }

    Ok(())
}
