use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use syncschema_core::{Config, Report, Severity, CONFIG_FILE_NAME};
use syncschema_manifest::{
    find_manifests, verify_manifests, ManifestWithPath, SyncManifest, VerifyOptions,
    MANIFEST_FILE_NAME,
};

/// syncschema - Public and consumer schema contracts for data synchronization
#[derive(Parser)]
#[command(name = "syncschema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: syncschema.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify manifests and the references between them
    Verify {
        /// Manifest files or directories (default: manifest_paths from config)
        paths: Vec<PathBuf>,

        /// Treat references to manifests outside the set as errors
        #[arg(long)]
        check_external_references: bool,

        /// Output file for report.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },

    /// Show the schemas defined in a manifest
    Show {
        /// Manifest file or the directory containing it
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Create an empty manifest
    Init {
        /// Manifest slug (hyphens and alphanumerics)
        #[arg(short, long)]
        slug: String,

        /// Directory to create the manifest in
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        Config::from_file(Path::new(CONFIG_FILE_NAME))?
    } else {
        tracing::debug!("no config file found, using defaults");
        Config::default()
    };

    match cli.command {
        Commands::Verify { paths, check_external_references, output, markdown } => {
            let mut options = VerifyOptions::from(&config);
            options.check_external_references |= check_external_references;
            verify_command(&config, &paths, options, output.as_deref(), markdown.as_deref())
        }
        Commands::Show { path } => show_command(&path),
        Commands::Init { slug, path } => init_command(&slug, &path),
    }
}

/// Verify command - load manifests, cross-check them and report
fn verify_command(
    config: &Config,
    paths: &[PathBuf],
    options: VerifyOptions,
    output: Option<&Path>,
    markdown: Option<&Path>,
) -> Result<()> {
    let roots = if paths.is_empty() {
        config.resolved_manifest_paths()
    } else {
        paths.to_vec()
    };

    let mut manifest_files = Vec::new();
    for root in &roots {
        manifest_files.extend(find_manifests(root)?);
    }
    manifest_files.sort();
    manifest_files.dedup();

    if manifest_files.is_empty() {
        return Err(anyhow::anyhow!(
            "No {} found under {}",
            MANIFEST_FILE_NAME,
            roots.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
        ));
    }

    let mut manifests = Vec::with_capacity(manifest_files.len());
    for path in &manifest_files {
        tracing::debug!(path = %path.display(), "loading manifest");
        let manifest = ManifestWithPath::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        manifests.push(manifest);
    }

    let mut result = verify_manifests(&manifests, &options);
    config.severity.apply(&mut result.diagnostics);
    result.refresh();

    let report = Report::from_diagnostics(result.diagnostics)
        .with_external_references(result.external_references)
        .with_manifests_checked(manifests.len());

    if let Some(output) = output {
        report.save_to_file(output)?;
        tracing::info!(path = %output.display(), "report saved");
    }

    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))?;
        tracing::info!(path = %md_path.display(), "markdown report saved");
    }

    print_report_summary(&report);

    // Exit with error code if there are errors
    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Show command - list the schemas of one manifest
fn show_command(path: &Path) -> Result<()> {
    let file = if path.is_dir() {
        path.join(MANIFEST_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    let manifest = SyncManifest::from_file(&file)?;

    println!("{} {}", "Manifest:".bold(), manifest.slug.green());
    println!();

    if !manifest.data_stores.is_empty() {
        println!("{}", "Data stores:".bold());
        for store in &manifest.data_stores {
            match &store.config {
                Some(config) => println!("  {} ({})", store.connection_slug.cyan(), config.connection_type),
                None => println!("  {}", store.connection_slug.cyan()),
            }
        }
        println!();
    }

    println!("{}", "Public schemas:".bold());
    if manifest.public_schemas.is_empty() {
        println!("  (none)");
    }
    for schema in &manifest.public_schemas {
        println!(
            "  {} v{} from {}",
            schema.name.cyan(),
            schema.version,
            schema.source.data_store_slug
        );
        println!("    fields: {}", schema.output_schema.property_names().join(", "));
        for t in &schema.config.transformations {
            println!("    {:<6} {}", t.operation.to_string().yellow(), t.table);
        }
    }
    println!();

    println!("{}", "Consumer schemas:".bold());
    if manifest.consumer_schemas.is_empty() {
        println!("  (none)");
    }
    for schema in &manifest.consumer_schemas {
        println!(
            "  {} <- {}/{} -> {}",
            schema.name.cyan(),
            schema.source_manifest_slug,
            schema.public_schema,
            schema.config.destination_data_store_slug
        );
        if schema.config.delete_sql.is_some() {
            println!("    handles deletes");
        }
    }

    Ok(())
}

/// Init command - write an empty manifest
fn init_command(slug: &str, dir: &Path) -> Result<()> {
    let path = dir.join(MANIFEST_FILE_NAME);
    if path.exists() {
        return Err(anyhow::anyhow!("Manifest already exists at {}", path.display()));
    }

    let manifest = SyncManifest::new(slug);
    manifest.validate()?;

    std::fs::create_dir_all(dir)?;
    manifest.save_to_file(&path)?;

    println!("{} {}", "Created".green(), path.display());
    Ok(())
}

/// Print report summary to console
fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Manifest Verification Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Manifests checked: {}", report.summary.manifests_checked);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Total diagnostics: {}", report.summary.total);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

            if let Some(loc) = &diag.location {
                println!("    at {}", loc);
            }

            if let Some(hint) = &diag.hint {
                println!("    hint: {}", hint.message);
                if let Some(suggestions) = &hint.suggestions {
                    println!("          {}", suggestions);
                }
            }
        }
    }

    if !report.external_references.is_empty() {
        println!();
        println!("{}", "External references:".bold());
        for reference in &report.external_references {
            println!(
                "  {}/{} (from {})",
                reference.manifest_slug, reference.public_schema, reference.referenced_by.manifest_slug
            );
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report
fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Manifest Verification Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Manifests checked: {}\n", report.summary.manifests_checked));
    md.push_str(&format!("- Total diagnostics: {}\n", report.summary.total));
    md.push_str(&format!("- Errors: {}\n", report.summary.errors));
    md.push_str(&format!("- Warnings: {}\n", report.summary.warnings));
    md.push_str(&format!("- External references: {}\n", report.summary.external_references));
    md.push('\n');

    if report.diagnostics.is_empty() {
        md.push_str("✅ **No issues found!**\n");
    } else {
        md.push_str("## Diagnostics\n\n");

        for diag in &report.diagnostics {
            let severity_emoji = match diag.severity {
                Severity::Error => "❌",
                Severity::Warn => "⚠️",
                Severity::Info => "ℹ️",
            };

            md.push_str(&format!("### {} {} - {}\n\n", severity_emoji, diag.severity, diag.code));
            md.push_str(&format!("{}\n\n", diag.message));

            if let Some(loc) = &diag.location {
                md.push_str(&format!("**Location:** {}\n\n", loc));
            }

            if let Some(hint) = &diag.hint {
                md.push_str(&format!("**Hint:** {}\n\n", hint.message));
            }
        }
    }

    if !report.external_references.is_empty() {
        md.push_str("\n## External References\n\n");
        for reference in &report.external_references {
            md.push_str(&format!(
                "- `{}` / `{}` referenced by `{}`\n",
                reference.manifest_slug, reference.public_schema, reference.referenced_by.manifest_slug
            ));
        }
    }

    md
}
