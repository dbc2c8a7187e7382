//! bundle-plan CLI
//!
//! Entry point for the `bundle-plan` command-line tool.

use bundle_plan::plan::assemble_with;
use bundle_plan::{explain, BundlePlanError, EffectiveSettings, MergePolicy, Mode};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bundle-plan")]
#[command(about = "Assemble and inspect front-end build plans", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProjectArgs {
    /// Project root every relative path is resolved against
    #[arg(long, short = 'C', default_value = ".")]
    base_dir: PathBuf,

    /// Settings file (default: <base-dir>/bundle-plan.toml if present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the domain written to the deployment marker file
    #[arg(long)]
    domain: Option<String>,

    /// Override the output directory
    #[arg(long)]
    output_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the assembled plan as JSON
    Plan {
        /// Environment: development or production
        #[arg(long, short = 'e')]
        env: Mode,

        /// Fail instead of overriding when base and overlay disagree
        #[arg(long)]
        strict: bool,

        /// Print only the plan digest
        #[arg(long)]
        digest: bool,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Explain which rule applies to a file
    Explain {
        /// Environment: development or production
        #[arg(long, short = 'e')]
        env: Mode,

        /// Output in human-readable format instead of JSON
        #[arg(long)]
        human: bool,

        #[command(flatten)]
        project: ProjectArgs,

        /// File path, relative to the base directory
        path: PathBuf,
    },

    /// Assemble both environments and report problems
    Verify {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Plan {
            env,
            strict,
            digest,
            project,
        } => run_plan(env, strict, digest, &project),
        Commands::Explain {
            env,
            human,
            project,
            path,
        } => run_explain(env, human, &project, &path),
        Commands::Verify { project } => run_verify(&project),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn load_settings(project: &ProjectArgs) -> Result<EffectiveSettings, BundlePlanError> {
    let mut overrides = serde_json::Map::new();
    if let Some(ref domain) = project.domain {
        overrides.insert("domain".to_string(), domain.clone().into());
    }
    if let Some(ref output_dir) = project.output_dir {
        overrides.insert("output_dir".to_string(), output_dir.clone().into());
    }
    let overrides = (!overrides.is_empty()).then(|| serde_json::Value::Object(overrides));

    Ok(EffectiveSettings::build(
        &project.base_dir,
        project.config.as_deref(),
        overrides,
    )?)
}

fn run_plan(
    mode: Mode,
    strict: bool,
    digest_only: bool,
    project: &ProjectArgs,
) -> Result<(), BundlePlanError> {
    let effective = load_settings(project)?;
    let policy = if strict {
        MergePolicy::Strict
    } else {
        MergePolicy::Lenient
    };
    let (plan, _) = assemble_with(mode, &effective, policy)?;

    if digest_only {
        println!("{}", plan.digest()?);
    } else {
        println!("{}", plan.to_json()?);
    }
    Ok(())
}

fn run_explain(
    mode: Mode,
    human: bool,
    project: &ProjectArgs,
    path: &Path,
) -> Result<(), BundlePlanError> {
    let effective = load_settings(project)?;
    let (plan, _) = assemble_with(mode, &effective, MergePolicy::Lenient)?;
    let explanation = explain(&plan, path)?;

    if human {
        print!("{}", explanation.to_human());
    } else {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
    }
    Ok(())
}

fn run_verify(project: &ProjectArgs) -> Result<(), BundlePlanError> {
    let effective = load_settings(project)?;

    println!("Settings valid: {}", effective.base_dir.display());
    for source in &effective.sources {
        match source.path {
            Some(ref path) => println!("  {:?}: {}", source.origin, path),
            None => println!("  {:?}", source.origin),
        }
    }
    println!();

    for mode in [Mode::Development, Mode::Production] {
        let (plan, report) = assemble_with(mode, &effective, MergePolicy::Lenient)?;
        println!("{}:", mode);
        println!("  Output: {}", plan.output.directory.join(&plan.output.filename).display());
        println!("  Rules: {}", plan.rules.len());
        for rule in &plan.rules {
            println!("    {} -> {}", rule.key(), rule.loaders().join(" -> "));
        }
        println!("  Plugins: {}", plan.plugins.len());
        for set in plan.exclusions.iter() {
            println!("  Excluded ({}): {}", set.name(), set.patterns().join(", "));
        }
        if !report.overridden.is_empty() {
            println!("  Overridden: {}", report.overridden.join(", "));
        }
        println!("  Digest: {}", plan.digest()?);
    }
    Ok(())
}
