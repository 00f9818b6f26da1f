//! tfimport CLI entrypoint.
//!
//! This is the main entrypoint for the tfimport command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tfimport::backend::{Backend, ProcessRunner};
use tfimport::cli::{Cli, OutputFormatter};
use tfimport::config::{ConfigParser, ConfigValidator, ImportConfig, find_config_file};
use tfimport::declaration::DeclarationExtractor;
use tfimport::error::{ConfigError, Result, TfImportError};
use tfimport::planner::{ImportExecutor, ImportPlan};
use tfimport::reconciler::Reconciler;
use tfimport::resolver::{
    IdentifierResolver, IdentityProvider, RuleSet, StaticIdentity, StsIdentityProvider,
};
use tfimport::state::BackendInventoryFetcher;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Imports run one after another; a single-threaded runtime is enough.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system on stderr.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
///
/// Returns `Ok(false)` when at least one import failed.
async fn run(cli: Cli) -> Result<bool> {
    let formatter = OutputFormatter::new(cli.output);

    let terraform_dir = existing_dir(&cli.terraform_dir)?;
    let terragrunt_dir = cli.terragrunt_dir.as_deref().map(existing_dir).transpose()?;
    let config = load_config(&cli)?;

    let backend = Backend::from_config(&config.backend, &terraform_dir, terragrunt_dir.as_deref());
    let runner = ProcessRunner::new(&config.backend.shell);
    info!(
        "Using {} for {}",
        backend.binary(),
        terraform_dir.display()
    );

    // Reconcile declarations against each directory's state
    let extractor = DeclarationExtractor::from_config(&config.scan);
    let fetcher = BackendInventoryFetcher::new(&backend, &runner);
    let result = Reconciler::new(&extractor, &fetcher)
        .reconcile(&terraform_dir)
        .await?;

    if cli.list || !formatter.is_json() {
        emit(&formatter, &formatter.format_new_resources(&result, &terraform_dir))?;
    }
    if cli.list {
        return Ok(true);
    }

    // Resolve every identifier before running anything
    let rules = RuleSet::from_config(&config.resources, &config.identity);
    let identity: Box<dyn IdentityProvider> = match &config.identity.account_id {
        Some(account_id) => Box::new(StaticIdentity(account_id.clone())),
        None => Box::new(StsIdentityProvider::new(config.identity.region.clone())),
    };
    let resolved = IdentifierResolver::new(&result.table, &rules, identity.as_ref())
        .resolve_all()
        .await?;

    let plan = ImportPlan::from_resolved(&backend, &resolved);
    debug!("{}", formatter.format_plan(&plan).trim_end());

    let executor = ImportExecutor::new(&runner).with_dry_run(cli.dry_run);
    let report = if formatter.is_json() {
        executor.execute(&plan, &mut std::io::stderr().lock()).await?
    } else {
        executor.execute(&plan, &mut std::io::stdout().lock()).await?
    };

    emit(&formatter, &formatter.format_report(&report))?;

    Ok(report.success())
}

/// Loads configuration from file, `.env`, environment and CLI flags, in
/// increasing order of precedence.
fn load_config(cli: &Cli) -> Result<ImportConfig> {
    let cwd = std::env::current_dir()?;
    let config_path = cli.config.clone().or_else(|| find_config_file(&cwd));

    let base_path = config_path
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| cwd.clone(), Path::to_path_buf);
    let parser = ConfigParser::new().with_base_path(base_path);
    parser.load_dotenv()?;

    let mut config = if let Some(path) = &config_path {
        parser.load_with_env(path)?
    } else {
        debug!("No configuration file found, using defaults");
        let mut config = ImportConfig::default();
        ConfigParser::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        config
    };

    config.resources.allow_types(cli.allow_types.iter().cloned());
    if let Some(account_id) = &cli.account_id {
        config.identity.account_id = Some(account_id.clone());
    }

    let validation = ConfigValidator::new()
        .with_builtin_types(RuleSet::builtin_types())
        .validate(&config)?;
    for warning in &validation.warnings {
        warn!("{warning}");
    }

    Ok(config)
}

/// Resolves a directory argument to an absolute path.
fn existing_dir(path: &Path) -> Result<PathBuf> {
    match path.canonicalize() {
        Ok(dir) if dir.is_dir() => Ok(dir),
        _ => Err(TfImportError::Config(ConfigError::DirectoryNotFound {
            path: path.to_path_buf(),
        })),
    }
}

/// Writes machine-readable output to stdout, or text to stderr.
fn emit(formatter: &OutputFormatter, content: &str) -> Result<()> {
    if formatter.is_json() {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{content}")?;
    } else {
        eprint!("{content}");
    }
    Ok(())
}
