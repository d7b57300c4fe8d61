//! CLI command definitions and dispatch.

mod schedule;
mod update;

use std::path::PathBuf;
use std::sync::Arc;

use autoupdate_core::config::{LogFormat, LogLevel, UpdaterConfig, WorkloadKind};
use autoupdate_core::error::{Result, UpdateError};
use autoupdate_runtime::{
    KubeWorkloadSource, OciTagRegistry, Reconciler, SweepOptions, TagResolver, UpdateDecider,
    FIELD_MANAGER,
};
use clap::{Args, Parser, Subcommand};

/// kube-autoupdate - keep floating image tags of Kubernetes workloads current.
#[derive(Parser, Debug)]
#[command(name = "kube-autoupdate", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by all commands.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log output format (text, json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Label selector of eligible workloads
    #[arg(long, global = true, env = "AUTOUPDATE_LABEL_SELECTOR")]
    pub label_selector: Option<String>,

    /// Annotation holding the update policy
    #[arg(long, global = true, env = "AUTOUPDATE_CONFIG_ANNOTATION")]
    pub annotation: Option<String>,

    /// Workload kind to sweep (repeatable: deployment, statefulset, daemonset)
    #[arg(long = "kind", global = true)]
    pub kinds: Vec<WorkloadKind>,

    /// Compute patches without applying them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// JSON file with registry credentials
    #[arg(long, global = true)]
    pub credentials_file: Option<PathBuf>,
}

impl GlobalArgs {
    fn apply(&self, config: &mut UpdaterConfig) {
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(selector) = &self.label_selector {
            config.label_selector = selector.clone();
        }
        if let Some(annotation) = &self.annotation {
            config.config_annotation = annotation.clone();
        }
        if !self.kinds.is_empty() {
            config.kinds = self.kinds.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if let Some(path) = &self.credentials_file {
            config.registry.credentials_file = Some(path.clone());
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single sweep and exit
    Update,
    /// Sweep repeatedly on a fixed delay until terminated
    Schedule(schedule::ScheduleArgs),
}

impl Cli {
    /// Resolve the effective configuration.
    ///
    /// Precedence, lowest first: defaults, `--config` file, environment, flags.
    pub fn load_config(&self) -> Result<UpdaterConfig> {
        let mut config = match &self.global.config {
            Some(path) => UpdaterConfig::from_file(path)?,
            None => UpdaterConfig::default(),
        };

        self.global.apply(&mut config);
        if let Command::Schedule(args) = &self.command {
            args.apply(&mut config);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Connect to the cluster and wire up the reconciliation engine.
pub(crate) async fn build_reconciler(config: &UpdaterConfig) -> Result<Reconciler> {
    let client = kube::Client::try_default().await.map_err(|e| {
        UpdateError::StartupError(format!("Unable to configure Kubernetes client: {}", e))
    })?;

    let source = Arc::new(KubeWorkloadSource::new(client, FIELD_MANAGER));
    let registry = Arc::new(OciTagRegistry::new(&config.registry));
    let decider = UpdateDecider::new(
        TagResolver::new(registry),
        config.config_annotation.clone(),
    );

    Ok(Reconciler::new(
        source,
        decider,
        SweepOptions::from_config(config),
    ))
}

/// Dispatch a parsed command to its handler.
pub async fn dispatch(command: Command, config: UpdaterConfig) -> Result<()> {
    match command {
        Command::Update => update::execute(config).await,
        Command::Schedule(_) => schedule::execute(config).await,
    }
}
