// # fipassoc - floating IP association driver
//
// A thin shell around fipassoc-core:
// 1. Reading configuration from flags and environment variables
// 2. Initializing logging and the runtime
// 3. Building the compute client factory and the state store
// 4. Running one lifecycle action
//
// All association logic lives in fipassoc-core.
//
// ## Configuration
//
// ### Resource
// - `FIPASSOC_NAME`: Name the association is stored under (default: default)
// - `FIPASSOC_FLOATING_IP`: Floating IP address
// - `FIPASSOC_INSTANCE_ID`: Instance to attach it to
// - `FIPASSOC_FIXED_IP`: Fixed IP on the instance (optional)
// - `OS_REGION_NAME`: Region
//
// ### Provider
// - `OS_AUTH_TOKEN`: Keystone token
// - `OS_COMPUTE_ENDPOINT`: Compute endpoint used for any region
// - `OS_COMPUTE_ENDPOINTS`: Per-region endpoints, `region=url,region=url`
// - `FIPASSOC_MODE`: `dry-run` to log mutating calls instead of sending them
//
// ### State and logging
// - `FIPASSOC_STATE_PATH`: Path to the state file
// - `FIPASSOC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export OS_REGION_NAME=RegionOne
// export OS_AUTH_TOKEN=gAAAAAB...
// export OS_COMPUTE_ENDPOINT=https://nova.example.net/v2.1
//
// fipassoc --floating-ip 203.0.113.5 --instance-id vm-123 apply
// fipassoc destroy
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fipassoc_core::config::parse_endpoint_map;
use fipassoc_core::{
    ApplyOutcome, AssociationConfig, FileStateStore, FloatingIpAssociation, LifecycleEngine,
    MemoryStateStore, ProviderConfig, RefreshOutcome, StateStore,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum FipassocExitCode {
    /// Action completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// The action failed
    RuntimeError = 2,
}

impl From<FipassocExitCode> for ExitCode {
    fn from(code: FipassocExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Attach a floating IP to a compute instance and keep it attached
#[derive(Debug, Parser)]
#[command(name = "fipassoc", version, about)]
struct Cli {
    /// Name the association is stored under
    #[arg(long, env = "FIPASSOC_NAME", default_value = "default", global = true)]
    name: String,

    /// Floating IP address
    #[arg(long, env = "FIPASSOC_FLOATING_IP", default_value = "", global = true)]
    floating_ip: String,

    /// Instance to attach the floating IP to
    #[arg(long, env = "FIPASSOC_INSTANCE_ID", default_value = "", global = true)]
    instance_id: String,

    /// Fixed IP on the instance
    #[arg(long, env = "FIPASSOC_FIXED_IP", default_value = "", global = true)]
    fixed_ip: String,

    /// Region
    #[arg(long, env = "OS_REGION_NAME", default_value = "", global = true)]
    region: String,

    /// Keystone token
    #[arg(long, env = "OS_AUTH_TOKEN", default_value = "", hide_env_values = true, global = true)]
    auth_token: String,

    /// Compute endpoint used for any region
    #[arg(long, env = "OS_COMPUTE_ENDPOINT", global = true)]
    compute_endpoint: Option<String>,

    /// Per-region compute endpoints, `region=url,region=url`
    #[arg(long, env = "OS_COMPUTE_ENDPOINTS", default_value = "", global = true)]
    compute_endpoints: String,

    /// Path to the state file
    #[arg(long, env = "FIPASSOC_STATE_PATH", default_value = "fipassoc-state.json", global = true)]
    state_path: String,

    /// Log level
    #[arg(long, env = "FIPASSOC_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Operating mode; `dry-run` logs mutating calls instead of sending them
    #[arg(long, env = "FIPASSOC_MODE", default_value = "live", global = true)]
    mode: String,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Create the association, or replace it if its fields changed
    Apply,
    /// Re-read the association and forget it if it is gone
    Refresh,
    /// Disassociate and forget the association
    Destroy,
    /// Adopt an existing association by its `<floating_ip>/<instance_id>/<fixed_ip>` id
    Import {
        /// Composite id
        id: String,
    },
    /// Print the stored record
    Show,
}

impl Cli {
    /// Validate the configuration for the selected action
    fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "FIPASSOC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        match self.mode.to_lowercase().as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "FIPASSOC_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        if self.state_path.is_empty() {
            anyhow::bail!("FIPASSOC_STATE_PATH cannot be empty");
        }

        if let Action::Show = self.action {
            return Ok(());
        }

        self.provider_config()?
            .validate()
            .context("Invalid OpenStack provider settings")?;

        if let Action::Apply = self.action {
            self.association_config()
                .validate()
                .context("Invalid association settings")?;
        }

        if let Action::Import { .. } = self.action
            && self.region.is_empty()
        {
            anyhow::bail!("OS_REGION_NAME is required to import an association");
        }

        Ok(())
    }

    fn association_config(&self) -> AssociationConfig {
        AssociationConfig::new(&self.floating_ip, &self.instance_id)
            .with_region(&self.region)
            .with_fixed_ip(&self.fixed_ip)
    }

    fn provider_config(&self) -> Result<ProviderConfig> {
        Ok(ProviderConfig::OpenStack {
            auth_token: self.auth_token.clone(),
            endpoints: parse_endpoint_map(&self.compute_endpoints)?,
            default_endpoint: self.compute_endpoint.clone(),
            dry_run: self.is_dry_run(),
        })
    }

    fn is_dry_run(&self) -> bool {
        self.mode.eq_ignore_ascii_case("dry-run")
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = cli.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return FipassocExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FipassocExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FipassocExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run(cli).await {
            error!("{:#}", e);
            FipassocExitCode::RuntimeError
        } else {
            FipassocExitCode::Success
        }
    });

    result.into()
}

/// Run the selected action
async fn run(cli: Cli) -> Result<()> {
    let store = FileStateStore::new(&cli.state_path)
        .await
        .with_context(|| format!("Failed to open state file {}", cli.state_path))?;

    if let Action::Show = cli.action {
        match store.get_record(&cli.name).await? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("No association stored under '{}'", cli.name),
        }
        return Ok(());
    }

    let store: Box<dyn StateStore> = if cli.is_dry_run() {
        Box::new(scratch_copy(&store).await?)
    } else {
        Box::new(store)
    };

    let engine = LifecycleEngine::new(FloatingIpAssociation::new(client_factory(&cli)?), store);

    match &cli.action {
        Action::Apply => {
            let outcome = engine.apply(&cli.name, &cli.association_config()).await?;
            match outcome {
                ApplyOutcome::Created { id } => info!("Created association {}", id),
                ApplyOutcome::Recreated { id } => info!("Recreated association {}", id),
                ApplyOutcome::Replaced { id, fields } => {
                    info!("Replaced association (changed: {}) -> {}", fields.join(", "), id)
                }
                ApplyOutcome::Unchanged { id } => info!("Association {} is up to date", id),
            }
        }
        Action::Refresh => match engine.refresh(&cli.name).await? {
            RefreshOutcome::Present(state) => {
                info!("Association {} is present", state.id.unwrap_or_default())
            }
            RefreshOutcome::Gone => info!("Association '{}' is gone, record dropped", cli.name),
            RefreshOutcome::Unknown => info!("No association stored under '{}'", cli.name),
        },
        Action::Destroy => {
            if engine.destroy(&cli.name).await? {
                info!("Destroyed association '{}'", cli.name);
            } else {
                info!("No association stored under '{}'", cli.name);
            }
        }
        Action::Import { id } => {
            let state = engine.import(&cli.name, id, &cli.region).await?;
            info!(
                "Imported {} -> {} as '{}'",
                state.floating_ip, state.instance_id, cli.name
            );
        }
        Action::Show => unreachable!("handled above"),
    }

    engine.state_store().flush().await?;
    Ok(())
}

/// Copy every stored record into memory so a dry run leaves the state file alone
async fn scratch_copy(store: &dyn StateStore) -> Result<MemoryStateStore> {
    let scratch = MemoryStateStore::new();
    for name in store.list_records().await? {
        if let Some(record) = store.get_record(&name).await? {
            scratch.set_record(&name, &record).await?;
        }
    }
    Ok(scratch)
}

#[cfg(feature = "openstack")]
fn client_factory(cli: &Cli) -> Result<Arc<dyn fipassoc_core::ComputeClientFactory>> {
    let factory = fipassoc_openstack::OpenStackClientFactory::from_config(&cli.provider_config()?)?;
    Ok(Arc::new(factory))
}

#[cfg(not(feature = "openstack"))]
fn client_factory(_cli: &Cli) -> Result<Arc<dyn fipassoc_core::ComputeClientFactory>> {
    anyhow::bail!("fipassoc was built without a compute provider; enable the `openstack` feature")
}
