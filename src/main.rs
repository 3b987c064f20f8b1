//! dop CLI - DigitalOcean from the command line
//!
//! Run `dop --help` for usage information.

use clap::{Parser, Subcommand, ValueEnum};
use dop::client::{
    Client, Domain, Droplet, DropletAction, Event, Image, ImageFilter, NewDroplet, Record,
    RecordParams, Region, Size, SshKey,
};
use dop::config::{Config, LogFormat};
use dop::credentials::{CredentialStore, TerminalPrompter};
use dop::CredentialRecord;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dop", about = "DigitalOcean API client", version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Manage the encrypted credential file
    Credentials {
        #[command(subcommand)]
        command: CredentialCommands,
    },

    /// Manage droplets
    Droplets {
        #[command(subcommand)]
        command: DropletCommands,
    },

    /// List regions
    Regions,

    /// List droplet sizes
    Sizes,

    /// Manage images
    Images {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Manage SSH keys
    #[command(name = "ssh-keys")]
    SshKeys {
        #[command(subcommand)]
        command: SshKeyCommands,
    },

    /// Manage DNS domains
    Domains {
        #[command(subcommand)]
        command: DomainCommands,
    },

    /// Manage DNS records of a domain
    Records {
        #[command(subcommand)]
        command: RecordCommands,
    },

    /// Show the progress of an event
    Event {
        id: u64,
    },
}

#[derive(Subcommand)]
enum CredentialCommands {
    /// Enter client id and API key and store them encrypted
    Setup,
    /// Decrypt the stored credentials to verify the password
    Check,
    /// Print the credential file location
    Path,
}

#[derive(Subcommand)]
enum DropletCommands {
    /// List active droplets
    List,
    /// Show one droplet
    Show { id: u64 },
    /// Create a droplet
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        size: u64,
        #[arg(long)]
        image: u64,
        #[arg(long)]
        region: u64,
        /// SSH key ids to install (repeatable)
        #[arg(long = "ssh-key")]
        ssh_keys: Vec<u64>,
        #[arg(long)]
        private_networking: bool,
        #[arg(long)]
        backups: bool,
    },
    /// Run a power or backup operation
    Action { id: u64, action: ActionArg },
    /// Resize to another size
    Resize { id: u64, size: u64 },
    /// Take a snapshot
    Snapshot {
        id: u64,
        #[arg(long)]
        name: Option<String>,
    },
    /// Restore from one of the droplet's images
    Restore { id: u64, image: u64 },
    /// Reinstall from an image
    Rebuild { id: u64, image: u64 },
    /// Rename a droplet
    Rename { id: u64, name: String },
    /// Destroy a droplet
    Destroy {
        id: u64,
        /// Overwrite the disk before releasing it
        #[arg(long)]
        scrub: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Reboot,
    PowerCycle,
    Shutdown,
    PowerOff,
    PowerOn,
    PasswordReset,
    EnableBackups,
    DisableBackups,
}

impl From<ActionArg> for DropletAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Reboot => DropletAction::Reboot,
            ActionArg::PowerCycle => DropletAction::PowerCycle,
            ActionArg::Shutdown => DropletAction::Shutdown,
            ActionArg::PowerOff => DropletAction::PowerOff,
            ActionArg::PowerOn => DropletAction::PowerOn,
            ActionArg::PasswordReset => DropletAction::PasswordReset,
            ActionArg::EnableBackups => DropletAction::EnableBackups,
            ActionArg::DisableBackups => DropletAction::DisableBackups,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Global,
    Mine,
}

#[derive(Subcommand)]
enum ImageCommands {
    /// List images
    List {
        #[arg(short, long, default_value = "all")]
        filter: FilterArg,
    },
    /// Show one image
    Show { id: u64 },
    /// Destroy one of your images
    Destroy { id: u64 },
    /// Copy an image to another region
    Transfer { id: u64, region: u64 },
}

#[derive(Subcommand)]
enum SshKeyCommands {
    /// List SSH keys
    List,
    /// Show one SSH key
    Show { id: u64 },
    /// Register a public key
    Add { name: String, public_key: String },
    /// Replace a key's public key
    Edit { id: u64, public_key: String },
    /// Delete a key
    Destroy { id: u64 },
}

#[derive(Subcommand)]
enum DomainCommands {
    /// List domains
    List,
    /// Show a domain by id or name
    Show { domain: String },
    /// Create a domain pointing at an IP address
    Create { name: String, ip_address: String },
    /// Delete a domain
    Destroy { domain: String },
}

#[derive(clap::Args)]
struct RecordArgs {
    /// A, CNAME, NS, TXT, MX or SRV
    #[arg(long = "type")]
    record_type: String,
    #[arg(long)]
    data: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    priority: Option<u64>,
    #[arg(long)]
    port: Option<u64>,
    #[arg(long)]
    weight: Option<u64>,
}

impl From<RecordArgs> for RecordParams {
    fn from(args: RecordArgs) -> Self {
        Self {
            record_type: args.record_type,
            data: args.data,
            name: args.name,
            priority: args.priority,
            port: args.port,
            weight: args.weight,
        }
    }
}

#[derive(Subcommand)]
enum RecordCommands {
    /// List a domain's records
    List { domain: String },
    /// Show one record
    Show { domain: String, id: u64 },
    /// Create a record
    Create {
        domain: String,
        #[command(flatten)]
        record: RecordArgs,
    },
    /// Edit a record
    Edit {
        domain: String,
        id: u64,
        #[command(flatten)]
        record: RecordArgs,
    },
    /// Delete a record
    Destroy { domain: String, id: u64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let (config, config_error) = if cli.config.is_some() {
        (Config::load(&config_path).await?, None)
    } else {
        Config::load_or_default(&config_path).await
    };

    init_logging(&config, cli.verbose);
    if let Some(e) = config_error {
        warn!(path = %config_path.display(), error = %e, "Invalid configuration, using defaults");
    }
    debug!(path = %config_path.display(), "Configuration loaded");

    let out = Output { json: cli.json };

    match cli.command {
        Commands::Init { force } => init_config(config_path, force).await?,
        Commands::Credentials { command } => run_credentials(&config, command)?,
        Commands::Droplets { command } => {
            let client = connect(&config)?;
            run_droplets(&client, &out, command).await?;
        }
        Commands::Regions => {
            let client = connect(&config)?;
            out.list(&client.regions().await?)?;
        }
        Commands::Sizes => {
            let client = connect(&config)?;
            out.list(&client.sizes().await?)?;
        }
        Commands::Images { command } => {
            let client = connect(&config)?;
            run_images(&client, &out, command).await?;
        }
        Commands::SshKeys { command } => {
            let client = connect(&config)?;
            run_ssh_keys(&client, &out, command).await?;
        }
        Commands::Domains { command } => {
            let client = connect(&config)?;
            run_domains(&client, &out, command).await?;
        }
        Commands::Records { command } => {
            let client = connect(&config)?;
            run_records(&client, &out, command).await?;
        }
        Commands::Event { id } => {
            let client = connect(&config)?;
            out.one(&client.event(id).await?)?;
        }
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(io::stderr))
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init(),
    }
}

fn credential_store(config: &Config) -> CredentialStore {
    CredentialStore::new(&config.credentials.file_path)
        .with_max_attempts(config.credentials.max_attempts)
}

/// Decrypt the stored credentials, or ask for them and store them on first use
fn obtain_credentials(config: &Config) -> Result<CredentialRecord, Box<dyn std::error::Error>> {
    let mut store = credential_store(config);
    let mut prompter = TerminalPrompter::new();

    if store.available() {
        store.load(&mut prompter)?;
    } else {
        info!(path = %store.path().display(), "No credential file, asking for credentials");
        store.input(&mut prompter)?;
        store.save(&mut prompter)?;
    }

    Ok(store.get()?.clone())
}

fn connect(config: &Config) -> Result<Client, Box<dyn std::error::Error>> {
    let credentials = obtain_credentials(config)?;
    Ok(Client::with_config(credentials, &config.api)?)
}

fn run_credentials(config: &Config, command: CredentialCommands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        CredentialCommands::Setup => {
            let mut store = credential_store(config);
            let mut prompter = TerminalPrompter::new();
            store.input(&mut prompter)?;
            store.save(&mut prompter)?;
            println!("Credentials stored in {}", store.path().display());
        }
        CredentialCommands::Check => {
            let mut store = credential_store(config);
            store.load(&mut TerminalPrompter::new())?;
            println!("Credentials for client id '{}' decrypted", store.get()?.client_id);
        }
        CredentialCommands::Path => {
            println!("{}", config.credentials.file_path.display());
        }
    }
    Ok(())
}

async fn run_droplets(
    client: &Client,
    out: &Output,
    command: DropletCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        DropletCommands::List => out.list(&client.droplets().await?)?,
        DropletCommands::Show { id } => out.one(&client.droplet(id).await?)?,
        DropletCommands::Create {
            name,
            size,
            image,
            region,
            ssh_keys,
            private_networking,
            backups,
        } => {
            let new = NewDroplet {
                name,
                size_id: size,
                image_id: image,
                region_id: region,
                ssh_key_ids: ssh_keys,
                private_networking,
                backups_enabled: backups,
            };
            out.one(&client.create_droplet(&new).await?)?;
        }
        DropletCommands::Action { id, action } => {
            out.event_id(client.droplet_action(id, action.into()).await?)?
        }
        DropletCommands::Resize { id, size } => out.event_id(client.resize_droplet(id, size).await?)?,
        DropletCommands::Snapshot { id, name } => {
            out.event_id(client.snapshot_droplet(id, name.as_deref()).await?)?
        }
        DropletCommands::Restore { id, image } => {
            out.event_id(client.restore_droplet(id, image).await?)?
        }
        DropletCommands::Rebuild { id, image } => {
            out.event_id(client.rebuild_droplet(id, image).await?)?
        }
        DropletCommands::Rename { id, name } => {
            out.event_id(client.rename_droplet(id, &name).await?)?
        }
        DropletCommands::Destroy { id, scrub } => {
            out.event_id(client.destroy_droplet(id, scrub).await?)?
        }
    }
    Ok(())
}

async fn run_images(
    client: &Client,
    out: &Output,
    command: ImageCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ImageCommands::List { filter } => {
            let filter = match filter {
                FilterArg::All => ImageFilter::All,
                FilterArg::Global => ImageFilter::Global,
                FilterArg::Mine => ImageFilter::MyImages,
            };
            out.list(&client.images(filter).await?)?;
        }
        ImageCommands::Show { id } => out.one(&client.image(id).await?)?,
        ImageCommands::Destroy { id } => {
            client.destroy_image(id).await?;
            println!("Image {} destroyed", id);
        }
        ImageCommands::Transfer { id, region } => {
            out.event_id(client.transfer_image(id, region).await?)?
        }
    }
    Ok(())
}

async fn run_ssh_keys(
    client: &Client,
    out: &Output,
    command: SshKeyCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SshKeyCommands::List => out.list(&client.ssh_keys().await?)?,
        SshKeyCommands::Show { id } => out.one(&client.ssh_key(id).await?)?,
        SshKeyCommands::Add { name, public_key } => {
            out.one(&client.add_ssh_key(&name, &public_key).await?)?
        }
        SshKeyCommands::Edit { id, public_key } => {
            out.one(&client.edit_ssh_key(id, &public_key).await?)?
        }
        SshKeyCommands::Destroy { id } => {
            client.destroy_ssh_key(id).await?;
            println!("SSH key {} destroyed", id);
        }
    }
    Ok(())
}

async fn run_domains(
    client: &Client,
    out: &Output,
    command: DomainCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        DomainCommands::List => out.list(&client.domains().await?)?,
        DomainCommands::Show { domain } => out.one(&client.domain(&domain).await?)?,
        DomainCommands::Create { name, ip_address } => {
            out.one(&client.create_domain(&name, &ip_address).await?)?
        }
        DomainCommands::Destroy { domain } => {
            client.destroy_domain(&domain).await?;
            println!("Domain {} destroyed", domain);
        }
    }
    Ok(())
}

async fn run_records(
    client: &Client,
    out: &Output,
    command: RecordCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        RecordCommands::List { domain } => out.list(&client.records(&domain).await?)?,
        RecordCommands::Show { domain, id } => out.one(&client.record(&domain, id).await?)?,
        RecordCommands::Create { domain, record } => {
            out.one(&client.create_record(&domain, &record.into()).await?)?
        }
        RecordCommands::Edit { domain, id, record } => {
            out.one(&client.edit_record(&domain, id, &record.into()).await?)?
        }
        RecordCommands::Destroy { domain, id } => {
            client.destroy_record(&domain, id).await?;
            println!("Record {} destroyed", id);
        }
    }
    Ok(())
}

/// Write a default configuration file
async fn init_config(path: PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "Configuration already exists at {}. Use --force to overwrite.",
            path.display()
        )
        .into());
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let default_config = format!(
        r#"# dop configuration

[api]
host = "api.digitalocean.com"
port = 443
secure = true
# timeout_secs = 30

[credentials]
path = "{}"
max_attempts = 3

[logging]
level = "warn"
format = "pretty"  # or "json"
"#,
        Config::default_credentials_path().display()
    );

    tokio::fs::write(&path, default_config).await?;

    println!("Configuration initialized at {}", path.display());
    println!("\nNext steps:");
    println!("1. Store your API credentials: dop credentials setup");
    println!("2. Try it out: dop regions");

    Ok(())
}

/// One line per resource in table mode
trait Row {
    fn row(&self) -> String;
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_else(|| "-".to_string())
}

impl Row for Droplet {
    fn row(&self) -> String {
        format!(
            "{:<10} {:<24} {:<10} {:<16} size={} image={} region={}",
            self.id,
            opt(&self.name),
            opt(&self.status),
            opt(&self.ip_address),
            opt(&self.size_id),
            opt(&self.image_id),
            opt(&self.region_id)
        )
    }
}

impl Row for Region {
    fn row(&self) -> String {
        format!("{:<6} {:<8} {}", self.id, opt(&self.slug), opt(&self.name))
    }
}

impl Row for Size {
    fn row(&self) -> String {
        format!("{:<6} {:<8} {}", self.id, opt(&self.slug), opt(&self.name))
    }
}

impl Row for Image {
    fn row(&self) -> String {
        format!(
            "{:<10} {:<12} {}",
            self.id,
            opt(&self.distribution),
            opt(&self.name)
        )
    }
}

impl Row for SshKey {
    fn row(&self) -> String {
        format!("{:<8} {}", self.id, opt(&self.name))
    }
}

impl Row for Domain {
    fn row(&self) -> String {
        format!("{:<8} {:<32} ttl={}", self.id, opt(&self.name), opt(&self.ttl))
    }
}

impl Row for Record {
    fn row(&self) -> String {
        format!(
            "{:<8} {:<6} {:<24} {}",
            self.id,
            opt(&self.record_type),
            opt(&self.name),
            opt(&self.data)
        )
    }
}

impl Row for Event {
    fn row(&self) -> String {
        format!(
            "{:<10} {:<8} droplet={} progress={}%",
            self.id,
            opt(&self.action_status),
            opt(&self.droplet_id),
            opt(&self.percentage)
        )
    }
}

struct Output {
    json: bool,
}

impl Output {
    fn list<T: Serialize + Row>(&self, items: &[T]) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(items)?);
        } else if items.is_empty() {
            println!("Nothing found");
        } else {
            for item in items {
                println!("{}", item.row());
            }
        }
        Ok(())
    }

    fn one<T: Serialize + Row>(&self, item: &T) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(item)?);
        } else {
            println!("{}", item.row());
        }
        Ok(())
    }

    fn event_id(&self, id: u64) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::json!({ "event_id": id }));
        } else {
            println!("Event {} started. Follow it with: dop event {}", id, id);
        }
        Ok(())
    }
}
