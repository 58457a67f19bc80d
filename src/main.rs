use anyhow::Result;
use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ynh_tools::{Config, SharedConfig, Tools};

/// YunoHost host administration tools.
#[derive(Parser, Debug)]
#[command(name = "ynh-tools", version, about, long_about = None)]
struct Cli {
    /// JSON configuration file. The stock host layout is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize the LDAP scheme and the admin account
    Ldapinit {
        /// Current admin password
        #[arg(short, long)]
        password: String,
    },

    /// Change the admin password
    Adminpw {
        #[arg(short, long)]
        old_password: String,
        #[arg(short, long)]
        new_password: String,
    },

    /// Change the main domain
    Maindomain {
        /// Current main domain, read from the host when omitted
        #[arg(short, long)]
        old_domain: Option<String>,
        #[arg(short, long)]
        new_domain: String,
    },

    /// First-time configuration
    Postinstall {
        /// Main domain
        #[arg(short, long)]
        domain: String,
        /// New admin password
        #[arg(short, long)]
        password: String,
        /// Subscribe to the dynamic DNS service
        #[arg(long)]
        dyndns: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_init();
    let cli = Cli::parse();

    let config = config_init(cli.config)?;
    let tools = Tools::system(config);

    let (res, done) = match cli.command {
        Commands::Ldapinit { password } => (
            tools.initialize_directory(&password).await,
            "LDAP has been successfully initialized",
        ),
        Commands::Adminpw {
            old_password,
            new_password,
        } => (
            tools.set_admin_password(&old_password, &new_password).await,
            "Admin password has been changed",
        ),
        Commands::Maindomain {
            old_domain,
            new_domain,
        } => (
            tools
                .rename_domain(old_domain.as_deref(), &new_domain)
                .await,
            "Main domain has been successfully changed",
        ),
        Commands::Postinstall {
            domain,
            password,
            dyndns,
        } => (
            tools.postinstall(&domain, &password, dyndns).await,
            "YunoHost has been successfully configured",
        ),
    };

    match res {
        Ok(()) => {
            win_msg(done);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!("{err:?}");
            eprintln!("Error: {err}");
            Ok(ExitCode::from(u8::try_from(err.code()).unwrap_or(1)))
        }
    }
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ynh_tools=info".into()),
        )
        .init();
}

fn config_init(config_file: Option<PathBuf>) -> Result<SharedConfig> {
    match config_file {
        None => Ok(Arc::new(Config::default())),
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)?;
            tracing::debug!("loaded config from {}", config_file.display());
            Ok(Arc::new(config))
        }
    }
}

fn win_msg(msg: &str) {
    if std::io::stdout().is_terminal() {
        println!("\x1b[1;32mSuccess!\x1b[0m {msg}");
    } else {
        println!("Success! {msg}");
    }
}
