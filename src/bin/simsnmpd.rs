//! simsnmpd: serve one or more walkfiles as a simulated SNMP agent.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use simsnmp::agent::Agent;
use simsnmp::config::RuntimeConfig;
use simsnmp::error::Error;
use simsnmp::store::ObjectStore;
use simsnmp::transport::Server;
use simsnmp::walkfile;

/// Simulate an SNMP agent from captured walkfiles.
#[derive(Debug, Parser)]
#[command(name = "simsnmpd", version, about)]
struct Args {
    /// YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// UDP port to listen on (overrides the config file).
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Address to bind. Use :: for dual-stack.
    #[arg(long, value_name = "ADDR", default_value_t = IpAddr::V6(Ipv6Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Community accepted for GET/GETNEXT/GETBULK.
    #[arg(long, value_name = "COMMUNITY")]
    read_community: Option<String>,

    /// Community required for SET.
    #[arg(long, value_name = "COMMUNITY")]
    write_community: Option<String>,

    /// Community stamped on outgoing traps.
    #[arg(long, value_name = "COMMUNITY")]
    trap_community: Option<String>,

    /// Walkfile to serve; repeat to merge several into one tree.
    /// Replaces the config file's walkfile list entirely.
    #[arg(short, long = "walkfile", value_name = "FILE")]
    walkfiles: Vec<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(RuntimeConfig, IpAddr), Error> {
        let mut config = match &self.config {
            Some(path) => RuntimeConfig::from_file(path)?,
            None => RuntimeConfig::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(read) = self.read_community {
            config.read_community = read;
        }
        if let Some(write) = self.write_community {
            config.write_community = write;
        }
        if let Some(trap) = self.trap_community {
            config.trap_community = trap;
        }
        if !self.walkfiles.is_empty() {
            config.walkfiles = self.walkfiles;
        }
        Ok((config, self.bind))
    }
}

fn load_store(config: &RuntimeConfig) -> Result<ObjectStore, Error> {
    let mut store = ObjectStore::new();
    store.set_allow_create(config.allow_set_create);
    store.set_require_type_match(config.require_set_type_match);

    for path in &config.walkfiles {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.clone(),
            message: format!("cannot read walkfile: {}", e),
        })?;
        walkfile::parse_into(&text, &mut store)?;
        info!(walkfile = %path.display(), entries = store.len(), "loaded");
    }
    Ok(store)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let (config, bind) = match args.into_config() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = match load_store(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(entries = store.len(), "object tree ready");

    let agent = Arc::new(Agent::new(
        store,
        config.read_community.clone(),
        config.write_community.clone(),
        config.trap_community.clone(),
    ));

    let addr = SocketAddr::new(bind, config.port);
    let server = match Server::bind(addr, agent).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
