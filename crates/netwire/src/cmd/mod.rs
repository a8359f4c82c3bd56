use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Subcommand};
use netwire_codec::WireConfig;
use netwire_connection::ConnectionConfig;

use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept connections and echo every packet back.
    Echo(EchoArgs),
    /// Send a single packet.
    Send(SendArgs),
    /// Accept connections and print received packets.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Packet bound shared by every network subcommand.
#[derive(Args, Debug, Clone)]
pub struct PacketArgs {
    /// Largest packet accepted or sent, in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = netwire_codec::DEFAULT_MAX_PACKET)]
    pub max_packet_size: usize,
}

impl PacketArgs {
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            wire: WireConfig {
                max_packet_size: self.max_packet_size,
                ..WireConfig::default()
            },
            ..ConnectionConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Address to bind (e.g. 127.0.0.1:7070).
    pub addr: String,
    /// Exit after this many connections have been served.
    #[arg(long, value_name = "N")]
    pub connections: Option<usize>,
    #[command(flatten)]
    pub packet: PacketArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address to connect to.
    pub addr: String,
    /// Raw string payload, sent as an opaque packet.
    #[arg(long, conflicts_with_all = ["string", "file"])]
    pub data: Option<String>,
    /// Text payload, sent as a framed UTF-8 string.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub string: Option<String>,
    /// Stream the payload from a file.
    #[arg(long, conflicts_with_all = ["data", "string"])]
    pub file: Option<PathBuf>,
    /// Wait for one reply packet and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the connection and reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    #[command(flatten)]
    pub packet: PacketArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (e.g. 127.0.0.1:7070).
    pub addr: String,
    /// Exit after receiving N packets.
    #[arg(long)]
    pub count: Option<usize>,
    #[command(flatten)]
    pub packet: PacketArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
