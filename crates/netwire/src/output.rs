use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput {
    peer: String,
    size: usize,
    utf8: bool,
    payload: String,
    timestamp: String,
}

impl PacketOutput {
    fn new(payload: &[u8], peer: SocketAddr) -> Self {
        let (utf8, preview) = payload_preview(payload);
        Self {
            peer: peer.to_string(),
            size: payload.len(),
            utf8,
            payload: preview,
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_packet(payload: &[u8], peer: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", render_json(payload, peer));
        }
        OutputFormat::Table => {
            let out = PacketOutput::new(payload, peer);
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "SIZE", "PAYLOAD"])
                .add_row(vec![out.peer, out.size.to_string(), out.payload]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let out = PacketOutput::new(payload, peer);
            println!("peer={} size={} payload={}", out.peer, out.size, out.payload);
        }
        OutputFormat::Raw => {
            print_raw(payload);
        }
    }
}

fn render_json(payload: &[u8], peer: SocketAddr) -> String {
    serde_json::to_string(&PacketOutput::new(payload, peer)).unwrap_or_else(|_| "{}".to_string())
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Text payloads print as-is; anything else prints as hex.
fn payload_preview(payload: &[u8]) -> (bool, String) {
    match std::str::from_utf8(payload) {
        Ok(text) => (true, text.to_string()),
        Err(_) => (false, hex(payload)),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
