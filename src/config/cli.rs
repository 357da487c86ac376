use crate::config::AppConfig;
use crate::domain::model::Category;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "placemap")]
#[command(about = "Curated places on a map: read API and map layout preview")]
pub struct Cli {
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve GET /api/places and GET /api/places/{id}
    Serve(ServeArgs),
    /// Geocode a places list and print the resulting map layout as JSON
    Preview(PreviewArgs),
    /// Validate a places data file
    Check(CheckArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Listen address, e.g. 127.0.0.1:3000")]
    pub addr: Option<String>,

    #[arg(long, help = "Places JSON document")]
    pub data: Option<String>,

    #[arg(long, help = "Emit JSON log lines")]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PreviewArgs {
    #[arg(long, conflicts_with = "api_url", help = "Places JSON document")]
    pub data: Option<String>,

    #[arg(long, help = "Read places from a running places API instead of a file")]
    pub api_url: Option<String>,

    #[arg(long, default_value = "ALL", help = "ALL, CAFE, LIBRARY, OUTDOOR or ETC")]
    pub category: Category,

    #[arg(long, help = "Keep only places whose address names this neighborhood")]
    pub neighborhood: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    #[arg(long, help = "Places JSON document")]
    pub data: Option<String>,
}

impl ServeArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(addr) = &self.addr {
            config.server.addr = addr.clone();
        }
        if let Some(data) = &self.data {
            config.data.path = data.clone();
        }
        if self.json_logs {
            config.server.json_logs = true;
        }
    }
}

impl PreviewArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(data) = &self.data {
            config.data.path = data.clone();
            config.data.api_url = None;
        }
        if let Some(api_url) = &self.api_url {
            config.data.api_url = Some(api_url.clone());
        }
    }
}

impl CheckArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(data) = &self.data {
            config.data.path = data.clone();
        }
    }
}
