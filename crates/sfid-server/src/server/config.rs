use anyhow::Context;
use clap::Parser;
use sfid::{WorkerBuilder, WorkerConfig};
use std::net::SocketAddr;

/// Runtime configuration for the `sfid-server` binary.
///
/// Every flag can also be set through its environment variable, and a `.env`
/// file in the working directory is loaded first. Worker and datacenter ids
/// must be unique across the fleet; nothing here coordinates them.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sfid-server",
    version,
    about = "An HTTP service handing out Snowflake-style IDs"
)]
pub struct CliArgs {
    /// Worker id encoded into every ID.
    ///
    /// Must lie in the primary worker range, which is half of the space
    /// `WORKER_ID_BITS` allows (the other half is reserved for backup ids).
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(long, env = "WORKER_ID", default_value_t = 0, allow_negative_numbers = true)]
    pub worker_id: i64,

    /// Datacenter id encoded into every ID.
    ///
    /// Environment variable: `DATA_CENTER_ID`
    #[arg(long, env = "DATA_CENTER_ID", default_value_t = 0, allow_negative_numbers = true)]
    pub data_center_id: i64,

    /// Width of the worker id field.
    ///
    /// Environment variable: `WORKER_ID_BITS`
    #[arg(long, env = "WORKER_ID_BITS", default_value_t = sfid::DEFAULT_WORKER_ID_BITS)]
    pub worker_id_bits: u32,

    /// Width of the datacenter id field.
    ///
    /// Environment variable: `DATA_CENTER_ID_BITS`
    #[arg(long, env = "DATA_CENTER_ID_BITS", default_value_t = sfid::DEFAULT_DATA_CENTER_ID_BITS)]
    pub data_center_id_bits: u32,

    /// Clock rollbacks shorter than this many milliseconds are waited out;
    /// longer ones switch to the backup worker id.
    ///
    /// Requests queue behind the wait, so keep this small.
    ///
    /// Environment variable: `MAX_BACKWARD_MS`
    #[arg(long, env = "MAX_BACKWARD_MS", default_value_t = sfid::DEFAULT_MAX_BACKWARD_MS)]
    pub max_backward_ms: u64,

    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub worker: WorkerConfig,
    pub server_addr: SocketAddr,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let worker = WorkerBuilder::new()
            .worker_id_bits(args.worker_id_bits)
            .data_center_id_bits(args.data_center_id_bits)
            .worker_id(args.worker_id)
            .data_center_id(args.data_center_id)
            .max_backward_ms(args.max_backward_ms)
            .build_config()
            .context("invalid generator settings")?;

        let server_addr = args
            .server_addr
            .parse()
            .with_context(|| format!("invalid SERVER_ADDR `{}`", args.server_addr))?;

        Ok(Self {
            worker,
            server_addr,
        })
    }
}
