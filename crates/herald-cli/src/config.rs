use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use herald::DispatchConfig;

/// Upper bound on the per-task delay, so a typo cannot park the run for days.
const MAX_DELAY_MS: u64 = 60 * 60 * 1000;

/// Runtime configuration for the `herald` binary.
///
/// Every flag can also be supplied through the environment (or a `.env` file
/// in the working directory).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "herald",
    version,
    about = "Greets a roster concurrently, one task per person, and reports the identity tally"
)]
pub struct CliArgs {
    /// JSON file holding an array of `{"first_name": ..., "age": ...}`
    /// records. When omitted, the built-in four-person roster is used.
    ///
    /// Environment variable: `HERALD_INPUT`
    #[arg(long, short, env = "HERALD_INPUT")]
    pub input: Option<PathBuf>,

    /// Milliseconds each task waits before greeting.
    ///
    /// Environment variable: `GREETING_DELAY_MS`
    #[arg(long, env = "GREETING_DELAY_MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Maximum number of identities the run may issue. Unbounded by default.
    ///
    /// Environment variable: `MAX_IDENTITIES`
    #[arg(long, env = "MAX_IDENTITIES")]
    pub max_identities: Option<u64>,

    /// After the run, print the user ids held by the record store.
    #[arg(long, default_value_t = false)]
    pub list_ids: bool,

    /// Do not print the JSON run summary.
    #[arg(long, short, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: Option<PathBuf>,
    pub dispatch: DispatchConfig,
    pub list_ids: bool,
    pub quiet: bool,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.delay_ms > MAX_DELAY_MS {
            bail!(
                "GREETING_DELAY_MS ({}) exceeds the maximum of {} ms",
                args.delay_ms,
                MAX_DELAY_MS
            );
        }

        if args.max_identities == Some(0) {
            bail!("MAX_IDENTITIES must be greater than 0");
        }

        if let Some(path) = &args.input {
            if !path.is_file() {
                bail!("input file {} does not exist", path.display());
            }
        }

        let mut dispatch =
            DispatchConfig::default().with_greeting_delay(Duration::from_millis(args.delay_ms));
        if let Some(max) = args.max_identities {
            dispatch = dispatch.with_max_identities(max);
        }

        Ok(Self {
            input: args.input,
            dispatch,
            list_ids: args.list_ids,
            quiet: args.quiet,
        })
    }
}
