use anyhow::{Context, Result};
use human_panic::setup_panic;
use log::{debug, trace};

use crate::helpers::logging;

/// Common entry point for injector binaries. Sets up panic reporting, `.env` loading and
/// logging, then hands the parsed command line to `fn_run`.
///
/// Command-line parsing happens through `fn_cli_parse`, so clap usage errors terminate the
/// process (with exit status 2) before the logger or any network resource is set up.
pub fn run<CliType>(
    fn_cli_parse: fn() -> CliType,
    fn_extract_logging: fn(&CliType) -> &logging::Params,
    fn_run: fn(CliType) -> Result<()>,
) -> Result<()> {
    setup_panic!();

    // before parsing, so that env-backed arguments see `.env` values
    let env_found = load_dotenv()?;
    let cli = fn_cli_parse();
    let logger_handle = logging::configure_from(fn_extract_logging(&cli))?;
    if !env_found {
        trace!("No `.env` file found (recursively), continuing without it.");
    }

    let command_result = fn_run(cli);
    debug!("Finished command execution. Result: {:?}", command_result);

    // Important with non-direct write mode
    // Handle needs to be kept alive until end of program
    logger_handle.flush();

    command_result
}

fn load_dotenv() -> Result<bool> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(true),
        Err(env_err) if env_err.not_found() => Ok(false),
        Err(env_err) => Err(env_err).with_context(|| "Failed to load `.env` file"),
    }
}
