use anyhow::Result;
use clap::Parser;

use pf_regress::helpers::{bootstrap, logging};

/// Orchestrates one injection, from address lookup to the send call.
mod cmd_logic;
/// Link-layer prefix required by the injection device.
mod framing;
mod inject;
mod packet;

#[cfg(test)]
mod test_utils;

/// Sends one ICMPv6 message of unassigned type from the test address to itself.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[clap(flatten)]
    logging: logging::Params,

    #[clap(flatten)]
    params: cmd_logic::Params,
}

fn main() -> Result<()> {
    // The regress harness expects this line before anything else, even usage errors
    println!("send icmp6 without options");
    bootstrap::run(Cli::parse, |cli: &Cli| &cli.logging, do_run)
}

fn do_run(cli: Cli) -> Result<()> {
    cmd_logic::handle(cli.params)
}
