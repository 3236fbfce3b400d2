//! iomark CLI entry point

use anyhow::{Context, Result};
use iomark::config::cli::Cli;
use iomark::util::log::log;
use iomark::Coordinator;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = cli.to_config();

    if !config.json {
        println!("iomark v{}", env!("CARGO_PKG_VERSION"));
        println!("Concurrent local-disk throughput and IOPS benchmark");
        println!();
    }

    let coordinator = Coordinator::new(config).context("configuration rejected")?;
    let report = coordinator.run().context("benchmark run failed")?;

    if report.barrier_broken {
        log("run finished with a broken barrier; see the warning in the report");
        std::process::exit(1);
    }
    Ok(())
}
