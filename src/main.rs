//! prom2statsd CLI entry point.

use prom2statsd_lib::cli::{self, Cli};
use prom2statsd_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli).await
}
