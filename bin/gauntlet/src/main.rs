#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/gauntlet-harness/gauntlet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    use clap::Parser;

    let cli = cli::Cli::parse();
    cli.init_tracing();
    cli.run().await
}
