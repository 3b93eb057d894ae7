use clap::Parser;
use iete_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    iete_cli::run(cli).await
}
