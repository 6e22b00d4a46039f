use anyhow::Context;
use clap::Parser;
use webstatus::cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init(args.verbose);

    if let Err(e) = start(args).await {
        tracing::error!("webstatus: {:#}", e);
        std::process::exit(1);
    }
}

async fn start(args: Args) -> anyhow::Result<()> {
    let settings = args.into_settings().context("invalid command-line configuration")?;
    let summary = webstatus::run(&settings).await.context("monitoring stopped")?;

    tracing::info!("Monitoring finished: {}", summary);
    Ok(())
}
