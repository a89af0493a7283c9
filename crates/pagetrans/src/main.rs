use anyhow::Result;
use clap::Parser;
use config::Config;
use env_logger::Env;
use pagetrans::{App, Cli};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    // stdout carries protocol replies while serving
    let banner = cli.command.is_interactive();
    if banner {
        println!("{}", ">".repeat(*app::LINE_LENGTH));
    }
    if let Err(e) = run(cli).await {
        if banner {
            println!("{:#^width$}", " Error ", width = *app::LINE_LENGTH);
        }
        eprintln!("{e:?}");
    }
    if banner {
        println!("{}", "<".repeat(*app::LINE_LENGTH));
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.command.is_interactive() {
        println!("{} {}", app::NAME, app::VERSION);
    }

    let config = Config::load(&cli.config).await?;
    let app = App::new(config);

    app.run(cli.command).await
}
