use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = bazaar_cli::Cli::parse();
    if !bazaar_cli::run(cli)? {
        std::process::exit(1);
    }
    Ok(())
}
