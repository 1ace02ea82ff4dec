use clap::Parser;
use gpg_keyctl::cli::{commands, Cli};

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = commands::run(cli).await {
        commands::render_error(&err);
        std::process::exit(1);
    }
}
