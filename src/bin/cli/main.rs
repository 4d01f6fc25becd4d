use clap::Parser;
use grounded::{app::state::AppState, cli::CliArgs};

#[tokio::main]
async fn main() {
    let CliArgs { start, command } = CliArgs::parse();

    let result = async {
        let state = AppState::new(&start).await?;
        grounded::cli::run(command, state).await
    };

    if let Err(e) = result.await {
        e.print();
        eprintln!("{e}");
        std::process::exit(1);
    }
}
