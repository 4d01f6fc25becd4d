use clap::Parser;
use grounded::{
    app::{server::router, state::AppState},
    config::StartArgs,
    error::GroundedError,
    map_err,
};
use tracing::info;

#[tokio::main]
async fn main() {
    let args = StartArgs::parse();

    if let Err(e) = serve(args).await {
        e.print();
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn serve(args: StartArgs) -> Result<(), GroundedError> {
    let state = AppState::new(&args).await?;
    let addr = args.address();

    let listener = map_err!(tokio::net::TcpListener::bind(&addr).await);

    let router = router(state, args.allowed_origins());

    info!("Listening on {addr}");

    map_err!(axum::serve(listener, router).await);

    Ok(())
}
