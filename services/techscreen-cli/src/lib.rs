mod candidates;
mod cli;
mod infra;
mod interview;
mod routes;
mod server;
mod terminal;

use techscreen::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
