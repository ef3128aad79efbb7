mod cli;
mod infra;
mod print;
mod routes;
mod server;

use civic_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
