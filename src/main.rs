// src/main.rs

use std::process::ExitCode;

use run_monitor::{Status, cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("run-monitor error: {err:?}");
            ExitCode::from(1)
        }
    }
}

async fn run_main() -> anyhow::Result<ExitCode> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let fail_on_error = args.fail_on_error;

    let status = run(args).await?;
    Ok(match status {
        Status::RunsFailed if fail_on_error => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    })
}
