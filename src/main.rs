use is_terminal::IsTerminal;
use log::{LevelFilter, error, info};
use std::io;
use std::process::ExitCode;

use move_division::api::Noise;
use move_division::cli::Invocation;
use move_division::commands::{run_from_args, sqlite_platform};
use move_division::error::{MoveError, USAGE};

/// Log to a per-run file, or to stderr when the file can't be opened
fn init_logger(noise: Noise) {
    let mut builder = env_logger::Builder::from_default_env();
    if noise.is_verbose() {
        builder.filter_module("move_division", LevelFilter::Debug);
    }

    let log_file = dirs::cache_dir()
        .map(|dir| dir.join("move-division"))
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir))
        .and_then(|dir| {
            // Truncate on each run
            std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(dir.join("move_division.log"))
                .ok()
        });

    if let Some(file) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let mut input = io::stdin().lock();
    let mut output = io::stdout();

    let connect = |invocation: &Invocation| {
        init_logger(invocation.noise);
        colored::control::set_override(io::stdout().is_terminal());
        info!("Starting move_division for '{}'", invocation.repository_id);
        sqlite_platform(invocation)
    };

    match run_from_args(std::env::args_os(), connect, &mut input, &mut output).await {
        Ok(summary) => {
            info!(
                "Finished: {} records moved, {} sources declined",
                summary.moved,
                summary.declined.len()
            );
            ExitCode::SUCCESS
        }
        Err(MoveError::Help(text)) => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
        Err(err @ MoveError::Usage(_)) => {
            println!("{}", USAGE);
            ExitCode::from(err.exit_code())
        }
        Err(err) => {
            error!("{:#}", err);
            match &err {
                MoveError::Platform(inner) => eprintln!("Error: {:#}", inner),
                other => eprintln!("{}", other),
            }
            ExitCode::from(err.exit_code())
        }
    }
}
