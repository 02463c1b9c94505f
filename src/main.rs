//! messenger-session binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use messenger_session::cli::{self, Args};
use messenger_session::config::Config;
use messenger_session::console::{render_status, ConsoleCommand, HELP};
use messenger_session::{logging, SessionManager, ViewRouter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("try 'messenger-session --help' for more information");
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(&args)?;
    logging::try_init_with_filter(config.log_filter()).ok();

    info!("messenger-session v{}", env!("CARGO_PKG_VERSION"));
    info!(
        app_id = %config.backend.app_id,
        region = %config.backend.region,
        users = config.backend.users.len(),
        "identity backend configured"
    );

    let manager = Arc::new(SessionManager::with_options(
        Arc::new(config.to_backend()),
        config.to_validator(),
        config.to_avatar_config(),
    ));

    let mut router = ViewRouter::new(&manager);
    let mut shown = router.current();
    println!("[{}]", shown);
    tokio::spawn(async move {
        while let Some(screen) = router.changed().await {
            if screen != shown {
                shown = screen;
                println!("[{}]", screen);
            }
        }
    });

    let restoring = Arc::clone(&manager);
    tokio::spawn(async move {
        if let Err(e) = restoring.restore_session().await {
            warn!(error = %e, "startup restore was not started");
        }
    });

    let secret = config.backend.auth_key.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match ConsoleCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let result = match command {
            ConsoleCommand::SignIn { identifier } => manager.sign_in(&identifier, &secret).await,
            ConsoleCommand::SignUp(profile) => manager.sign_up(&profile, &secret).await,
            ConsoleCommand::SignOut => manager.sign_out().await,
            ConsoleCommand::Status => Ok(()),
            ConsoleCommand::Help => {
                println!("{}", HELP);
                continue;
            }
            ConsoleCommand::Quit => break,
        };

        if let Err(e) = result {
            println!("rejected: {}", e);
        }
        println!("{}", render_status(&manager.snapshot()));
    }

    info!("console closed");
    Ok(())
}
