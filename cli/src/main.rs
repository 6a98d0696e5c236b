mod args;
mod commands;
mod logging;
mod prompts;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use args::{Cli, Command};

fn version_line() -> String {
    format!("CyAudit CLI v{}", env!("CARGO_PKG_VERSION"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version || matches!(cli.command, Some(Command::Version)) {
        println!("{}", version_line());
        return ExitCode::SUCCESS;
    }

    logging::init(cli.debug, cli.quiet);

    let result = match cli.command {
        Some(Command::Setup(args)) => commands::setup::run(args),
        Some(Command::Clone(args)) => commands::clone::run(args),
        Some(Command::Version) => Ok(()),
        None => {
            let _ = Cli::command().print_help();
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_line() {
        assert!(version_line().starts_with("CyAudit CLI v"));
        assert!(version_line().ends_with(env!("CARGO_PKG_VERSION")));
    }
}
