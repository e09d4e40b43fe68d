mod cmd;

use std::path::PathBuf;
use std::process::exit;

use console::{style, Style};
use flagfirm::Settings;
use flagfirm_core::RealEnvironment;
use tracing_subscriber::EnvFilter;

const DEFAULT_ERR_EXIT_CODE: i32 = 1;

fn main() {
    let app = cmd::default::command()
        .subcommand(cmd::check_cmd::command())
        .subcommand(cmd::list_cmd::command())
        .subcommand(cmd::completions_cmd::command());

    let matches = app.clone().get_matches();

    let level = matches
        .get_one::<String>("log")
        .map_or("warn", String::as_str);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let env = RealEnvironment;
    let settings = match Settings::discover(
        matches.get_one::<PathBuf>("config").map(PathBuf::as_path),
        &env,
    ) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!(
                "Could not load settings. Fix or remove the file, or pass {}\nError: {}",
                style("--config <PATH>").bold().italic(),
                err
            );
            exit(exitcode::CONFIG)
        }
    };

    let res = match matches.subcommand() {
        Some(("check", subcommand_matches)) => {
            cmd::check_cmd::run(subcommand_matches, &settings, &env)
        }
        Some(("list", subcommand_matches)) => cmd::list_cmd::run(subcommand_matches),
        Some(("completions", subcommand_matches)) => {
            let mut app = app;
            Ok(cmd::completions_cmd::run(subcommand_matches, &mut app))
        }
        _ => unreachable!(),
    };

    let exit_with = match res {
        Ok(cmd) => {
            if let Some(message) = cmd.message {
                let style = if exitcode::is_success(cmd.code) {
                    Style::new().green()
                } else {
                    Style::new().red()
                };
                eprintln!("{}", style.apply_to(message));
            }
            cmd.code
        }
        Err(err) => {
            tracing::debug!(?err, "command failed");
            eprintln!("{}", style(err).red());
            DEFAULT_ERR_EXIT_CODE
        }
    };
    exit(exit_with)
}
