use clap::{Arg, ArgMatches, Command};
use flagfirm::error::Result;
use flagfirm::{Check, FlagValidator, LayeredEnvironment, Settings, ValidationOutcome};
use flagfirm_core::Environment;
use strum::IntoEnumIterator;

const DEFAULT_SOURCE: &str = "command line";

pub fn command() -> Command {
    let checks: Vec<String> = Check::iter().map(|check| check.to_string()).collect();
    Command::new("check")
        .about("Validate a flag list the way a build would before invoking the toolchain")
        .arg(
            Arg::new("check")
                .short('c')
                .long("check")
                .help(format!("Flag list kind: {}", checks.join(", ")))
                .value_name("CHECK")
                .required(true),
        )
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .help("Label used in rejection messages")
                .value_name("LABEL")
                .default_value(DEFAULT_SOURCE),
        )
        .arg(
            Arg::new("prefix")
                .short('p')
                .long("prefix")
                .help("Override key prefix (default from settings, then CGO)")
                .value_name("PREFIX"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .help("Output format")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("flags")
                .help("Flags to validate, in order")
                .num_args(0..)
                .allow_hyphen_values(true)
                .trailing_var_arg(true),
        )
}

pub fn run(
    matches: &ArgMatches,
    settings: &Settings,
    base_env: &dyn Environment,
) -> Result<flagfirm::CmdExit> {
    let check_name = matches
        .get_one::<String>("check")
        .map_or("", String::as_str);
    let check = match Check::parse(check_name) {
        Ok(check) => check,
        Err(err) => {
            return Ok(flagfirm::CmdExit {
                code: exitcode::USAGE,
                message: Some(err.to_string()),
            });
        }
    };
    let source = matches
        .get_one::<String>("source")
        .map_or(DEFAULT_SOURCE, String::as_str);
    let prefix = matches
        .get_one::<String>("prefix")
        .unwrap_or(&settings.prefix);
    if prefix.is_empty() {
        return Ok(flagfirm::CmdExit {
            code: exitcode::USAGE,
            message: Some("prefix must not be empty".to_string()),
        });
    }
    let flags: Vec<&String> = matches
        .get_many::<String>("flags")
        .map(Iterator::collect)
        .unwrap_or_default();
    let json = matches.get_one::<String>("format").map(String::as_str) == Some("json");

    let env = LayeredEnvironment::new(settings, base_env);
    let validator = FlagValidator::new(&env)?.with_prefix(prefix.as_str());
    let outcome = match validator.validate(check, source, &flags) {
        Ok(outcome) => outcome,
        Err(err @ flagfirm_core::Error::Config { .. }) => {
            return Ok(flagfirm::CmdExit {
                code: exitcode::CONFIG,
                message: Some(err.to_string()),
            });
        }
        Err(err) => return Err(err.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(flagfirm::CmdExit {
            code: outcome_code(&outcome),
            message: None,
        });
    }
    Ok(text_exit(&outcome, flags.len()))
}

const fn outcome_code(outcome: &ValidationOutcome) -> exitcode::ExitCode {
    if outcome.is_accepted() {
        exitcode::OK
    } else {
        exitcode::DATAERR
    }
}

fn text_exit(outcome: &ValidationOutcome, count: usize) -> flagfirm::CmdExit {
    let message = match outcome.rejection() {
        None => format!("{count} flag(s) accepted."),
        Some(rejection) => rejection.to_string(),
    };
    flagfirm::CmdExit {
        code: outcome_code(outcome),
        message: Some(message),
    }
}
