use clap::{crate_version, Arg, Command};

pub const LOG_LEVELS: [&str; 6] = ["off", "trace", "debug", "info", "warn", "error"];

pub fn command() -> Command {
    Command::new("flagfirm")
        .version(crate_version!())
        .about("Check compiler and linker flags against an allowlist")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log")
                .long("log")
                .help("Set logging level (RUST_LOG takes precedence)")
                .value_name("LEVEL")
                .value_parser(LOG_LEVELS)
                .default_value("warn")
                .ignore_case(true)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a settings file")
                .value_name("PATH")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .global(true),
        )
}
