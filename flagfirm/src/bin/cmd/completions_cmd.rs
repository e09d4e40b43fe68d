use clap::{Arg, ArgMatches, Command};
use clap_complete::{generate, Generator, Shell};

pub fn command() -> Command {
    Command::new("completions")
        .about("Generate shell completion scripts")
        .arg(
            Arg::new("shell")
                .help("Shell to generate completions for")
                .required(true)
                .value_parser(clap::value_parser!(Shell)),
        )
}

pub fn run(matches: &ArgMatches, app: &mut Command) -> flagfirm::CmdExit {
    let Some(shell) = matches.get_one::<Shell>("shell").copied() else {
        return flagfirm::CmdExit {
            code: exitcode::USAGE,
            message: Some("Missing shell name. See: flagfirm completions --help".to_string()),
        };
    };
    generate_completions(shell, app);

    flagfirm::CmdExit {
        code: exitcode::OK,
        message: None,
    }
}

fn generate_completions(gen: impl Generator, app: &mut Command) {
    generate(gen, app, "flagfirm", &mut std::io::stdout());
}
