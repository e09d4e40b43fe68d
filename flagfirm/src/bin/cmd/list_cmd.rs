use std::fmt::Write;

use clap::{Arg, ArgMatches, Command};
use flagfirm::error::Result;
use flagfirm::Tool;
use flagfirm_core::{Catalog, CatalogEntry, Rule};
use strum::IntoEnumIterator;

pub fn command() -> Command {
    Command::new("list")
        .about("List the built-in flag catalog")
        .arg(
            Arg::new("tool")
                .short('t')
                .long("tool")
                .help("Only show entries of one tool: compiler, linker"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .help("Output format")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
}

pub fn run(matches: &ArgMatches) -> Result<flagfirm::CmdExit> {
    let tools: Vec<Tool> = match matches.get_one::<String>("tool") {
        Some(name) => match Tool::parse(name) {
            Ok(tool) => vec![tool],
            Err(err) => {
                return Ok(flagfirm::CmdExit {
                    code: exitcode::USAGE,
                    message: Some(err.to_string()),
                });
            }
        },
        None => Tool::iter().collect(),
    };

    let catalog = Catalog::builtin()?;
    if matches.get_one::<String>("format").map(String::as_str) == Some("json") {
        println!("{}", render_json(catalog, &tools)?);
    } else {
        println!("{}", render(catalog, &tools));
    }
    Ok(flagfirm::CmdExit {
        code: exitcode::OK,
        message: None,
    })
}

fn entries_of<'a>(catalog: &'a Catalog, tools: &[Tool]) -> Vec<&'a CatalogEntry> {
    catalog
        .entries()
        .iter()
        .filter(|entry| tools.contains(&entry.from))
        .collect()
}

fn render_json(catalog: &Catalog, tools: &[Tool]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&entries_of(catalog, tools))?)
}

fn render(catalog: &Catalog, tools: &[Tool]) -> String {
    let mut output = String::new();
    for tool in tools {
        let entries: Vec<_> = catalog
            .entries()
            .iter()
            .filter(|entry| entry.from == *tool)
            .collect();
        let _ = writeln!(output, "{tool}: {} entr(ies)\n", entries.len());
        for entry in &entries {
            let (kind, value) = match &entry.rule {
                Rule::Pattern(pattern) => ("pattern", pattern.as_str()),
                Rule::TakesArg(name) => ("takes-arg", name.as_str()),
            };
            let _ = writeln!(
                output,
                "  {id:<28} {kind:<10} {value:<40} {desc}",
                id = entry.id,
                desc = entry.description
            );
        }
        output.push('\n');
    }
    output
}
