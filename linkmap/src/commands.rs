use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkmap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkmap")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the linkmap link store on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to hold the linkmap database")
                        .default_value("~/.config/linkmap/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Recreate the database even if one already exists at the location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl outward from seed domains, recording which domains link to which. \
                Runs until no undiscovered domain remains (bound it with --limit).",
                )
                .arg(
                    arg!(-s --"seed" <DOMAIN>)
                        .required(false)
                        .help("Seed domain to start from (repeatable)")
                        .action(clap::ArgAction::Append)
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed domains")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("seed"),
                )
                .arg(
                    arg!(-w --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("8"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-l --"limit" <NUM_DOMAINS>)
                        .required(false)
                        .help("Stop scheduling new domains once this many have been discovered")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Directory holding the linkmap database")
                        .default_value("~/.config/linkmap/"),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Disable the progress spinner")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("query")
                .about("Show which domains link to a domain, and how many times")
                .arg(
                    arg!(-d --"domain" <DOMAIN>)
                        .required(true)
                        .help("The target domain to aggregate inbound links for"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Directory holding the linkmap database")
                        .default_value("~/.config/linkmap/"),
                ),
        )
}
