use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

fn audit_arguments(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-s --"snapshots" <DIR>)
            .required(true)
            .help("Root directory of the snapshot store"),
    )
    .arg(
        arg!(-b --"bucket" <NAME>)
            .required(false)
            .help("Bucket (sub-directory) holding the snapshots")
            .default_value("scrapes"),
    )
    .arg(
        arg!(-p --"pages" <PATH>)
            .required(true)
            .help("Page URL to snapshot key mapping (JSON object or '<url> <key>' lines)"),
    )
    .arg(
        arg!(--"site-id" <ID>)
            .required(false)
            .help("Site identifier attached to log records")
            .default_value("local"),
    )
    .arg(
        arg!(--"scope" <URL>)
            .required(false)
            .help("Only audit pages and links under this URL (default: everything)")
            .value_parser(clap::value_parser!(Url)),
    )
    .arg(
        arg!(--"group-size" <NUM>)
            .required(false)
            .help("Number of links probed together")
            .value_parser(clap::value_parser!(usize))
            .default_value("5"),
    )
    .arg(
        arg!(--"group-delay-ms" <MILLIS>)
            .required(false)
            .help("Pause between probe groups in milliseconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("100"),
    )
    .arg(
        arg!(--"head-timeout-ms" <MILLIS>)
            .required(false)
            .help("HEAD request timeout in milliseconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("5000"),
    )
    .arg(
        arg!(--"get-timeout-ms" <MILLIS>)
            .required(false)
            .help("GET fallback timeout in milliseconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("10000"),
    )
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkrot")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkrot")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Only log warnings and errors, no progress spinner")
                .required(false)
                .conflicts_with("verbose"),
        )
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
        .subcommand_required(true)
        .subcommand(audit_arguments(
            command!("audit")
                .about("Check every page in the mapping for broken internal links and print a ranked report")
                .arg(
                    arg!(-t --"traffic" <PATH>)
                        .required(false)
                        .help("JSON array of broken links from traffic analytics to merge in"),
                )
                .arg(
                    arg!(--"cpc" <AMOUNT>)
                        .required(false)
                        .help("Cost per click used to value lost traffic")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("1"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        ))
        .subcommand(audit_arguments(
            command!("batch")
                .about("Process the next slice of pages, resuming from a saved state file")
                .arg(
                    arg!(--"state" <PATH>)
                        .required(true)
                        .help("Batch state file; created on first run and updated after every batch"),
                )
                .arg(
                    arg!(-n --"batch-size" <NUM>)
                        .required(false)
                        .help("Number of pages per batch")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                ),
        ))
}
