use clap::{arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap_cargo::style::CLAP_STYLING;

pub(crate) const DEFAULT_REGISTRY_DIR: &str = "~/.config/sitegauge/";
pub(crate) const DEFAULT_REGISTRY_DB: &str = "~/.config/sitegauge/sitegauge.db";

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitegauge")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitegauge")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the sitegauge registry on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the sitegauge registry")
                        .default_value(DEFAULT_REGISTRY_DIR),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Forces the overwriting of any existing registry at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("analyze")
                .about("Analyzes a website's front page and synthesizes its processing configuration")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The front page URL to analyze")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Extra link-discovery depth beyond the front page")
                        .default_value("1")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"allow-domain" <DOMAIN>)
                        .required(false)
                        .help("Cross-domain host to allow in candidate discovery (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json or markdown")
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Write the report to a file instead of stdout"),
                )
                .arg(
                    arg!(--"no-save" "Do not store the configuration in the registry")
                        .required(false),
                )
                .arg(
                    arg!(--"database" <PATH>)
                        .required(false)
                        .help("Path to the registry database")
                        .default_value(DEFAULT_REGISTRY_DB),
                ),
        )
        .subcommand(
            command!("batch")
                .about("Analyzes a collection of websites from a hosts file")
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(true)
                        .help("Path to a newline-delimited file of URLs to analyze")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Extra link-discovery depth beyond each front page")
                        .default_value("1")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-w --"workers" <WORKERS>)
                        .required(false)
                        .help("Number of concurrent analysis workers")
                        .default_value("4")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"no-save" "Do not store configurations in the registry")
                        .required(false),
                )
                .arg(
                    arg!(--"database" <PATH>)
                        .required(false)
                        .help("Path to the registry database")
                        .default_value(DEFAULT_REGISTRY_DB),
                ),
        )
        .subcommand(
            command!("sites")
                .about("Inspect the website registry")
                .subcommand_required(true)
                .subcommand(
                    command!("list").about("List all analyzed websites").arg(
                        arg!(--"database" <PATH>)
                            .required(false)
                            .help("Path to the registry database")
                            .default_value(DEFAULT_REGISTRY_DB),
                    ),
                )
                .subcommand(
                    command!("show")
                        .about("Show one website's stored configuration")
                        .arg(arg!(<URL>).required(true).help("Base URL of the website"))
                        .arg(
                            arg!(--"database" <PATH>)
                                .required(false)
                                .help("Path to the registry database")
                                .default_value(DEFAULT_REGISTRY_DB),
                        ),
                ),
        )
}
