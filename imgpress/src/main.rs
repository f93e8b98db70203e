use std::process::ExitCode;

use clap::{Arg, ArgMatches, Command, arg, command, crate_name};

mod cli;

const DEFAULT_URI: &str = "http://localhost:5000";

fn uri_arg() -> Arg {
    arg!(-u --uri <URI>)
        .default_value(DEFAULT_URI)
        .help("Imgpress server URI")
}

fn build_cli() -> Command {
    command!(crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand(Command::new(cli::VERSION_SUBCOMMAND).about(cli::VERSION_DESCRIPTION))
        .subcommand(Command::new(cli::BUGREPORT_SUBCOMMAND).about(cli::BUGREPORT_DESCRIPTION))
        .subcommand(Command::new(cli::SERVER_SUBCOMMAND).about(cli::SERVER_DESCRIPTION))
        .subcommand(
            Command::new(cli::UPLOAD_SUBCOMMAND)
                .about(cli::UPLOAD_DESCRIPTION)
                .arg(uri_arg())
                .arg(
                    arg!(-f --file <FILE>)
                        .required(true)
                        .help("Path to a JPEG, PNG or GIF image of at most 5MB"),
                ),
        )
        .subcommand(
            Command::new(cli::LIST_SUBCOMMAND)
                .about(cli::LIST_DESCRIPTION)
                .arg(uri_arg()),
        )
        .subcommand(
            Command::new(cli::DOWNLOAD_SUBCOMMAND)
                .about(cli::DOWNLOAD_DESCRIPTION)
                .arg(uri_arg())
                .arg(arg!(-i --id <ID>).required(true).help("Image id"))
                .arg(
                    arg!(-o --out <FILE>)
                        .required(false)
                        .help("Where to save the file. Defaults to the name suggested by the server"),
                ),
        )
        .subcommand(
            Command::new(cli::ANALYTICS_SUBCOMMAND)
                .about(cli::ANALYTICS_DESCRIPTION)
                .arg(uri_arg()),
        )
        .arg_required_else_help(true)
        .disable_version_flag(true)
}

fn uri(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("uri")
        .map_or(DEFAULT_URI, String::as_str)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = build_cli().get_matches();

    match cli.subcommand() {
        Some((cli::VERSION_SUBCOMMAND, _)) => {
            cli::version::run();
            ExitCode::SUCCESS
        }
        Some((cli::BUGREPORT_SUBCOMMAND, _)) => {
            cli::bugreport::run();
            ExitCode::SUCCESS
        }
        Some((cli::SERVER_SUBCOMMAND, _)) => cli::server::run().await,
        Some((cli::UPLOAD_SUBCOMMAND, m)) => {
            let file = m.get_one::<String>("file").map_or("", String::as_str);
            cli::client::upload(uri(m), file).await
        }
        Some((cli::LIST_SUBCOMMAND, m)) => cli::client::list(uri(m)).await,
        Some((cli::DOWNLOAD_SUBCOMMAND, m)) => {
            let id = m.get_one::<String>("id").map_or("", String::as_str);
            cli::client::download(uri(m), id, m.get_one::<String>("out")).await
        }
        Some((cli::ANALYTICS_SUBCOMMAND, m)) => cli::client::analytics(uri(m)).await,
        _ => ExitCode::SUCCESS,
    }
}
