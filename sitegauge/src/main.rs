use commands::command_argument_builder;
use sitegauge::handlers;
use sitegauge_core::print_banner;

mod commands;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    match chosen_command.subcommand() {
        Some(("init", primary_command)) => handlers::handle_init(primary_command),
        Some(("analyze", primary_command)) => handlers::handle_analyze(primary_command).await,
        Some(("batch", primary_command)) => handlers::handle_batch(primary_command).await,
        Some(("sites", primary_command)) => match primary_command.subcommand() {
            Some(("list", secondary_command)) => handlers::handle_sites_list(secondary_command),
            Some(("show", secondary_command)) => handlers::handle_sites_show(secondary_command),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
