// Entrypoint for the snaps client.
// - Keeps `main` small: parse flags, build the API client and hand it to
//   the session loop.
// - Returns `anyhow::Result`; anything other than a server-reported failure
//   ends the program with the error chain.

use std::io::{self, IsTerminal};

use clap::Parser;
use snaps_cli::api::ApiClient;
use snaps_cli::cli::{init_logging, Cli};
use snaps_cli::session::{Session, SessionOptions};
use snaps_cli::ui::LineConsole;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut api = ApiClient::new(&cli.url)?.with_progress(io::stderr().is_terminal());
    info!(url = api.base_url(), "using service");

    let mut console = LineConsole::terminal();
    let options = SessionOptions {
        test_mode: cli.test,
        color: !cli.no_color && io::stdout().is_terminal(),
        chart_size: None,
    };

    // Blocks until the user cancels or input ends.
    Session::new(&mut api, &mut console, options).run()
}
