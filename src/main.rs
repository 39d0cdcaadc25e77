use clap::Parser;
use console::style;

use simprefs::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::run(cli) {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
}
