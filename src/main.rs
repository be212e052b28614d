use std::path::PathBuf;
use std::process;

use boxbox::api::OpenF1Client;
use boxbox::roster::Roster;
use boxbox::ui;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Season year to analyze; prompted for when omitted
    #[arg(short, long)]
    season: Option<u32>,

    /// Race round number within the season; prompted for when omitted
    #[arg(short, long)]
    round: Option<u32>,

    /// Path to a roster JSON file mapping driver numbers to names
    #[arg(long)]
    roster: Option<PathBuf>,
}

fn main() {
    colog::init();

    let args = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let roster = match Roster::load(args.roster.as_deref()) {
        Ok(roster) => roster,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let client = OpenF1Client::default();
    if let Err(e) = ui::run(&client, &roster, args.season, args.round) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
