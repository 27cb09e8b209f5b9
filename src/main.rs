use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use labor_board::board::{Session, Submission};
use labor_board::config::{Args, BoardArgs, Command};
use labor_board::display::{print_board, write_board_to_file};
use labor_board::error::CsvSource;
use labor_board::form::check_roster_headers;
use labor_board::roster::{read_table_path, CsvTable};
use labor_board::snapshot::{save_snapshot, FileStore};
use labor_board::web;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn optional_table(path: &Option<std::path::PathBuf>, source: CsvSource) -> anyhow::Result<CsvTable> {
    match path {
        Some(path) => read_table_path(path, source)
            .with_context(|| format!("reading {} file {}", source, path.display())),
        None => Ok(CsvTable::default()),
    }
}

/// CLI mode: build the board from files on disk and print it
fn run_board(args: BoardArgs) -> anyhow::Result<()> {
    let roster = read_table_path(&args.roster, CsvSource::Roster)
        .with_context(|| format!("reading roster {}", args.roster.display()))?;
    check_roster_headers(&roster)?;

    let submission = Submission {
        roster,
        swaps: optional_table(&args.swap, CsvSource::Swap)?,
        vet_vto: optional_table(&args.vet, CsvSource::VetVto)?,
        labor_share: optional_table(&args.labor_share, CsvSource::LaborShare)?,
        date: args.date.clone(),
        shift: args.shift,
        site: args.site.clone(),
    };

    let mut session = Session::new();
    let outcome = session.submit(&submission);
    info!("Loaded {} badges (planned HC {})", outcome.badges, outcome.planned_hc);
    for notice in &outcome.notices {
        warn!("{}", notice);
    }

    for (key, count) in &args.assign {
        let edit = session.set_tile_count(key, *count)?;
        if let Some(warning) = edit.warning() {
            warn!("{}", warning);
        }
    }

    let summary = session.summary(args.planned_volume);
    print_board(session.view(), &summary)?;

    if let Some(out) = &args.out {
        write_board_to_file(session.view(), &summary, out)
            .map_err(|e| anyhow::anyhow!("writing {}: {}", out, e))?;
        info!("Board saved to {}", out);
    }

    if args.save {
        let mut store = FileStore::new(&args.data_dir);
        if save_snapshot(&mut store, &session.snapshot()) {
            info!("Snapshot saved in {}", args.data_dir.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Web(web_args) => {
            info!("Starting web server on {}:{}...", web_args.bind, web_args.port);
            info!("Access the board at http://localhost:{}", web_args.port);
            web::start_server(web_args.bind, web_args.port, web_args.data_dir).await?;
        }
        Command::Board(board_args) => run_board(board_args)?,
    }
    Ok(())
}
