use clap::{Parser, Subcommand};
use client::input::MoveCommand;
use client::network::GameClient;
use client::rendering::{describe_result, render_board, render_leaderboard};
use log::{info, warn};
use shared::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scripted Minesweeper client", long_about = None)]
struct Args {
    /// Server hostname or IP address
    #[arg(short = 's', long, default_value = "127.0.0.1")]
    server: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(short, long)]
    username: String,

    #[arg(short = 'w', long)]
    password: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the leaderboard
    Leaderboard,
    /// Play one game using the given moves, e.g. `play "R A1" "P E5"`
    Play {
        #[arg(required = true)]
        moves: Vec<MoveCommand>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}:{}", args.server, args.port);
    println!("Waiting for open connection...");
    let mut client = GameClient::connect((args.server.as_str(), args.port))?;
    println!("Received connection.");

    if !client.login(&args.username, &args.password)? {
        println!("You entered either an incorrect username or password. Disconnecting.");
        return Ok(());
    }

    match args.command {
        Command::Leaderboard => {
            let rows = client.leaderboard()?;
            println!("{}", render_leaderboard(&rows));
        }
        Command::Play { moves } => play(&mut client, &moves)?,
    }

    client.quit()?;
    Ok(())
}

fn play(client: &mut GameClient, moves: &[MoveCommand]) -> Result<(), Box<dyn std::error::Error>> {
    let board = client.start_game()?;
    println!("{}", render_board(&board));

    for mv in moves {
        println!("> {:?} {}{}", mv.action, mv.row as char, mv.column);
        let outcome = client.make_move(mv.action, mv.row, mv.column)?;
        println!("{}", render_board(&outcome.board));
        if let Some(message) = describe_result(outcome.result, outcome.duration) {
            println!("{}", message);
        }
        if outcome.result.ends_game() {
            return Ok(());
        }
    }

    warn!("Moves exhausted before the game ended; leaving the game");
    client.quit_game()?;
    Ok(())
}
