#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::{Color, Colorize};
use duoconfig::DuoConfig;
use duolingo::{Credential, Duolingo, Error as DuolingoError, RefreshSummary};
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "duowatch", about = "A CLI for watching Duolingo progress")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show profile, streak and XP
    Summary,
    /// Show the weekly leaderboard cohort
    Leaderboard,
    /// List followed friends
    Friends,
    /// List friend streaks
    Streaks,
    /// Show quest and monthly-challenge progress
    Quests,
    /// Dump a view's raw payload as flattened dotted keys
    Raw {
        /// Which view: user, leaderboard, friends, streaks or quests
        view: String,
        /// Print only this dotted field instead of the whole payload
        #[arg(long)]
        field: Option<String>,
    },
    /// Poll continuously and print a summary after each refresh
    Watch {
        /// Minutes between refreshes (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },
}

async fn get_client() -> Result<(Duolingo, DuoConfig)> {
    let config = DuoConfig::load_or_onboard().with_context(|| "Failed to load duolingo config")?;
    let credential = match config.token() {
        Ok(token) => Credential::with_jwt(&config.username, token),
        Err(token_err) => match &config.password {
            Some(password) => Credential::with_password(&config.username, password),
            None => return Err(token_err).with_context(|| "No usable credential in config"),
        },
    };
    let client = Duolingo::login(credential).await.map_err(login_error)?;
    Ok((client, config))
}

fn login_error(err: DuolingoError) -> anyhow::Error {
    match &err {
        DuolingoError::Authentication(_) | DuolingoError::Captcha { .. } => anyhow::anyhow!(
            "{err}\nThe stored credential no longer works; grab a fresh jwt_token from a \
             logged-in browser session and update the config."
        ),
        DuolingoError::Remote { .. } | DuolingoError::NotFound(_) | DuolingoError::Http(_) => {
            anyhow::anyhow!("{err}\nDuolingo did not answer properly; try again later.")
        }
    }
}

/// A refresh that failed because of the credential cannot recover on its
/// own; anything else is a transient remote problem worth waiting out.
fn check_refresh(summary: &RefreshSummary) -> Result<()> {
    if summary.auth_failed() {
        anyhow::bail!(
            "The stored credential was rejected during refresh; update the jwt_token in the \
             config and restart."
        );
    }
    for (view, err) in summary.failed() {
        eprintln!("{}", format!("warning: {view} refresh failed: {err}").yellow());
    }
    Ok(())
}

fn print_summary(client: &Duolingo) {
    let user = &client.user;
    let check = if user.streak_extended_today() { "✓" } else { " " };
    let streak = format!("{} {} day streak", check, user.site_streak());
    let color = if user.streak_extended_today() {
        Color::Green
    } else {
        Color::Yellow
    };
    println!("{} ({})", user.fullname().bold(), client.username());
    println!("{}", streak.color(color));
    println!("XP today: {}   this week: {}", user.xp_today(), user.week_xp());
    println!(
        "Total XP: {}   gems: {}   daily goal: {}",
        user.total_xp(),
        user.gems(),
        user.daily_xp_goal()
    );
    for course in user.courses() {
        println!("  {:24} {:>8} XP", course.name, course.xp);
    }
}

fn print_leaderboard(client: &Duolingo) {
    let board = &client.leaderboard;
    println!(
        "{} league (week {} in tier)",
        board.tier_name().bold(),
        board.streak_in_tier()
    );
    for (index, entry) in board.ranking().iter().enumerate() {
        let position = index as i64 + 1;
        let line = format!(
            "{position:>3}. {:24} {:>6} XP{}",
            entry.display_name,
            entry.score,
            if entry.streak_extended_today { "  ✓" } else { "" }
        );
        if entry.user_id == client.user_id() {
            println!("{}", line.green().bold());
        } else {
            println!("{line}");
        }
    }
}

fn print_friends(client: &Duolingo) {
    for friend in client.friends.friends() {
        let active = if friend.is_currently_active { "●" } else { " " };
        println!(
            "{active} {:20} {:24} {:>8} XP",
            friend.username, friend.display_name, friend.total_xp
        );
    }
}

fn print_streaks(client: &Duolingo) {
    let streaks = client.friend_streaks.confirmed();
    if streaks.is_empty() {
        println!("No active friend streaks.");
        return;
    }
    for streak in streaks {
        let check = if streak.extended_today { "✓" } else { " " };
        println!(
            "{check} {:20} {:>4} days (since {})",
            streak.name, streak.length, streak.start_date
        );
    }
}

fn print_quests(client: &Duolingo) {
    let quest = client.quests.friend_quest();
    if quest.active {
        println!(
            "Friend quest with {}: {}/{} XP (you {}, them {})",
            quest.partner.name.bold(),
            quest.progress_total,
            quest.threshold,
            quest.me.total,
            quest.friend.total
        );
    } else {
        println!("No active friend quest.");
    }

    let challenge = client.quests.monthly_challenge();
    if challenge.threshold > 0 {
        println!(
            "{}: {}/{}",
            challenge.name.bold(),
            challenge.progress,
            challenge.threshold
        );
    } else {
        println!("No monthly challenge in progress.");
    }
}

fn print_raw(client: &Duolingo, view: &str, field: Option<&str>) -> Result<()> {
    let raw = match view {
        "user" => client.user.raw(),
        "leaderboard" => client.leaderboard.raw(),
        "friends" => client.friends.raw(),
        "streaks" => client.friend_streaks.raw(),
        "quests" => client.quests.raw(),
        other => anyhow::bail!(
            "unknown view '{other}'; expected user, leaderboard, friends, streaks or quests"
        ),
    };
    if let Some(path) = field {
        match duolingo::json::pluck(raw, path) {
            Some(value) => println!("{value}"),
            None => println!("null"),
        }
        return Ok(());
    }
    for (key, value) in duolingo::json::flatten(raw) {
        println!("{key} = {value}");
    }
    Ok(())
}

async fn watch(client: &mut Duolingo, config: &DuoConfig, interval: Option<u64>) -> Result<()> {
    let minutes = interval
        .unwrap_or_else(|| config.poll_interval_minutes())
        .max(duoconfig::MIN_POLL_INTERVAL_MINUTES);
    let period = Duration::from_secs(minutes * 60);
    println!("Refreshing every {minutes} min; Ctrl-C to stop.\n");
    loop {
        let summary = client.update().await;
        check_refresh(&summary)?;
        print_summary(client);
        println!();
        tokio::time::sleep(period).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Summary => {
            let (client, _) = get_client().await?;
            print_summary(&client);
        }
        Command::Leaderboard => {
            let (mut client, _) = get_client().await?;
            check_refresh(&client.update().await)?;
            print_leaderboard(&client);
        }
        Command::Friends => {
            let (mut client, _) = get_client().await?;
            check_refresh(&client.update().await)?;
            print_friends(&client);
        }
        Command::Streaks => {
            let (mut client, _) = get_client().await?;
            check_refresh(&client.update().await)?;
            print_streaks(&client);
        }
        Command::Quests => {
            let (mut client, _) = get_client().await?;
            check_refresh(&client.update().await)?;
            print_quests(&client);
        }
        Command::Raw { view, field } => {
            let (mut client, _) = get_client().await?;
            check_refresh(&client.update().await)?;
            print_raw(&client, &view, field.as_deref())?;
        }
        Command::Watch { interval } => {
            let (mut client, config) = get_client().await?;
            watch(&mut client, &config, interval).await?;
        }
    }
    Ok(())
}
