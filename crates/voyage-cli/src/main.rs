//! Voyage CLI - a command-line front end for the Voyage bus booking service.
//!
//! Every command goes through the core session layer, so a stored token is
//! reused across runs and an expired one signs the user out.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use voyage_core::auth::Identity;
use voyage_core::config::Config;
use voyage_core::repository::{DispatchOutcome, SeatRowCollection, StreamState};
use voyage_core::Voyage;

/// Time given to the background logout call before the process exits
const LOGOUT_GRACE_MS: u64 = 500;

const USAGE: &str = "\
Usage: voyage <command> [args]

Commands:
  login [email]                                   Sign in (password is prompted)
  register <first> <last> <email>                 Create an account
  logout                                          Sign out and forget the token
  whoami                                          Show the signed-in user
  schedules                                       List schedules
  trips <departure> <destination> <date>          Search trips
  seats <bus_id>                                  Show the seat layout
  reserve <trip_id> <pick> <drop> <seat,seat,..>  Reserve seats
  pay <url> <phone> <trip_id> <pick> <drop> <seat,seat,..>
  bookings                                        List bookings";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let mut config = Config::load().context("Failed to load config")?;
    let app = Voyage::from_config(&config)?;
    info!(command = %command, "Voyage CLI starting");

    match command.as_str() {
        "login" => login(&app, &mut config, args.get(1)).await?,
        "register" => register(&app, &mut config, &args[1..]).await?,
        "logout" => {
            app.session().sign_out();
            tokio::time::sleep(Duration::from_millis(LOGOUT_GRACE_MS)).await;
            println!("Signed out.");
        }
        "whoami" => whoami(&app).await,
        "schedules" => {
            let outcome = app.repository().load_schedules().await;
            print_json(outcome, app.repository().streams().schedules.get())?;
        }
        "trips" => {
            let [departure, destination, date] = take_args::<3>(&args[1..])?;
            let outcome = app
                .repository()
                .search_trips(departure, destination, date)
                .await;
            print_json(outcome, app.repository().streams().trips.get())?;
        }
        "seats" => {
            let [bus_id] = take_args::<1>(&args[1..])?;
            let outcome = app.repository().load_seats(parse_id(bus_id)?).await;
            print_seats(outcome, app.repository().streams().seats.get());
        }
        "reserve" => {
            let [trip_id, pick, drop, seats] = take_args::<4>(&args[1..])?;
            let outcome = app
                .repository()
                .reserve_seats(
                    parse_id(pick)?,
                    parse_id(drop)?,
                    parse_id(trip_id)?,
                    parse_seats(seats)?,
                )
                .await;
            print_json(outcome, app.repository().streams().pay_details.get())?;
        }
        "pay" => {
            let [url, phone, trip_id, pick, drop, seats] = take_args::<6>(&args[1..])?;
            let outcome = app
                .repository()
                .pay(
                    url,
                    phone,
                    parse_id(trip_id)?,
                    parse_id(pick)?,
                    parse_id(drop)?,
                    parse_seats(seats)?,
                )
                .await;
            match outcome {
                DispatchOutcome::Published => println!("Payment accepted."),
                other => report(other),
            }
        }
        "bookings" => {
            let outcome = app.repository().load_bookings().await;
            print_json(outcome, app.repository().streams().bookings.get())?;
        }
        _ => {
            eprintln!("{}", USAGE);
            bail!("Unknown command: {}", command);
        }
    }

    Ok(())
}

async fn login(app: &Voyage, config: &mut Config, email: Option<&String>) -> Result<()> {
    let email = match email.cloned().or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    println!("\nAuthenticating...");
    match app.session().sign_in(&email, &password).resolved().await {
        Some(Identity::User(user)) => {
            config.last_email = Some(email);
            config.save()?;
            println!("Welcome, {}!", user.display_name());
            Ok(())
        }
        _ => bail!("Login failed"),
    }
}

async fn register(app: &Voyage, config: &mut Config, args: &[String]) -> Result<()> {
    let [first_name, last_name, email] = take_args::<3>(args)?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;

    let handle = app
        .session()
        .sign_up(first_name, last_name, email, &password, &confirm);
    match handle.resolved().await {
        Some(Identity::User(user)) => {
            config.last_email = Some(email.to_string());
            config.save()?;
            println!("Account created. Welcome, {}!", user.display_name());
            Ok(())
        }
        _ => bail!("Registration failed"),
    }
}

async fn whoami(app: &Voyage) {
    let Some(handle) = app.session().current_user() else {
        println!("Not signed in.");
        return;
    };
    match handle.resolved().await {
        Some(Identity::User(user)) => println!("{} <{}>", user.display_name(), user.email),
        Some(Identity::Degraded { reason }) => println!("Could not load account: {}", reason),
        None => println!("Not signed in."),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn take_args<const N: usize>(args: &[String]) -> Result<[&str; N]> {
    if args.len() < N {
        eprintln!("{}", USAGE);
        bail!("Expected {} arguments, got {}", N, args.len());
    }
    Ok(std::array::from_fn(|i| args[i].as_str()))
}

fn parse_id(value: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("Invalid number: {}", value))
}

fn parse_seats(value: &str) -> Result<Vec<i64>> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_id(s.trim()))
        .collect()
}

fn report(outcome: DispatchOutcome) {
    match outcome {
        DispatchOutcome::NoSession => eprintln!("Not signed in. Run `voyage login` first."),
        DispatchOutcome::Unauthorized => {
            eprintln!("Session expired. Run `voyage login` to sign in again.")
        }
        DispatchOutcome::Rejected { status } => eprintln!("Request rejected ({})", status),
        DispatchOutcome::Failed => eprintln!("Unable to reach the server."),
        DispatchOutcome::Ignored { status } => eprintln!("Unexpected response ({})", status),
        DispatchOutcome::Published => {}
    }
}

fn print_json<T: serde::Serialize>(outcome: DispatchOutcome, state: StreamState<T>) -> Result<()> {
    if outcome != DispatchOutcome::Published {
        report(outcome);
        return Ok(());
    }
    if let Some(value) = state.value() {
        let value: Value = serde_json::to_value(value)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

fn print_seats(outcome: DispatchOutcome, state: StreamState<SeatRowCollection>) {
    if outcome != DispatchOutcome::Published {
        report(outcome);
        return;
    }
    let Some(rows) = state.value() else {
        return;
    };
    if rows.is_empty() {
        println!("No seats on this bus");
        return;
    }
    for row in rows.rows() {
        let line: Vec<String> = row
            .iter()
            .map(|seat| {
                let label = seat.number.clone().unwrap_or_else(|| seat.id.to_string());
                if seat.booked {
                    format!("[{:>4}x]", label)
                } else {
                    format!("[{:>5}]", label)
                }
            })
            .collect();
        println!("{}", line.join(" "));
    }
    println!("{} seats in {} rows", rows.seat_count(), rows.len());
}
