//! Scripted booking session
//!
//! Walks the form through an invalid submit, a date change, a valid submit
//! and a reset, printing what a view would render at each step.

use anyhow::Context;
use chrono::Days;
use std::sync::Arc;
use tablebook::{BookingConfig, BookingSession, BookingState, FieldUpdate, SubmitResult};
use tablebook_core::environment::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn render(state: &BookingState) {
    let draft = &state.draft;
    println!(
        "  date={:?} time={:?} guests={} name={:?} email={:?} phone={:?}",
        draft.date, draft.time, draft.guests, draft.name, draft.email, draft.phone
    );
    println!("  available: {}", draft.available_times.join(", "));
    for (field, message) in state.errors.iter() {
        println!("  ! {field}: {message}");
    }
    if let Some(message) = &state.submission_error {
        println!("  ! {message}");
    }
    if state.is_confirmed() {
        println!("  Reservation confirmed.");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tablebook=debug,tablebook_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BookingConfig::from_env();
    tracing::info!(
        endpoint = config.endpoint.as_deref().unwrap_or("simulated"),
        timeout_secs = config.submit_timeout_secs,
        "Starting booking session"
    );

    let session = BookingSession::from_config(&config, Arc::new(SystemClock));

    println!("=== Table booking ===");
    println!("Earliest date: {}", session.min_date());
    let occasions: Vec<&str> = session.occasions().iter().map(|o| o.label()).collect();
    println!("Occasions: {}", occasions.join(", "));

    println!("\n>>> Submit the empty form");
    if let SubmitResult::Invalid(errors) = session.submit().await? {
        println!("  {} field(s) need attention", errors.len());
    }
    render(&session.snapshot().await);

    let date = session
        .min_date()
        .checked_add_days(Days::new(7))
        .context("date out of range")?
        .format(tablebook::availability::DATE_FORMAT)
        .to_string();

    println!("\n>>> Pick {date}");
    session.change_date(date).await?;
    render(&session.snapshot().await);

    let time = session
        .read(|s| s.draft.available_times.first().cloned())
        .await
        .context("no time slots offered")?;

    println!("\n>>> Fill in the rest and submit");
    for update in [
        FieldUpdate::time(time),
        FieldUpdate::guests(4),
        FieldUpdate::occasion("anniversary"),
        FieldUpdate::name("Ada Lovelace"),
        FieldUpdate::email("ada@example.com"),
        FieldUpdate::phone("+44 20 7946 0000"),
    ] {
        session.update_field(update).await?;
    }

    match session.submit().await? {
        SubmitResult::Settled(outcome) => println!("  gateway: {}", outcome.label()),
        SubmitResult::Invalid(errors) => println!("  still invalid: {} field(s)", errors.len()),
        SubmitResult::Ignored => println!("  submit ignored"),
    }
    render(&session.snapshot().await);

    println!("\n>>> Book another table");
    session.reset().await?;
    render(&session.snapshot().await);

    session.shutdown().await?;
    Ok(())
}
