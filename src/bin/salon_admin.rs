//! Command-line admin dashboard over the appointments API.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use salon_server::{
    admin_view::{AdminEvent, AdminUi, Body, Screen, render},
    client::HttpAppointmentsApi,
    config::parse_offset,
    filter::{DatePreset, StatusFilter},
    models::{Appointment, AppointmentStatus},
    store::{AppointmentStore, RemoveOutcome},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the appointments API
    #[arg(long, env = "SALON_API_URL", default_value = "http://127.0.0.1:8080", global = true)]
    url: String,

    #[arg(long, env = "SALON_USERNAME", global = true)]
    username: Option<String>,

    #[arg(long, env = "SALON_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Offset used for "today", e.g. +02:00
    #[arg(long, env = "SALON_UTC_OFFSET", default_value = "+00:00", global = true)]
    utc_offset: String,

    /// Output JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List appointments
    ///
    /// Example: salon-admin list --status pending --preset week
    List {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "all")]
        preset: DatePreset,
        /// Exact day, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show pending/confirmed/completed/today counts
    Stats,
    /// Change an appointment's status
    ///
    /// Example: salon-admin set-status 6f1c... confirmed
    SetStatus { id: Uuid, status: AppointmentStatus },
    /// Delete an appointment
    Remove {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print the month grid
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        /// Start weeks on Monday
        #[arg(long)]
        monday: bool,
    },
    /// Booking analytics (owner accounts only)
    Analytics {
        #[arg(long, default_value = "month")]
        range: DatePreset,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let offset = parse_offset(&cli.utc_offset)?;

    let mut api = HttpAppointmentsApi::new(&cli.url);
    let (Some(username), Some(password)) = (&cli.username, &cli.password) else {
        anyhow::bail!("--username and --password (or SALON_USERNAME / SALON_PASSWORD) are required");
    };
    let login = api.login(username, password).await?;
    let role = login.data.user.role;

    let store = AppointmentStore::new(Arc::new(api));
    store.refresh().await?;

    let now = Utc::now().with_timezone(&offset);
    let ui = AdminUi::new(role, now.date_naive());
    let stats_only = matches!(cli.command, Command::Stats);

    let ui = match cli.command {
        Command::List { status, preset, date } => ui
            .reduce(AdminEvent::SetStatusFilter(status))
            .reduce(AdminEvent::SetDatePreset(preset))
            .reduce(AdminEvent::SetDateFilter(date)),
        Command::Stats => ui,
        Command::SetStatus { id, status } => {
            store.update_status(id, status).await?;
            println!("{id} is now {status}");
            return Ok(());
        }
        Command::Remove { id, yes } => {
            let confirm = |a: &Appointment| yes || prompt_removal(a);
            match store.remove(id, &confirm).await? {
                RemoveOutcome::Removed => println!("{id} removed"),
                RemoveOutcome::Declined => println!("kept {id}"),
            }
            return Ok(());
        }
        Command::Calendar { year, month, monday } => {
            let mut ui = ui.reduce(AdminEvent::ShowCalendar);
            ui.calendar_year = year.unwrap_or(now.year());
            ui.calendar_month = month.unwrap_or(now.month());
            if monday {
                ui.week_start = Weekday::Mon;
            }
            ui
        }
        Command::Analytics { range } => {
            let ui = ui
                .reduce(AdminEvent::SetAnalyticsRange(range))
                .reduce(AdminEvent::ShowAnalytics);
            if !ui.can_view_analytics() {
                anyhow::bail!("analytics are only available to the salon owner");
            }
            ui
        }
    };

    let screen = render(&ui, &store.snapshot().await, &now)?;
    print_screen(&screen, stats_only, cli.json)?;
    Ok(())
}

fn prompt_removal(a: &Appointment) -> bool {
    print!(
        "Delete {} for {} on {}? [y/N] ",
        a.service,
        a.client_name,
        a.start_time.format("%Y-%m-%d %H:%M")
    );
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}

fn print_screen(screen: &Screen, stats_only: bool, json: bool) -> anyhow::Result<()> {
    match &screen.body {
        Body::Loading => println!("loading..."),
        Body::Failed(msg) => anyhow::bail!("{msg}"),
        Body::Dashboard { stats, appointments } => {
            if json {
                let payload = if stats_only {
                    serde_json::to_value(stats)?
                } else {
                    serde_json::to_value(appointments)?
                };
                println!("{payload}");
            } else if stats_only {
                println!(
                    "total {} | pending {} | confirmed {} | completed {} | cancelled {} | today {}",
                    stats.total, stats.pending, stats.confirmed, stats.completed, stats.cancelled, stats.today
                );
            } else {
                for a in appointments {
                    println!(
                        "{} | {} | {} | {} | {} | {}",
                        a.id,
                        a.start_time.format("%Y-%m-%d %H:%M"),
                        a.status,
                        a.service,
                        a.client_name,
                        a.stylist.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
        Body::Calendar(grid) => {
            if json {
                println!("{}", serde_json::to_value(grid)?);
            } else {
                println!("{}-{:02}", grid.year, grid.month);
                for week in grid.cells.chunks(7) {
                    let row: Vec<String> = week
                        .iter()
                        .map(|c| {
                            let marker = if c.is_today { "*" } else { " " };
                            let booked = c.appointments.len() + c.overflow;
                            if !c.in_month {
                                "   .    ".to_string()
                            } else if booked == 0 {
                                format!("{marker}{:>2}     ", c.date.day())
                            } else {
                                format!("{marker}{:>2} ({booked})", c.date.day())
                            }
                        })
                        .collect();
                    println!("{}", row.join(" "));
                }
            }
        }
        Body::Analytics(report) => {
            if json {
                println!("{}", serde_json::to_value(report)?);
            } else {
                println!("range: {:?}, bookings: {}", report.range, report.status.total);
                println!(
                    "completed {:.0}% | cancelled {:.0}%",
                    report.completion_rate * 100.0,
                    report.cancellation_rate * 100.0
                );
                for s in &report.top_services {
                    println!("  {:<24} {}", s.service, s.count);
                }
                for s in &report.stylists {
                    println!("  {:<24} {} booked, {} completed", s.stylist, s.booked, s.completed);
                }
                if let Some(day) = report.busiest_day {
                    println!("busiest day: {day}");
                }
            }
        }
    }
    Ok(())
}
