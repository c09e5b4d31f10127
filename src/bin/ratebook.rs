use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use ratebook::{Config, DataDir, Dataset, Filter, Period, Summary};

#[derive(Parser)]
#[command(name = "ratebook", about = "Billing summaries for logged project time")]
struct Cli {
    /// Data directory (default: $RATEBOOK_DATA_DIR or ~/.ratebook)
    #[arg(long)]
    data_dir: Option<std::path::PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hours and billing per client for a period
    Summary {
        /// Period (e.g. 2024-06, 2024-Q2, 2024, 30d); defaults to the current month
        #[arg(long)]
        period: Option<String>,
        /// Only projects of this client
        #[arg(long)]
        client: Option<String>,
        /// Only this project
        #[arg(long)]
        project: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Hourly rate a project bills at on a date
    Rate {
        project_id: String,
        /// Date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Full rate history of a project
    Rates {
        project_id: String,
        #[arg(long)]
        json: bool,
    },
    /// List projects with their current rate
    Projects {
        #[arg(long)]
        json: bool,
    },
    /// List clients
    Clients {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct RateAnswer<'a> {
    project_id: &'a str,
    date: NaiveDate,
    effective: String,
    hourly_rate: rust_decimal::Decimal,
}

#[derive(Serialize)]
struct ProjectRow<'a> {
    id: &'a str,
    name: &'a str,
    client_id: &'a str,
    hidden: bool,
    current_rate: rust_decimal::Decimal,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config::resolve(cli.data_dir.as_deref())?;
    let data = DataDir::open(&config.data_dir)?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Summary {
            period,
            client,
            project,
            json,
        } => {
            let period = match period {
                Some(s) => Period::parse(&s, today)?,
                None => Period::month_of(today),
            };
            let filter = Filter {
                client_id: client,
                project_id: project,
            };
            let summary = data.load(&period)?.summary(&filter);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary, &period);
            }
        }
        Commands::Rate {
            project_id,
            date,
            json,
        } => {
            let date = match date {
                Some(s) => ratebook::date_util::parse_date(&s)?,
                None => today,
            };
            let dataset = load_catalog(&data)?;
            let project = dataset.project(&project_id)?;
            let entry = ratebook::rates::resolve_entry(&project.rate_history, date);
            let answer = RateAnswer {
                project_id: &project.id,
                date,
                effective: entry.effective_date.to_string(),
                hourly_rate: entry.hourly_rate,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!(
                    "{} on {}: {}/h (rate effective {})",
                    project.name, answer.date, answer.hourly_rate, answer.effective
                );
            }
        }
        Commands::Rates { project_id, json } => {
            let dataset = load_catalog(&data)?;
            let project = dataset.project(&project_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&project.rate_history)?);
            } else {
                let current = project.rate_history.current_rate(today);
                let n = project.rate_history.len();
                println!(
                    "{} rate history ({} {})",
                    project.name,
                    n,
                    if n == 1 { "rate" } else { "rates" }
                );
                for entry in project.rate_history.entries() {
                    println!("  {:<10}  {}/h", entry.effective_date.to_string(), entry.hourly_rate);
                }
                println!("  Current: {current}/h");
            }
        }
        Commands::Projects { json } => {
            let dataset = load_catalog(&data)?;
            let rows: Vec<ProjectRow> = dataset
                .projects
                .iter()
                .map(|p| ProjectRow {
                    id: &p.id,
                    name: &p.name,
                    client_id: &p.client_id,
                    hidden: p.hidden,
                    current_rate: p.rate_history.current_rate(today),
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for r in &rows {
                    let hidden = if r.hidden { " (hidden)" } else { "" };
                    println!("{}  {}  {}/h{}", r.id, r.name, r.current_rate, hidden);
                }
            }
        }
        Commands::Clients { json } => {
            let clients = data.load_clients()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&clients)?);
            } else {
                for c in &clients {
                    println!("{}  {}", c.id, c.name);
                }
            }
        }
    }

    Ok(())
}

/// Clients and projects only; rate queries need no tasks.
fn load_catalog(data: &DataDir) -> anyhow::Result<Dataset> {
    Ok(Dataset {
        clients: data.load_clients()?,
        projects: data.load_projects()?,
        tasks: Vec::new(),
    })
}

fn hours_label(hours: rust_decimal::Decimal) -> &'static str {
    if hours == rust_decimal::Decimal::ONE {
        "hour"
    } else {
        "hours"
    }
}

fn print_summary(summary: &Summary, period: &Period) {
    println!("Summary: {period}");
    for client in &summary.clients {
        println!();
        println!("{}", client.display_name());
        for p in &client.projects {
            println!(
                "  {:<30} {:>8.2} {:<5} {:>10.2}",
                p.project_name,
                p.hours,
                hours_label(p.hours),
                p.billing
            );
        }
        println!(
            "  {:<30} {:>8.2} {:<5} {:>10.2}",
            "Subtotal",
            client.totals.hours,
            hours_label(client.totals.hours),
            client.totals.billing
        );
    }
    println!();
    println!("Hours:   {:.2} {}", summary.totals.hours, hours_label(summary.totals.hours));
    println!("Billing: {:.2}", summary.totals.billing);
}
