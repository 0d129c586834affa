use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use client_core::{
    views::{
        breakdown, default_dashboard_range, default_reports_range, filter_leads, utc_today,
        FollowupAgenda,
    },
    ApiClient, SessionRestore, SqliteTokenStore,
};
use shared::{
    domain::{Lead, LeadId, LeadStatus, User, UserRole},
    protocol::{DateRange, FollowupUpdate, LeadDraft, LeadUpdate, NewUser},
};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url};

#[derive(Parser, Debug)]
#[command(name = "crm", about = "Command line client for the lead CRM backend")]
struct Cli {
    /// Backend endpoint; overrides crm.toml and CRM_ENDPOINT.
    #[arg(long)]
    endpoint: Option<String>,
    /// Where the session token is kept; overrides crm.toml and CRM_DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,
    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    #[command(subcommand)]
    Leads(LeadsCommand),
    #[command(subcommand)]
    Followups(FollowupsCommand),
    Dashboard(RangeArgs),
    Reports(RangeArgs),
    #[command(subcommand)]
    Users(UsersCommand),
}

#[derive(Subcommand, Debug)]
enum LeadsCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Create(LeadFields),
    Update {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        fields: LeadFields,
    },
}

#[derive(Args, Debug)]
struct LeadFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    #[arg(long, default_value = "Web Search")]
    source: String,
    #[arg(long)]
    course: String,
    #[arg(long)]
    city: String,
    #[arg(long, default_value = "New")]
    status: LeadStatus,
    #[arg(long)]
    next_followup: Option<NaiveDate>,
    #[arg(long)]
    remark: String,
}

impl From<LeadFields> for LeadDraft {
    fn from(value: LeadFields) -> Self {
        Self {
            student_name: value.name,
            phone: value.phone,
            source: value.source,
            course: value.course,
            city: value.city,
            status: value.status,
            next_followup_date: value.next_followup,
            remark: value.remark,
        }
    }
}

#[derive(Subcommand, Debug)]
enum FollowupsCommand {
    List,
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        remark: String,
        #[arg(long, default_value = "Follow-up")]
        status: LeadStatus,
        #[arg(long)]
        next_date: NaiveDate,
    },
}

#[derive(Args, Debug)]
struct RangeArgs {
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl RangeArgs {
    fn resolve(&self, default: DateRange) -> DateRange {
        DateRange::new(
            self.start.unwrap_or(default.start_date),
            self.end.unwrap_or(default.end_date),
        )
    }
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Counselor")]
        role: UserRole,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(endpoint) = cli.endpoint.clone() {
        settings.endpoint = endpoint;
    }
    if let Some(database_url) = cli.database_url.clone() {
        settings.database_url = database_url;
    }
    let database_url = normalize_database_url(&settings.database_url);

    let store = SqliteTokenStore::open(&database_url)
        .await
        .with_context(|| format!("failed to open session store at '{database_url}'"))?;
    let client = ApiClient::new(&settings.endpoint, Arc::new(store)).await?;

    run(&client, cli.command, cli.json).await
}

async fn run(client: &ApiClient, command: Command, json: bool) -> Result<()> {
    let today = utc_today();
    match command {
        Command::Login { email, password } => {
            let response = client.login(&email, &password).await?;
            match response.user {
                Some(user) => println!("Logged in as {} ({})", user.name, user.role.as_str()),
                None => println!("Logged in as {email}"),
            }
        }
        Command::Logout => {
            client.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => match client.restore_session().await? {
            SessionRestore::Restored(user) => print_user(&user, json)?,
            SessionRestore::Anonymous => println!("Not logged in"),
            SessionRestore::Rejected { reason } => {
                println!("Session no longer valid ({reason}); logged out")
            }
        },
        Command::Leads(LeadsCommand::List { search }) => {
            let leads = client.list_leads().await?;
            let shown = filter_leads(&leads, search.as_deref().unwrap_or_default());
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print_leads(&shown);
            }
        }
        Command::Leads(LeadsCommand::Create(fields)) => {
            let saved = client.create_lead(&fields.into()).await?;
            print_saved("lead created", &saved)?;
        }
        Command::Leads(LeadsCommand::Update { id, fields }) => {
            let update = LeadUpdate {
                lead_id: LeadId(id),
                fields: fields.into(),
            };
            let saved = client.update_lead(&update).await?;
            print_saved("lead updated", &saved)?;
        }
        Command::Followups(FollowupsCommand::List) => {
            let agenda = FollowupAgenda::partition(client.list_followups().await?, today);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "overdue": agenda.overdue,
                        "dueToday": agenda.due_today,
                    }))?
                );
            } else if agenda.is_empty() {
                println!("No follow-ups due");
            } else {
                println!("Overdue ({})", agenda.overdue.len());
                print_leads(&agenda.overdue.iter().collect::<Vec<_>>());
                println!("Due today ({})", agenda.due_today.len());
                print_leads(&agenda.due_today.iter().collect::<Vec<_>>());
            }
        }
        Command::Followups(FollowupsCommand::Update {
            id,
            remark,
            status,
            next_date,
        }) => {
            let saved = client
                .update_followup(&FollowupUpdate {
                    id: LeadId(id),
                    remark,
                    status,
                    next_followup_date: next_date,
                })
                .await?;
            print_saved("follow-up updated", &saved)?;
        }
        Command::Dashboard(range) => {
            let range = range.resolve(default_dashboard_range(today));
            let stats = client.dashboard(range).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{} .. {}", range.start_date, range.end_date);
                println!("Total leads     {}", stats.total_leads);
                println!("New leads       {}", stats.new_leads);
                println!("Follow-ups due  {}", stats.followups_due);
                println!("Converted       {}", stats.converted);
                println!("Dead            {}", stats.dead);
                println!("Conversion %    {}", stats.conversion_rate);
                println!("Counselor Performance");
                if stats.counselors.is_empty() {
                    println!("  No counselor activity for this period.");
                } else {
                    println!(
                        "  {:<24} {:>8} {:>9} {:>9}",
                        "Counselor", "Assigned", "Converted", "Conv Rate"
                    );
                }
                for counselor in &stats.counselors {
                    println!(
                        "  {:<24} {:>8} {:>9} {:>9}",
                        counselor.name, counselor.total, counselor.converted, counselor.rate
                    );
                }
            }
        }
        Command::Reports(range) => {
            let range = range.resolve(default_reports_range(today));
            let report = client.reports(range).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            for (title, counts) in [
                ("By status", &report.by_status),
                ("By source", &report.by_source),
                ("By course", &report.by_course),
            ] {
                println!("{title}");
                for (label, count, pct) in breakdown(counts) {
                    println!("  {label:<24} {count:>5} ({pct}%)");
                }
            }
            println!("Daily productivity");
            if report.daily_productivity.is_empty() {
                println!("  No activity recorded for this period.");
            }
            for day in &report.daily_productivity {
                println!(
                    "  {} {:<20} added={} updated={} converted={} dead={}",
                    day.date, day.counselor, day.added, day.updated, day.converted, day.dead
                );
            }
        }
        Command::Users(command) => {
            let current = require_user_admin(client).await?;
            tracing::debug!(admin = %current.id, "user administration");
            match command {
                UsersCommand::List => {
                    let users = client.list_users().await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&users)?);
                    } else {
                        for user in &users {
                            println!(
                                "{:<8} {:<24} {:<32} {:<10} {:?}",
                                user.id,
                                user.name,
                                user.email,
                                user.role.as_str(),
                                user.status
                            );
                        }
                    }
                }
                UsersCommand::Create {
                    name,
                    email,
                    password,
                    role,
                } => {
                    let saved = client
                        .create_user(&NewUser {
                            name,
                            email,
                            password,
                            role,
                        })
                        .await?;
                    print_saved("user created", &saved)?;
                }
            }
        }
    }
    Ok(())
}

/// Checks the caller without touching the stored session; only `whoami`
/// drops a token the backend no longer accepts.
async fn require_user_admin(client: &ApiClient) -> Result<User> {
    if client.token().await.is_none() {
        bail!("not logged in");
    }
    let user = client
        .current_user()
        .await
        .context("failed to confirm the current user")?;
    ensure_can_manage_users(user)
}

fn ensure_can_manage_users(user: User) -> Result<User> {
    if !user.role.can_manage_users() {
        bail!("{} is not allowed to manage users", user.email);
    }
    Ok(user)
}

fn print_user(user: &User, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        println!("{} <{}> {} {:?}", user.name, user.email, user.role.as_str(), user.status);
    }
    Ok(())
}

fn print_leads(leads: &[&Lead]) {
    for lead in leads {
        println!(
            "{:<8} {:<24} {:<14} {:<20} {:<10} {}",
            lead.id,
            lead.student_name,
            lead.phone,
            lead.course,
            lead.status.as_str(),
            lead.next_followup_day()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_saved(what: &str, data: &serde_json::Value) -> Result<()> {
    if data.is_null() {
        println!("{what}");
    } else {
        println!("{what}: {}", serde_json::to_string(data)?);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
