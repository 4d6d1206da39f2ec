//! `clawkit google …`: Gmail, Calendar and Drive calls printed as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;

use super::auth::oauth_client;
use crate::auth::GoogleService;
use crate::context::Toolkit;
use crate::error::{ClawError, Result};
use crate::google::calendar::PRIMARY_CALENDAR;
use crate::google::{
    api_for, CalendarClient, DriveClient, EventQuery, EventTime, GmailClient, GoogleApi, NewEvent,
    OutgoingMessage,
};

#[derive(Args, Debug)]
pub struct GoogleArgs {
    #[command(subcommand)]
    pub command: GoogleCommands,
}

#[derive(Subcommand, Debug)]
pub enum GoogleCommands {
    /// Gmail messages and labels
    Gmail(GmailArgs),
    /// Google Calendar events
    Calendar(CalendarArgs),
    /// Google Drive files
    Drive(DriveArgs),
}

#[derive(Args, Debug)]
pub struct GmailArgs {
    #[command(subcommand)]
    pub command: GmailCommands,
}

#[derive(Subcommand, Debug)]
pub enum GmailCommands {
    /// List message ids matching a search query
    List {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long, default_value_t = 10)]
        max: u32,
    },
    /// Fetch one message with its decoded text body
    Get { id: String },
    /// Send a plain-text message
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        cc: Option<String>,
    },
    /// Add or remove label ids on a message
    Modify {
        id: String,
        #[arg(long = "add")]
        add: Vec<String>,
        #[arg(long = "remove")]
        remove: Vec<String>,
    },
    /// Move a message to the trash
    Trash { id: String },
    /// List labels
    Labels,
}

#[derive(Args, Debug)]
pub struct CalendarArgs {
    #[command(subcommand)]
    pub command: CalendarCommands,
}

#[derive(Subcommand, Debug)]
pub enum CalendarCommands {
    /// List upcoming events
    List {
        #[arg(long, default_value = PRIMARY_CALENDAR)]
        calendar: String,
        /// RFC 3339 lower bound
        #[arg(long)]
        from: Option<String>,
        /// RFC 3339 upper bound
        #[arg(long)]
        to: Option<String>,
        #[arg(long, default_value_t = 10)]
        max: u32,
    },
    /// Create an event
    Create {
        #[arg(long)]
        summary: String,
        /// RFC 3339 timestamp, or YYYY-MM-DD with --all-day
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        all_day: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value = PRIMARY_CALENDAR)]
        calendar: String,
    },
    /// Patch an event with a JSON object
    Update {
        id: String,
        #[arg(long)]
        patch: String,
        #[arg(long, default_value = PRIMARY_CALENDAR)]
        calendar: String,
    },
    /// Delete an event
    Delete {
        id: String,
        #[arg(long, default_value = PRIMARY_CALENDAR)]
        calendar: String,
    },
    /// List calendars on the account
    Calendars,
}

#[derive(Args, Debug)]
pub struct DriveArgs {
    #[command(subcommand)]
    pub command: DriveCommands,
}

#[derive(Subcommand, Debug)]
pub enum DriveCommands {
    /// List files (Drive query syntax)
    List {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },
    /// File metadata
    Get { id: String },
    /// Print a file's text content (Google Docs are exported)
    Download { id: String },
    /// Upload a local text file
    Upload {
        /// Local file to upload
        file: PathBuf,
        /// Name in Drive (defaults to the local file name)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "text/plain")]
        mime: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Create a folder
    Mkdir {
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Delete a file
    Delete { id: String },
}

pub async fn handle(tk: &Toolkit, args: GoogleArgs) -> Result<()> {
    match args.command {
        GoogleCommands::Gmail(args) => {
            let client = GmailClient::new(api(tk, GoogleService::Gmail)?);
            gmail(client, args.command).await
        }
        GoogleCommands::Calendar(args) => {
            let client = CalendarClient::new(api(tk, GoogleService::Calendar)?);
            calendar(client, args.command).await
        }
        GoogleCommands::Drive(args) => {
            let client = DriveClient::new(api(tk, GoogleService::Drive)?);
            drive(client, args.command).await
        }
    }
}

fn api(tk: &Toolkit, service: GoogleService) -> Result<GoogleApi> {
    Ok(api_for(service, Arc::new(oauth_client(tk, service)?)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn gmail(client: GmailClient, command: GmailCommands) -> Result<()> {
    match command {
        GmailCommands::List { query, max } => {
            print_json(&client.list_messages(query.as_deref(), max).await?)
        }
        GmailCommands::Get { id } => print_json(&client.get_message(&id).await?),
        GmailCommands::Send {
            to,
            subject,
            body,
            cc,
        } => {
            let message = OutgoingMessage::builder()
                .to(to)
                .subject(subject)
                .body(body)
                .maybe_cc(cc)
                .build();
            print_json(&client.send_message(&message).await?)
        }
        GmailCommands::Modify { id, add, remove } => {
            print_json(&client.modify_labels(&id, &add, &remove).await?)
        }
        GmailCommands::Trash { id } => print_json(&client.trash_message(&id).await?),
        GmailCommands::Labels => print_json(&client.list_labels().await?),
    }
}

async fn calendar(client: CalendarClient, command: CalendarCommands) -> Result<()> {
    match command {
        CalendarCommands::List {
            calendar,
            from,
            to,
            max,
        } => {
            let query = EventQuery::builder()
                .calendar_id(calendar)
                .maybe_time_min(from)
                .maybe_time_max(to)
                .max_results(max)
                .build();
            print_json(&client.list_events(&query).await?)
        }
        CalendarCommands::Create {
            summary,
            start,
            end,
            all_day,
            description,
            location,
            calendar,
        } => {
            let (start, end) = if all_day {
                (EventTime::all_day(start), EventTime::all_day(end))
            } else {
                (EventTime::at(start), EventTime::at(end))
            };
            let event = NewEvent::builder()
                .summary(summary)
                .start(start)
                .end(end)
                .maybe_description(description)
                .maybe_location(location)
                .build();
            print_json(&client.create_event(&calendar, &event).await?)
        }
        CalendarCommands::Update {
            id,
            patch,
            calendar,
        } => {
            let patch: Value = serde_json::from_str(&patch)?;
            if !patch.is_object() {
                return Err(ClawError::Validation(
                    "--patch must be a JSON object".to_string(),
                ));
            }
            print_json(&client.update_event(&calendar, &id, &patch).await?)
        }
        CalendarCommands::Delete { id, calendar } => {
            client.delete_event(&calendar, &id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        CalendarCommands::Calendars => print_json(&client.list_calendars().await?),
    }
}

async fn drive(client: DriveClient, command: DriveCommands) -> Result<()> {
    match command {
        DriveCommands::List { query, page_size } => {
            print_json(&client.list_files(query.as_deref(), page_size).await?)
        }
        DriveCommands::Get { id } => print_json(&client.get_file(&id).await?),
        DriveCommands::Download { id } => {
            print!("{}", client.download_text(&id).await?);
            Ok(())
        }
        DriveCommands::Upload {
            file,
            name,
            mime,
            parent,
        } => {
            let content = tokio::fs::read_to_string(&file).await?;
            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        ClawError::Validation(format!("{} has no file name", file.display()))
                    })?,
            };
            print_json(
                &client
                    .upload_text(&name, &content, &mime, parent.as_deref())
                    .await?,
            )
        }
        DriveCommands::Mkdir { name, parent } => {
            print_json(&client.create_folder(&name, parent.as_deref()).await?)
        }
        DriveCommands::Delete { id } => {
            client.delete_file(&id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
