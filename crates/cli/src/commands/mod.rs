use crate::context::AppContext;
use clap::Subcommand;
use noticeboard_core::{NoticeType, Result, SlotId};
use std::io::Write;

pub mod read;
pub mod write;

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the notices that are currently live
    #[command(visible_alias = "ls")]
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Include expired notices and leave them in place
        #[arg(long)]
        all: bool,
    },

    /// Show one notice
    Get {
        /// Slot number; 0 is the legacy slot
        id: SlotId,

        /// Print JSON instead of a table row
        #[arg(long)]
        json: bool,
    },

    /// Add a notice
    Create {
        /// Slot to use instead of the lowest free one
        #[arg(long)]
        id: Option<u32>,

        /// Text of the notice
        #[arg(short, long)]
        message: String,

        /// One of info, success, warning, error
        #[arg(short = 't', long = "type", default_value = "warning")]
        notice_type: NoticeType,

        /// Expiry as "YYYY-MM-DD HH:MM:SS" in UTC
        #[arg(short, long)]
        expires: Option<String>,
    },

    /// Change fields of an existing notice
    Update {
        /// Slot number; 0 is the legacy slot
        id: SlotId,

        #[arg(short, long)]
        message: Option<String>,

        #[arg(short = 't', long = "type")]
        notice_type: Option<NoticeType>,

        /// New expiry as "YYYY-MM-DD HH:MM:SS" in UTC
        #[arg(short, long, conflicts_with = "clear_expiry")]
        expires: Option<String>,

        /// Make the notice permanent
        #[arg(long)]
        clear_expiry: bool,
    },

    /// Remove one notice
    #[command(visible_alias = "rm")]
    Delete {
        /// Slot number; 0 is the legacy slot
        id: SlotId,
    },

    /// Remove every notice, the legacy one included
    DeleteAll,

    /// Print the slot the next `create` without `--id` would take
    NextId,
}

impl Commands {
    pub async fn execute<W: Write>(self, ctx: &AppContext, out: &mut W) -> Result<()> {
        match self {
            Commands::List { json, all } => read::list(ctx, out, json, all).await,
            Commands::Get { id, json } => read::get(ctx, out, id, json).await,
            Commands::NextId => read::next_id(ctx, out).await,
            Commands::Create {
                id,
                message,
                notice_type,
                expires,
            } => write::create(ctx, out, id, &message, notice_type, expires.as_deref()).await,
            Commands::Update {
                id,
                message,
                notice_type,
                expires,
                clear_expiry,
            } => {
                let args = write::UpdateArgs {
                    message,
                    notice_type,
                    expires,
                    clear_expiry,
                };
                write::update(ctx, out, id, args).await
            }
            Commands::Delete { id } => write::delete(ctx, out, id).await,
            Commands::DeleteAll => write::delete_all(ctx, out).await,
        }
    }
}
