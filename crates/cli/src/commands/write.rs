use crate::context::AppContext;
use crate::sanitize::sanitize_message;
use chrono::{DateTime, Utc};
use noticeboard_core::expiry::parse_expiry;
use noticeboard_core::{Error, NewNotice, NoticePatch, NoticeType, Result, SlotId};
use std::io::Write;

/// Optional fields of `noticeboard update`
#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    pub message: Option<String>,
    pub notice_type: Option<NoticeType>,
    pub expires: Option<String>,
    pub clear_expiry: bool,
}

fn parse_cli_expiry(
    ctx: &AppContext,
    raw: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    raw.map(|raw| parse_expiry(raw, now, ctx.registry.config().expiry_buffer()))
        .transpose()
}

pub async fn create<W: Write>(
    ctx: &AppContext,
    out: &mut W,
    id: Option<u32>,
    message: &str,
    notice_type: NoticeType,
    expires: Option<&str>,
) -> Result<()> {
    let now = Utc::now();
    let mut notice = NewNotice::new(sanitize_message(message), notice_type);
    notice.id = id;
    notice.expires_at = parse_cli_expiry(ctx, expires, now)?;

    let id = ctx.registry.create(notice, &ctx.caller, now).await?;
    writeln!(out, "Created notice #{id}")
        .map_err(|e| Error::file_system("<stdout>", "write output", e))?;
    Ok(())
}

pub async fn update<W: Write>(
    ctx: &AppContext,
    out: &mut W,
    id: SlotId,
    args: UpdateArgs,
) -> Result<()> {
    let now = Utc::now();
    let patch = NoticePatch {
        message: args.message.as_deref().map(sanitize_message),
        notice_type: args.notice_type,
        expires_at: parse_cli_expiry(ctx, args.expires.as_deref(), now)?,
        clear_expiry: args.clear_expiry,
    };

    let slot = ctx.registry.update(id, patch, &ctx.caller, now).await?;
    writeln!(out, "Updated notice #{}", slot.id)
        .map_err(|e| Error::file_system("<stdout>", "write output", e))?;
    Ok(())
}

pub async fn delete<W: Write>(ctx: &AppContext, out: &mut W, id: SlotId) -> Result<()> {
    ctx.registry.delete(id, &ctx.caller).await?;
    writeln!(out, "Deleted notice #{id}")
        .map_err(|e| Error::file_system("<stdout>", "write output", e))?;
    Ok(())
}

pub async fn delete_all<W: Write>(ctx: &AppContext, out: &mut W) -> Result<()> {
    let removed = ctx.registry.delete_all(&ctx.caller).await?;
    match removed {
        1 => writeln!(out, "Deleted 1 notice")
            .map_err(|e| Error::file_system("<stdout>", "write output", e))?,
        n => writeln!(out, "Deleted {n} notices")
            .map_err(|e| Error::file_system("<stdout>", "write output", e))?,
    }
    Ok(())
}
