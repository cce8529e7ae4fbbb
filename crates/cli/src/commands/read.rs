use crate::context::AppContext;
use crate::output::{render_json, render_slot, render_table};
use chrono::Utc;
use noticeboard_core::{Error, Result, Slot, SlotId};
use std::io::Write;

pub async fn list<W: Write>(ctx: &AppContext, out: &mut W, json: bool, all: bool) -> Result<()> {
    let now = Utc::now();
    let slots: Vec<Slot> = if all {
        ctx.registry.get_all().await?.into_values().collect()
    } else {
        ctx.registry.list_for_display(now).await?
    };

    if json {
        out.write_all(
            render_json(&slots)
                .map_err(|e| Error::json("render output", e))?
                .as_bytes(),
        )
        .map_err(|e| Error::file_system("<stdout>", "write output", e))?;
    } else {
        out.write_all(render_table(&slots, now).as_bytes())
            .map_err(|e| Error::file_system("<stdout>", "write output", e))?;
    }
    Ok(())
}

pub async fn get<W: Write>(ctx: &AppContext, out: &mut W, id: SlotId, json: bool) -> Result<()> {
    let slot = ctx
        .registry
        .get(id)
        .await?
        .ok_or(Error::SlotNotFound { id })?;

    if json {
        out.write_all(
            render_json(&slot)
                .map_err(|e| Error::json("render output", e))?
                .as_bytes(),
        )
        .map_err(|e| Error::file_system("<stdout>", "write output", e))?;
    } else {
        writeln!(out, "{}", render_slot(&slot, Utc::now()))
            .map_err(|e| Error::file_system("<stdout>", "write output", e))?;
    }
    Ok(())
}

pub async fn next_id<W: Write>(ctx: &AppContext, out: &mut W) -> Result<()> {
    match ctx.registry.next_free_id().await? {
        Some(id) => {
            writeln!(out, "{id}").map_err(|e| Error::file_system("<stdout>", "write output", e))?
        }
        None => writeln!(
            out,
            "none (all {} slots in use)",
            ctx.registry.config().max_slots
        )
        .map_err(|e| Error::file_system("<stdout>", "write output", e))?,
    }
    Ok(())
}
