use crate::output::{print_json, Table};
use clap::Subcommand;
use handover_core::{OrchestrationRecord, ParticipantId, RecordStore, RedbStore};
use std::path::Path;

#[derive(Subcommand)]
pub enum RecordSubcommand {
    /// List every active orchestration, oldest first
    List,

    /// Show the participant's active orchestration
    Show { participant: String },

    /// List every orchestration of the participant, newest first
    History { participant: String },

    /// Close the participant's active orchestration
    End { participant: String },
}

pub fn run(root: &Path, subcmd: RecordSubcommand, json: bool) -> anyhow::Result<()> {
    let store = super::open_store(root)?;
    match subcmd {
        RecordSubcommand::List => list(&store, json),
        RecordSubcommand::Show { participant } => show(&store, &participant.into(), json),
        RecordSubcommand::History { participant } => history(&store, &participant.into(), json),
        RecordSubcommand::End { participant } => end(&store, &participant.into(), json),
    }
}

fn list(store: &RedbStore, json: bool) -> anyhow::Result<()> {
    let records = store.list_active()?;

    if json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No active orchestrations.");
        return Ok(());
    }

    let mut table = Table::new(&["PARTICIPANT", "BOT", "ACTIONS", "LOCKED", "UPDATED"]);
    for record in &records {
        table.row(vec![
            record.participant.to_string(),
            record.target_bot.bot_id.clone(),
            record.history.len().to_string(),
            if record.is_locked() { "yes" } else { "no" }.to_string(),
            record.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    table.print();
    Ok(())
}

fn show(store: &dyn RecordStore, participant: &ParticipantId, json: bool) -> anyhow::Result<()> {
    let Some(record) = store.get(participant)? else {
        anyhow::bail!("no active orchestration for '{participant}'");
    };

    if json {
        return print_json(&record);
    }

    println!("Record:      {}", record.id);
    println!("Participant: {}", record.participant);
    println!("Bot:         {} ({})", record.target_bot.label, record.target_bot.bot_id);
    println!("Connector:   {}", record.target_metadata.connector);
    println!("Locked:      {}", if record.is_locked() { "yes" } else { "no" });
    println!("Started:     {}", record.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Updated:     {}", record.updated_at.format("%Y-%m-%d %H:%M:%S"));
    println!("\nHistory ({}):", record.history.len());
    for (i, action) in record.history.iter().enumerate() {
        let text = action.text().unwrap_or("<non-text action>");
        let lock = if action.metadata.orchestration_lock {
            " [locked]"
        } else {
            ""
        };
        println!("  {:>3}. {text}{lock}", i + 1);
    }
    Ok(())
}

fn history(store: &dyn RecordStore, participant: &ParticipantId, json: bool) -> anyhow::Result<()> {
    let records = store.list(participant)?;

    if json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No orchestrations for '{participant}'.");
        return Ok(());
    }

    let mut table = Table::new(&["ID", "BOT", "STATUS", "ACTIONS", "STARTED", "CLOSED"]);
    for record in &records {
        table.row(row(record));
    }
    table.print();
    Ok(())
}

fn row(record: &OrchestrationRecord) -> Vec<String> {
    vec![
        record.id.to_string(),
        record.target_bot.bot_id.clone(),
        record.status.to_string(),
        record.history.len().to_string(),
        record.created_at.format("%Y-%m-%d %H:%M").to_string(),
        record
            .closed_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]
}

fn end(store: &dyn RecordStore, participant: &ParticipantId, json: bool) -> anyhow::Result<()> {
    let closed = store.end(participant)?;

    if json {
        return print_json(&serde_json::json!({
            "participant": participant,
            "closed": closed,
        }));
    }

    if closed == 0 {
        println!("No active orchestration for '{participant}'.");
    } else {
        println!("Closed orchestration for '{participant}'.");
    }
    Ok(())
}
