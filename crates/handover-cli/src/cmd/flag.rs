use crate::output::{print_json, Table};
use anyhow::Context;
use clap::Subcommand;
use handover_core::config::Config;
use handover_core::{FlagStore, ParticipantId, SessionFlag};
use std::path::Path;

#[derive(Subcommand)]
pub enum FlagSubcommand {
    /// Read a flag (`all` lists every flag)
    Get { participant: String, flag: String },

    /// Write a flag for a limited time
    Set {
        participant: String,
        flag: String,
        /// Value to write
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        value: bool,
        /// Lifetime in minutes (default: orchestration.flag_ttl_minutes)
        #[arg(long)]
        ttl_minutes: Option<u32>,
    },

    /// Remove a flag
    Clear { participant: String, flag: String },
}

pub fn run(root: &Path, subcmd: FlagSubcommand, json: bool) -> anyhow::Result<()> {
    let store = super::open_store(root)?;
    match subcmd {
        FlagSubcommand::Get { participant, flag } => get(&store, &participant.into(), &flag, json),
        FlagSubcommand::Set {
            participant,
            flag,
            value,
            ttl_minutes,
        } => {
            let ttl = match ttl_minutes {
                Some(minutes) => chrono::Duration::minutes(i64::from(minutes)),
                None => Config::load(root)
                    .context("failed to load config")?
                    .orchestration
                    .flag_ttl(),
            };
            let flag: SessionFlag = flag.parse()?;
            let participant = ParticipantId::from(participant);
            store.set(&participant, flag, ttl, value)?;
            if json {
                print_json(&serde_json::json!({
                    "participant": participant,
                    "flag": flag,
                    "value": value,
                    "ttl_minutes": ttl.num_minutes(),
                }))
            } else {
                println!("{flag} = {value} for '{participant}' ({} min)", ttl.num_minutes());
                Ok(())
            }
        }
        FlagSubcommand::Clear { participant, flag } => {
            let flag: SessionFlag = flag.parse()?;
            let participant = ParticipantId::from(participant);
            store.clear(&participant, flag)?;
            if json {
                print_json(&serde_json::json!({
                    "participant": participant,
                    "flag": flag,
                    "value": null,
                }))
            } else {
                println!("Cleared {flag} for '{participant}'.");
                Ok(())
            }
        }
    }
}

fn get(
    store: &dyn FlagStore,
    participant: &ParticipantId,
    flag: &str,
    json: bool,
) -> anyhow::Result<()> {
    let flags: Vec<SessionFlag> = if flag == "all" {
        SessionFlag::all().to_vec()
    } else {
        vec![flag.parse()?]
    };

    let mut values = Vec::with_capacity(flags.len());
    for flag in flags {
        values.push((flag, store.get(participant, flag)?));
    }

    if json {
        let list: Vec<_> = values
            .iter()
            .map(|(flag, value)| {
                serde_json::json!({
                    "participant": participant,
                    "flag": flag,
                    "value": value,
                })
            })
            .collect();
        return print_json(&list);
    }

    let mut table = Table::new(&["FLAG", "VALUE"]);
    for (flag, value) in &values {
        table.row(vec![
            flag.to_string(),
            value.map(|v| v.to_string()).unwrap_or_else(|| "unset".to_string()),
        ]);
    }
    table.print();
    Ok(())
}
