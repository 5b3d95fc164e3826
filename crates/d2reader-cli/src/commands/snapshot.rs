//! One-shot reads.

use anyhow::{Result, bail};
use d2reader::prelude::*;
use d2reader::CollectSink;

fn attach_and_read(config: ReaderConfig) -> Result<(DataReader<SystemProcesses>, CollectSink)> {
    let mut reader = DataReader::new(SystemProcesses, config)?;
    let mut sink = CollectSink::new();
    match reader.tick(&mut sink)? {
        TickOutcome::InGame => Ok((reader, sink)),
        TickOutcome::Detached => bail!("Game process not found"),
        TickOutcome::NoGame => bail!("No game loaded"),
        TickOutcome::Failed => bail!("Game data could not be read, see the log"),
    }
}

/// Read one tick and print the data-read event as JSON
pub fn run(config: ReaderConfig) -> Result<()> {
    let (_, sink) = attach_and_read(config)?;
    if let Some(data) = sink.data_reads().last() {
        println!("{}", serde_json::to_string_pretty(data)?);
    }
    Ok(())
}

/// Print the items equipped in `slots`, or in every slot when empty
pub fn items(config: ReaderConfig, slots: &[BodyLocation]) -> Result<()> {
    let (reader, _) = attach_and_read(config)?;
    let slots: Vec<BodyLocation> = if slots.is_empty() {
        BodyLocation::equipment_slots().collect()
    } else {
        slots.to_vec()
    };

    let records = reader.read_items_in_slots(&slots)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
