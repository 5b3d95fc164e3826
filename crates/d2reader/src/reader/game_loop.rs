use tracing::{debug, info};

use crate::error::Result;
use crate::process::ProcessProvider;
use crate::reader::{DataReader, EventSink, ReaderControl, StopReason, TickOutcome};

impl<P: ProcessProvider> DataReader<P> {
    /// Poll until `control` stops the loop or the sink cancels.
    ///
    /// Each iteration sleeps for the polling rate first, then ticks. A stop
    /// or `poll_now` request interrupts the sleep; a tick already in progress
    /// finishes.
    pub fn run<S: EventSink>(&mut self, control: &ReaderControl, mut sink: S) -> Result<StopReason> {
        let rate = self.config().polling_rate();
        info!("Reader loop started");

        let mut last = None;
        let reason = loop {
            if let Some(reason) = control.sleep(rate) {
                break reason;
            }

            let outcome = match self.tick(&mut sink) {
                Ok(outcome) => outcome,
                Err(e) => {
                    info!("Reader loop cancelled");
                    return Err(e);
                }
            };

            if last != Some(outcome) {
                match outcome {
                    TickOutcome::Detached => info!("Waiting for the game process..."),
                    TickOutcome::NoGame => info!("Attached, waiting for a game"),
                    TickOutcome::InGame => info!("Reading game data"),
                    TickOutcome::Failed => debug!("Tick failed, retrying next interval"),
                }
                last = Some(outcome);
            }
        };

        info!("Reader loop stopped ({})", reason);
        Ok(reason)
    }
}
