use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::state::DisplayState;
use crate::transport::TransportDriver;

/// Link flags shared between the dispatcher and whoever wants to observe it.
#[derive(Debug, Default)]
pub struct LinkStatus {
    ready: AtomicBool,
    in_flight: AtomicBool,
}

impl LinkStatus {
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the channel, `None` if a command is already in flight.
    fn begin_flight(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(self))
    }
}

struct InFlight<'a>(&'a LinkStatus);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: u64,
    pub failed: u64,
}

/// Periodically moves the head of the command queue to the device, one command at a time.
pub struct DispatchTask<C> {
    interval: std::time::Duration,
    cancellation_token: CancellationToken,
    state: Arc<Mutex<DisplayState>>,
    link: Arc<LinkStatus>,
    driver: TransportDriver<C>,
    stats: DispatchStats,
}

impl<C> DispatchTask<C>
where
    C: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        interval: std::time::Duration,
        cancellation_token: CancellationToken,
        state: Arc<Mutex<DisplayState>>,
        link: Arc<LinkStatus>,
        driver: TransportDriver<C>,
    ) -> Self {
        Self {
            interval,
            cancellation_token,
            state,
            link,
            driver,
            stats: DispatchStats::default(),
        }
    }

    pub async fn run(mut self) -> Result<DispatchStats, crate::error::Error> {
        let Some(ready) = self
            .cancellation_token
            .run_until_cancelled(self.driver.await_ready())
            .await
        else {
            tracing::info!("Cancelled while waiting for the device");
            return Ok(self.stats);
        };
        ready?;
        self.link.mark_ready();

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            let Some(_tick) = self
                .cancellation_token
                .run_until_cancelled(ticker.tick())
                .await
            else {
                tracing::info!("Ending dispatch loop");
                break;
            };

            self.tick().await;
        }

        let skipped = self.state.lock().await.skipped();
        tracing::info!(
            sent = self.stats.sent,
            failed = self.stats.failed,
            skipped,
            "Dispatch finished"
        );
        Ok(self.stats)
    }

    /// Only driven after the device signalled readiness.
    async fn tick(&mut self) {
        if !self.state.lock().await.has_pending() {
            return;
        }

        let Some(_in_flight) = self.link.begin_flight() else {
            return;
        };

        let (command, pending) = {
            let mut state = self.state.lock().await;
            (state.next_command(), state.pending())
        };
        let Some(command) = command else {
            return;
        };

        match self.driver.send(&command).await {
            Ok(()) => {
                self.stats.sent += 1;
                tracing::debug!(%command, pending, "Painted pixel");
            }
            Err(error) => {
                self.stats.failed += 1;
                tracing::warn!(%command, ?error, "Dropping command");
            }
        }
    }
}
