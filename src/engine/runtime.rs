// src/engine/runtime.rs

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::hook::HostEvent;

use super::core::{EventDispatcher, Step};
use super::{RuntimeOptions, RuntimeSummary};

/// Async shell around [`EventDispatcher`]: reads events from the channel
/// and runs the periodic expiry sweep.
#[derive(Debug)]
pub struct HookRuntime {
    dispatcher: EventDispatcher,
    event_rx: mpsc::Receiver<HostEvent>,
    options: RuntimeOptions,
}

impl HookRuntime {
    pub fn new(
        dispatcher: EventDispatcher,
        event_rx: mpsc::Receiver<HostEvent>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            dispatcher,
            event_rx,
            options,
        }
    }

    /// Main event loop.
    ///
    /// Stops on a `Shutdown` event or when every sender is gone, and returns
    /// what was done.
    pub async fn run(self) -> RuntimeSummary {
        let Self {
            mut dispatcher,
            mut event_rx,
            options,
        } = self;

        info!(namespace = %dispatcher.hook().namespace(), "lineagehook runtime started");

        let mut sweep = options.eviction_interval.map(|period| {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });

        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        info!("event channel closed; exiting");
                        break;
                    };
                    debug!(?event, "runtime received event");
                    if dispatcher.dispatch(event).await == Step::Stop {
                        info!("shutdown requested; stopping runtime");
                        break;
                    }
                }
                _ = next_sweep(&mut sweep) => {
                    dispatcher.sweep().await;
                }
            }
        }

        let summary = dispatcher.summary();
        info!(%summary, "runtime exiting");
        summary
    }
}

async fn next_sweep(sweep: &mut Option<Interval>) {
    match sweep {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
