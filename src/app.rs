use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::engine::RedrawEvent;
use crate::engine::event::decode_batch;
use crate::host::Collaborators;
use crate::model::config::AppConfig;
use crate::model::mode::ModeState;
use crate::msg::Msg;
use crate::sync::{
    DropReason, Outcome, RedrawEventDispatcher, SelectionChangeHandler, SyncError,
};

/// Counters for one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub redraw_batches: u64,
    pub cursor_updates: u64,
    pub unbound_windows: u64,
    pub batches_sent: u64,
    pub selections_dropped: u64,
    pub transport_errors: u64,
}

/// One attached engine session: redraw handling in, selection mirroring out.
pub struct App {
    pub config: AppConfig,
    pub modes: Arc<ModeState>,
    dispatcher: RedrawEventDispatcher,
    selection: Arc<SelectionChangeHandler>,
    selection_tasks: JoinSet<Result<Outcome, SyncError>>,
    last_drop: Option<DropReason>,
    pub stats: SessionStats,
    pub should_quit: bool,
}

impl App {
    /// `host.modes` should observe the same state as `modes`.
    pub fn new(config: AppConfig, host: Collaborators, modes: Arc<ModeState>) -> Self {
        let selection = Arc::new(SelectionChangeHandler::new(
            host.clone(),
            config.sync.clone(),
        ));
        Self {
            config,
            modes,
            dispatcher: RedrawEventDispatcher::new(host),
            selection,
            selection_tasks: JoinSet::new(),
            last_drop: None,
            stats: SessionStats::default(),
            should_quit: false,
        }
    }

    pub fn dispatcher(&self) -> &RedrawEventDispatcher {
        &self.dispatcher
    }

    pub fn last_drop(&self) -> Option<DropReason> {
        self.last_drop
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub async fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Redraw(batch) => {
                let events = decode_batch(&batch);
                for event in &events {
                    if let RedrawEvent::ModeChange { mode, .. } = event {
                        self.modes.set(mode.clone());
                    }
                }
                let report = self.dispatcher.handle_events(&events);
                self.stats.redraw_batches += 1;
                self.stats.cursor_updates += report.scheduled as u64;
                self.stats.unbound_windows += report.unbound as u64;
            }
            Msg::SetMode(mode) => self.modes.set(mode),
            Msg::SelectionChanged(change) => {
                self.reap_selection_tasks();
                let handler = self.selection.clone();
                self.selection_tasks
                    .spawn(async move { handler.handle(change).await });
            }
            Msg::Settle => self.settle().await,
            Msg::Flush(done) => {
                self.settle().await;
                let _ = done.send(());
            }
            Msg::Quit => self.should_quit = true,
        }
        Ok(())
    }

    /// Handle messages until `Quit` arrives or every sender is gone.
    pub async fn run(&mut self, rx: &mut mpsc::UnboundedReceiver<Msg>) -> Result<()> {
        // ── Main event loop ──
        while let Some(first) = rx.recv().await {
            self.update(first).await?;

            // Batch-drain all pending messages
            while let Ok(msg) = rx.try_recv() {
                self.update(msg).await?;
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Wait until every cursor update and outgoing batch has completed.
    pub async fn settle(&mut self) {
        self.dispatcher.settle().await;
        while let Some(result) = self.selection_tasks.join_next().await {
            self.record_selection(result);
        }
    }

    /// Finish in-flight work, then drop all session state.
    pub async fn shutdown(&mut self) {
        self.settle().await;
        self.dispatcher.dispose();
        tracing::info!(
            "session closed: {} batches in, {} batches out, {} transport errors",
            self.stats.redraw_batches,
            self.stats.batches_sent,
            self.stats.transport_errors
        );
    }

    fn reap_selection_tasks(&mut self) {
        while let Some(result) = self.selection_tasks.try_join_next() {
            self.record_selection(result);
        }
    }

    fn record_selection(&mut self, result: Result<Result<Outcome, SyncError>, JoinError>) {
        match result {
            Ok(Ok(Outcome::Sent(_))) => self.stats.batches_sent += 1,
            Ok(Ok(Outcome::Dropped(reason))) => {
                self.stats.selections_dropped += 1;
                self.last_drop = Some(reason);
            }
            Ok(Err(err)) => {
                self.stats.transport_errors += 1;
                tracing::error!("selection sync failed: {err}");
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => tracing::error!("selection task panicked: {err}"),
        }
    }
}
