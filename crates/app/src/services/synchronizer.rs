//! Synchronizer — the single authority over device writes.
//!
//! Every state change, whether it comes from an HTTP request or from the
//! reconciler's poll loop, goes through [`Synchronizer::apply`]. The device
//! link and the state cache live together behind one lock, so "compare,
//! send, await acknowledgement, record" runs as one unit and at most one
//! round-trip is ever in flight.
//!
//! The locked section runs on its own task. A caller that stops waiting (a
//! cancelled request, a timeout) only drops the result: the round-trip still
//! completes and the cache still reflects what the device confirmed.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinError;

use ledbridge_domain::error::{BridgeError, DeviceError, NotFoundError};
use ledbridge_domain::id::OutputId;
use ledbridge_domain::output::{LineState, Output};
use ledbridge_domain::protocol::Command;
use ledbridge_domain::time::Timestamp;

use crate::ports::DeviceLink;
use crate::registry::OutputRegistry;
use crate::state_cache::StateCache;

/// Successful result of [`Synchronizer::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The cache already held the desired state; nothing was sent.
    Unchanged,
    /// The device confirmed the command and the cache was advanced.
    Applied,
}

/// Per-line result of a batch.
#[derive(Debug)]
pub struct LineReport {
    pub output_id: OutputId,
    pub result: Result<ApplyOutcome, BridgeError>,
}

/// An output together with what the cache believes about it.
#[derive(Debug, Clone)]
pub struct OutputStatus {
    pub output: Output,
    /// `None` until the line's state is known.
    pub state: Option<LineState>,
    /// `None` for unknown and seeded states.
    pub confirmed_at: Option<Timestamp>,
}

/// Whether the serial channel is held, and where it points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub open: bool,
    pub endpoint: String,
}

/// The device link and the cache it keeps honest, guarded together.
struct Channel<L> {
    link: L,
    cache: StateCache,
}

impl<L: DeviceLink> Channel<L> {
    async fn reconcile(
        &mut self,
        output: &Output,
        desired: LineState,
    ) -> Result<ApplyOutcome, BridgeError> {
        if !self.link.is_open() {
            return Err(DeviceError::Unavailable.into());
        }

        if self.cache.observed(output.line) == Some(desired) {
            tracing::debug!(
                output = %output.id,
                line = %output.line,
                state = %desired,
                "already in desired state"
            );
            return Ok(ApplyOutcome::Unchanged);
        }

        let command = Command::new(output.line, desired);
        let acknowledgement = self.link.send(command).await?;

        match acknowledgement.into_result() {
            Ok(()) => {
                self.cache.record(output.line, desired);
                tracing::info!(
                    output = %output.id,
                    label = %output.label,
                    line = %output.line,
                    state = %desired,
                    "output updated"
                );
                Ok(ApplyOutcome::Applied)
            }
            Err(err) => {
                tracing::warn!(
                    output = %output.id,
                    line = %output.line,
                    state = %desired,
                    kind = err.kind(),
                    error = %err,
                    "command failed, cache left unchanged"
                );
                Err(err.into())
            }
        }
    }

    fn seed(&mut self, registry: &OutputRegistry) {
        self.cache.clear();
        for (line, state) in registry.initial_states() {
            self.cache.seed(line, state);
        }
    }
}

/// Serializes device writes and keeps the state cache in step with them.
pub struct Synchronizer<L> {
    registry: Arc<OutputRegistry>,
    channel: Arc<Mutex<Channel<L>>>,
}

impl<L: DeviceLink> Synchronizer<L> {
    /// Create a synchronizer over an (already opened or closed) link.
    ///
    /// The cache is seeded with the registry's initial states.
    pub fn new(registry: OutputRegistry, link: L) -> Self {
        let mut channel = Channel {
            link,
            cache: StateCache::new(),
        };
        channel.seed(&registry);

        Self {
            registry: Arc::new(registry),
            channel: Arc::new(Mutex::new(channel)),
        }
    }

    /// The catalogue this synchronizer drives.
    #[must_use]
    pub fn registry(&self) -> &OutputRegistry {
        &self.registry
    }

    /// Bring one output to `desired`, talking to the device only if needed.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::NotFound`] when `output_id` is not registered
    /// - [`BridgeError::Device`] with [`DeviceError::Unavailable`] when the
    ///   link is not open, or `Rejected` / `Timeout` / `Malformed` when the
    ///   device did not confirm; the cache is untouched in every case
    pub async fn apply(
        &self,
        output_id: OutputId,
        desired: LineState,
    ) -> Result<ApplyOutcome, BridgeError> {
        let output = self.registry.resolve(output_id)?.clone();
        let channel = Arc::clone(&self.channel);

        let task = tokio::spawn(async move {
            let mut channel = channel.lock_owned().await;
            channel.reconcile(&output, desired).await
        });

        task.await.unwrap_or_else(|err| Err(joined(err)))
    }

    /// Apply a batch. Lines are handled one after another and each gets its
    /// own report; a failure never stops the remaining lines.
    pub async fn apply_many(&self, desired: Vec<(OutputId, LineState)>) -> Vec<LineReport> {
        let mut reports = Vec::with_capacity(desired.len());
        for (output_id, state) in desired {
            let result = self.apply(output_id, state).await;
            reports.push(LineReport { output_id, result });
        }
        reports
    }

    /// Drive every registered output to the same state.
    pub async fn apply_all(&self, desired: LineState) -> Vec<LineReport> {
        let batch = self
            .registry
            .all()
            .iter()
            .map(|output| (output.id, desired))
            .collect();
        self.apply_many(batch).await
    }

    /// Every output with its cached state, in registry order.
    pub async fn snapshot(&self) -> Vec<OutputStatus> {
        let channel = self.channel.lock().await;
        self.registry
            .all()
            .iter()
            .map(|output| OutputStatus {
                output: output.clone(),
                state: channel.cache.observed(output.line),
                confirmed_at: channel.cache.confirmed_at(output.line),
            })
            .collect()
    }

    /// One output with its cached state.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when `output_id` is not registered.
    pub async fn status(&self, output_id: OutputId) -> Result<OutputStatus, NotFoundError> {
        let output = self.registry.resolve(output_id)?.clone();
        let channel = self.channel.lock().await;
        Ok(OutputStatus {
            state: channel.cache.observed(output.line),
            confirmed_at: channel.cache.confirmed_at(output.line),
            output,
        })
    }

    pub async fn device_status(&self) -> DeviceStatus {
        let channel = self.channel.lock().await;
        DeviceStatus {
            open: channel.link.is_open(),
            endpoint: channel.link.endpoint().to_string(),
        }
    }

    /// Close and reopen the serial channel.
    ///
    /// The microcontroller resets when the channel opens, so the cache is
    /// cleared and re-seeded with the registry's initial states.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unavailable`] when the channel cannot be opened;
    /// the link then stays closed.
    pub async fn reopen(&self) -> Result<(), BridgeError> {
        let channel = Arc::clone(&self.channel);
        let registry = Arc::clone(&self.registry);

        let task = tokio::spawn(async move {
            let mut channel = channel.lock_owned().await;
            channel.link.close().await;
            channel.cache.clear();
            channel.link.open().await?;
            channel.seed(&registry);
            tracing::info!(endpoint = channel.link.endpoint(), "device link reopened");
            Ok::<(), BridgeError>(())
        });

        task.await.unwrap_or_else(|err| Err(joined(err)))
    }

    /// Close the link. Waits for any in-flight round-trip first.
    pub async fn shutdown(&self) {
        let mut channel = self.channel.lock().await;
        channel.link.close().await;
    }
}

fn joined(err: JoinError) -> BridgeError {
    if err.is_panic() {
        std::panic::resume_unwind(err.into_panic());
    }
    tracing::error!(error = %err, "synchronizer task cancelled");
    DeviceError::Unavailable.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledbridge_domain::id::PhysicalLine;
    use ledbridge_domain::protocol::Acknowledgement;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Script {
        sent: std::sync::Mutex<Vec<Command>>,
        replies: std::sync::Mutex<VecDeque<Acknowledgement>>,
        in_flight: AtomicBool,
        overlaps: AtomicUsize,
        opens: AtomicUsize,
    }

    impl Script {
        fn reply(&self, ack: Acknowledgement) {
            self.replies.lock().unwrap().push_back(ack);
        }

        fn sent(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(Command::encode)
                .collect()
        }
    }

    struct ScriptedLink {
        script: Arc<Script>,
        open: bool,
        delay: Duration,
    }

    impl DeviceLink for ScriptedLink {
        fn endpoint(&self) -> &str {
            "scripted"
        }

        fn is_open(&self) -> bool {
            self.open
        }

        async fn open(&mut self) -> Result<(), DeviceError> {
            self.script.opens.fetch_add(1, Ordering::SeqCst);
            self.open = true;
            Ok(())
        }

        async fn send(&mut self, command: Command) -> Result<Acknowledgement, DeviceError> {
            if self.script.in_flight.swap(true, Ordering::SeqCst) {
                self.script.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            self.script.sent.lock().unwrap().push(command);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let reply = self
                .script
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Acknowledgement::Confirmed);
            self.script.in_flight.store(false, Ordering::SeqCst);
            Ok(reply)
        }

        async fn close(&mut self) {
            self.open = false;
        }
    }

    fn output(id: u32, line: u16, initial: Option<LineState>) -> Output {
        Output {
            id: OutputId::new(id),
            label: format!("LED {id}"),
            line: PhysicalLine::new(line),
            initial_state: initial,
        }
    }

    fn synchronizer_with(
        outputs: Vec<Output>,
        delay: Duration,
    ) -> (Synchronizer<ScriptedLink>, Arc<Script>) {
        let script = Arc::new(Script::default());
        let link = ScriptedLink {
            script: Arc::clone(&script),
            open: true,
            delay,
        };
        let registry = OutputRegistry::new(outputs).unwrap();
        (Synchronizer::new(registry, link), script)
    }

    /// Outputs 3, 5 and 7 on lines 3, 5 and 7; line 5 starts OFF.
    fn make_synchronizer() -> (Synchronizer<ScriptedLink>, Arc<Script>) {
        synchronizer_with(
            vec![
                output(3, 3, None),
                output(5, 5, Some(LineState::Off)),
                output(7, 7, None),
            ],
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn should_send_once_and_skip_repeated_request() {
        let (sync, script) = make_synchronizer();

        let first = sync.apply(OutputId::new(5), LineState::On).await.unwrap();
        let second = sync.apply(OutputId::new(5), LineState::On).await.unwrap();

        assert_eq!(first, ApplyOutcome::Applied);
        assert_eq!(second, ApplyOutcome::Unchanged);
        assert_eq!(script.sent(), vec!["ON:5\n"]);
        let status = sync.status(OutputId::new(5)).await.unwrap();
        assert_eq!(status.state, Some(LineState::On));
        assert!(status.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn should_skip_seeded_state_without_sending() {
        let (sync, script) = make_synchronizer();

        let outcome = sync.apply(OutputId::new(5), LineState::Off).await.unwrap();

        assert_eq!(outcome, ApplyOutcome::Unchanged);
        assert!(script.sent().is_empty());
    }

    #[tokio::test]
    async fn should_leave_cache_unchanged_when_rejected() {
        let (sync, script) = make_synchronizer();
        sync.apply(OutputId::new(7), LineState::On).await.unwrap();
        script.reply(Acknowledgement::Rejected("bad line".to_string()));

        let result = sync.apply(OutputId::new(7), LineState::Off).await;

        assert!(matches!(
            result,
            Err(BridgeError::Device(DeviceError::Rejected { ref detail })) if detail == "bad line"
        ));
        assert_eq!(script.sent(), vec!["ON:7\n", "OFF:7\n"]);
        let status = sync.status(OutputId::new(7)).await.unwrap();
        assert_eq!(status.state, Some(LineState::On));
    }

    #[tokio::test]
    async fn should_resend_after_timeout() {
        let (sync, script) = make_synchronizer();
        script.reply(Acknowledgement::Timeout);

        let first = sync.apply(OutputId::new(3), LineState::On).await;
        assert!(matches!(
            first,
            Err(BridgeError::Device(DeviceError::Timeout))
        ));
        assert_eq!(sync.status(OutputId::new(3)).await.unwrap().state, None);

        let retry = sync.apply(OutputId::new(3), LineState::On).await.unwrap();
        assert_eq!(retry, ApplyOutcome::Applied);
        assert_eq!(script.sent(), vec!["ON:3\n", "ON:3\n"]);
    }

    #[tokio::test]
    async fn should_report_malformed_reply() {
        let (sync, script) = make_synchronizer();
        script.reply(Acknowledgement::Malformed("???".to_string()));

        let result = sync.apply(OutputId::new(3), LineState::On).await;

        assert!(matches!(
            result,
            Err(BridgeError::Device(DeviceError::Malformed { .. }))
        ));
        assert_eq!(sync.status(OutputId::new(3)).await.unwrap().state, None);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_output() {
        let (sync, script) = make_synchronizer();

        let result = sync.apply(OutputId::new(42), LineState::On).await;

        assert!(matches!(result, Err(BridgeError::NotFound(_))));
        assert!(script.sent().is_empty());
    }

    #[tokio::test]
    async fn should_fail_fast_when_link_closed() {
        let (sync, script) = make_synchronizer();
        sync.shutdown().await;

        let result = sync.apply(OutputId::new(3), LineState::On).await;

        assert!(matches!(
            result,
            Err(BridgeError::Device(DeviceError::Unavailable))
        ));
        assert!(script.sent().is_empty());
        assert!(!sync.device_status().await.open);
    }

    #[tokio::test]
    async fn should_not_send_when_batch_matches_cache() {
        let (sync, script) = make_synchronizer();
        sync.apply(OutputId::new(3), LineState::On).await.unwrap();
        sync.apply(OutputId::new(7), LineState::Off).await.unwrap();
        let before = script.sent().len();

        let reports = sync
            .apply_many(vec![
                (OutputId::new(3), LineState::On),
                (OutputId::new(5), LineState::Off),
                (OutputId::new(7), LineState::Off),
            ])
            .await;

        assert_eq!(script.sent().len(), before);
        assert!(
            reports
                .iter()
                .all(|r| matches!(r.result, Ok(ApplyOutcome::Unchanged)))
        );
    }

    #[tokio::test]
    async fn should_keep_going_after_rejected_line_in_batch() {
        let (sync, script) = make_synchronizer();
        script.reply(Acknowledgement::Rejected("nope".to_string()));

        let reports = sync
            .apply_many(vec![
                (OutputId::new(3), LineState::On),
                (OutputId::new(7), LineState::On),
            ])
            .await;

        assert_eq!(script.sent(), vec!["ON:3\n", "ON:7\n"]);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].output_id, OutputId::new(3));
        assert!(matches!(
            reports[0].result,
            Err(BridgeError::Device(DeviceError::Rejected { .. }))
        ));
        assert!(matches!(reports[1].result, Ok(ApplyOutcome::Applied)));
    }

    #[tokio::test]
    async fn should_report_unknown_ids_per_line() {
        let (sync, _script) = make_synchronizer();

        let reports = sync
            .apply_many(vec![
                (OutputId::new(99), LineState::On),
                (OutputId::new(3), LineState::On),
            ])
            .await;

        assert!(matches!(reports[0].result, Err(BridgeError::NotFound(_))));
        assert!(matches!(reports[1].result, Ok(ApplyOutcome::Applied)));
    }

    #[tokio::test]
    async fn should_apply_all_in_registry_order() {
        let (sync, script) = make_synchronizer();

        let reports = sync.apply_all(LineState::On).await;

        assert_eq!(reports.len(), 3);
        assert_eq!(script.sent(), vec!["ON:3\n", "ON:5\n", "ON:7\n"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_never_overlap_round_trips_under_concurrency() {
        let outputs = (1..=8u16)
            .map(|n| output(u32::from(n), 100 + n, None))
            .collect();
        let (sync, script) = synchronizer_with(outputs, Duration::from_millis(5));
        let sync = Arc::new(sync);

        let handles: Vec<_> = (1..=8)
            .map(|id| {
                let sync = Arc::clone(&sync);
                tokio::spawn(async move { sync.apply(OutputId::new(id), LineState::On).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), ApplyOutcome::Applied);
        }

        assert_eq!(script.sent().len(), 8);
        assert_eq!(script.overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_finish_round_trip_when_caller_gives_up() {
        let (sync, script) = synchronizer_with(
            vec![output(3, 3, Some(LineState::Off))],
            Duration::from_millis(500),
        );

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            sync.apply(OutputId::new(3), LineState::On),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(script.sent(), vec!["ON:3\n"]);
        let status = sync.status(OutputId::new(3)).await.unwrap();
        assert_eq!(status.state, Some(LineState::On));
    }

    #[tokio::test]
    async fn should_reseed_cache_on_reopen() {
        let (sync, script) = make_synchronizer();
        sync.apply(OutputId::new(5), LineState::On).await.unwrap();
        sync.apply(OutputId::new(3), LineState::On).await.unwrap();

        sync.reopen().await.unwrap();

        assert_eq!(script.opens.load(Ordering::SeqCst), 1);
        let snapshot = sync.snapshot().await;
        let states: Vec<_> = snapshot.iter().map(|s| s.state).collect();
        assert_eq!(states, vec![None, Some(LineState::Off), None]);
        assert!(sync.device_status().await.open);
    }

    #[tokio::test]
    async fn should_list_snapshot_in_registry_order() {
        let (sync, _script) = make_synchronizer();

        let snapshot = sync.snapshot().await;

        let ids: Vec<u32> = snapshot.iter().map(|s| s.output.id.get()).collect();
        assert_eq!(ids, vec![3, 5, 7]);
        assert_eq!(snapshot[1].state, Some(LineState::Off));
        assert!(snapshot[1].confirmed_at.is_none());
    }
}
