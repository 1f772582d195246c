//! Recurring tick driving vacation announcements and the weekly hand-off.
//!
//! The scheduler wakes on a fixed interval and evaluates local wall-clock
//! time at date + hour + weekday granularity. Idempotence comes from
//! persistent state, not timing: vacation boundaries are guarded by the
//! per-interval announcement flags, the weekly hand-off by the last-trigger
//! date. State is committed (flag/position mutation plus a durable save)
//! before any notification attempt, so a delivery failure can never cause a
//! repeat announcement.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use rota_core::config::SchedulerConfig;
use rota_core::UserId;
use rota_notify::{mention, Notifier};
use rota_store::{StateDocument, StateStore};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::rotation;

/// Which boundary of a vacation interval crossed "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Start,
    End,
}

/// The recurring clock of the bot.
pub struct Scheduler {
    state: Arc<Mutex<StateDocument>>,
    store: Arc<StateStore>,
    notifier: Arc<dyn Notifier>,
    tick_interval: Duration,
    announce_hour: u32,
    handoff_weekday: Weekday,
    handoff_hour: u32,
}

impl Scheduler {
    pub fn new(
        state: Arc<Mutex<StateDocument>>,
        store: Arc<StateStore>,
        notifier: Arc<dyn Notifier>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            state,
            store,
            notifier,
            tick_interval: Duration::from_secs(config.tick_secs),
            announce_hour: config.announce_hour,
            handoff_weekday: config.handoff_weekday,
            handoff_hour: config.handoff_hour,
        }
    }

    /// Run the tick loop for the lifetime of the process.
    pub async fn run(self: Arc<Self>) {
        info!(
            tick_secs = self.tick_interval.as_secs(),
            "scheduler started"
        );
        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            interval.tick().await;
            let now = chrono::Local::now().naive_local();
            self.tick(now).await;
        }
    }

    /// Evaluate all triggers against a given instant.
    ///
    /// Callable directly with a synthetic `now` for deterministic tests.
    pub async fn tick(&self, now: NaiveDateTime) {
        let (chat_id, outbox) = {
            let mut doc = self.state.lock().await;
            let mut outbox = Vec::new();
            self.scan_vacations(&mut doc, now, &mut outbox);
            self.weekly_handoff(&mut doc, now, &mut outbox);
            (doc.chat_id, outbox)
        };

        if outbox.is_empty() {
            return;
        }
        let Some(chat_id) = chat_id else {
            debug!(
                pending = outbox.len(),
                "no notification chat configured, dropping announcements"
            );
            return;
        };
        for text in outbox {
            // Best-effort, single attempt: the state transition is already
            // durable, so a failed send must not be retried.
            if let Err(e) = self.notifier.send(chat_id, &text).await {
                warn!(
                    channel = self.notifier.channel_name(),
                    error = %e,
                    "announcement delivery failed"
                );
            }
        }
    }

    /// Fire pending vacation start/end announcements for `now`.
    ///
    /// A single-day vacation fires both boundaries on the same tick, start
    /// before end.
    fn scan_vacations(
        &self,
        doc: &mut StateDocument,
        now: NaiveDateTime,
        outbox: &mut Vec<String>,
    ) {
        if now.hour() != self.announce_hour {
            return;
        }
        let today = now.date();

        let mut pending: Vec<(UserId, Uuid, Boundary)> = Vec::new();
        for (owner, intervals) in doc.vacations.iter() {
            for iv in intervals {
                if !iv.announced_start && iv.start == today {
                    pending.push((owner, iv.id, Boundary::Start));
                }
                if !iv.announced_end && iv.end == today {
                    pending.push((owner, iv.id, Boundary::End));
                }
            }
        }

        for (owner, interval_id, boundary) in pending {
            match boundary {
                Boundary::Start => doc.vacations.mark_announced_start(interval_id),
                Boundary::End => doc.vacations.mark_announced_end(interval_id),
            }
            if let Err(e) = self.store.save(doc) {
                error!(
                    owner,
                    error = %e,
                    "state save failed, suppressing vacation announcement"
                );
                continue;
            }
            let who = display_ref(doc, owner);
            let text = match boundary {
                Boundary::Start => format!("{who} is off on vacation!"),
                Boundary::End => format!("{who} is back from vacation!"),
            };
            info!(owner, ?boundary, "vacation boundary announced");
            outbox.push(text);
        }
    }

    /// Fire the weekly duty hand-off at most once per trigger day.
    fn weekly_handoff(
        &self,
        doc: &mut StateDocument,
        now: NaiveDateTime,
        outbox: &mut Vec<String>,
    ) {
        if now.weekday() != self.handoff_weekday || now.hour() != self.handoff_hour {
            return;
        }
        let today = now.date();
        if doc.last_weekly_trigger == Some(today) {
            return;
        }

        let selected = rotation::advance(&mut doc.participants, &doc.vacations, today);
        // Stamped even when nobody was available, so the trigger cannot
        // retry within the same day.
        doc.last_weekly_trigger = Some(today);
        if let Err(e) = self.store.save(doc) {
            error!(error = %e, "state save failed, suppressing hand-off announcement");
            return;
        }

        match selected {
            Some(id) => {
                info!(user_id = id, "weekly duty hand-off");
                let who = display_ref(doc, id);
                outbox.push(format!("{who}, it is your duty week!"));
            }
            None => info!("weekly hand-off found no available participant"),
        }
    }
}

/// Mention link for a participant, falling back to the bare id for owners
/// no longer on the roster.
fn display_ref(doc: &StateDocument, id: UserId) -> String {
    match doc.participants.get(id) {
        Some(p) => mention(p.id, &p.display_name),
        None => mention(id, &id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rota_notify::NotifyError;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct RecordingNotifier {
        sent: std::sync::Mutex<Vec<(i64, String)>>,
        fail: AtomicBool,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                sent: std::sync::Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            }
        }

        fn sent(&self) -> Vec<(i64, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(NotifyError::Config("mock failure".to_string()));
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
        fn channel_name(&self) -> &str {
            "recording"
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
        d.and_hms_opt(hour, minute, 0).unwrap()
    }

    fn fixture(doc: StateDocument) -> (Arc<Scheduler>, Arc<Mutex<StateDocument>>, Arc<RecordingNotifier>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StateStore::new(dir.path().join("rota.json")));
        let state = Arc::new(Mutex::new(doc));
        let notifier = Arc::new(RecordingNotifier::new());
        let config = SchedulerConfig {
            tick_secs: 60,
            announce_hour: 10,
            handoff_weekday: Weekday::Mon,
            handoff_hour: 12,
        };
        let scheduler = Arc::new(Scheduler::new(
            state.clone(),
            store,
            notifier.clone(),
            &config,
        ));
        (scheduler, state, notifier, dir)
    }

    fn base_doc() -> StateDocument {
        let mut doc = StateDocument::default();
        doc.chat_id = Some(777);
        doc.participants.add(1, "Alice").unwrap();
        doc.participants.add(2, "Bob").unwrap();
        doc.participants.add(3, "Carol").unwrap();
        doc
    }

    // 2024-06-03 is a Monday.
    const MONDAY: (i32, u32, u32) = (2024, 6, 3);

    #[tokio::test]
    async fn vacation_start_fires_once_at_announce_hour() {
        let mut doc = base_doc();
        doc.vacations.add(2, date(2024, 6, 3), date(2024, 6, 7)).unwrap();
        let (scheduler, state, notifier, _dir) = fixture(doc);

        // Wrong hour: nothing fires.
        scheduler.tick(at(date(2024, 6, 3), 9, 59)).await;
        assert!(notifier.sent().is_empty());

        // Announce hour: fires and sets the flag.
        scheduler.tick(at(date(2024, 6, 3), 10, 0)).await;
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 777);
        assert!(sent[0].1.contains("Bob"));
        assert!(sent[0].1.contains("off on vacation"));
        assert!(state.lock().await.vacations.list_for(2)[0].announced_start);

        // Later tick within the same hour: no re-fire.
        scheduler.tick(at(date(2024, 6, 3), 10, 42)).await;
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn vacation_end_fires_on_end_date() {
        let mut doc = base_doc();
        doc.vacations.add(2, date(2024, 6, 3), date(2024, 6, 7)).unwrap();
        let id = doc.vacations.list_for(2)[0].id;
        doc.vacations.mark_announced_start(id);
        let (scheduler, state, notifier, _dir) = fixture(doc);

        scheduler.tick(at(date(2024, 6, 7), 10, 5)).await;
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("back from vacation"));
        assert!(state.lock().await.vacations.list_for(2)[0].announced_end);
    }

    #[tokio::test]
    async fn single_day_vacation_announces_start_then_end() {
        let mut doc = base_doc();
        doc.vacations.add(3, date(2024, 6, 5), date(2024, 6, 5)).unwrap();
        let (scheduler, state, notifier, _dir) = fixture(doc);

        scheduler.tick(at(date(2024, 6, 5), 10, 0)).await;
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].1.contains("off on vacation"));
        assert!(sent[1].1.contains("back from vacation"));

        let doc = state.lock().await;
        let iv = &doc.vacations.list_for(3)[0];
        assert!(iv.announced_start && iv.announced_end);
    }

    #[tokio::test]
    async fn weekly_handoff_fires_once_per_day() {
        let (scheduler, state, notifier, _dir) = fixture(base_doc());
        let monday = date(MONDAY.0, MONDAY.1, MONDAY.2);

        // Every minute of the hand-off hour: only the first tick fires.
        for minute in 0..5 {
            scheduler.tick(at(monday, 12, minute)).await;
        }
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Bob"));
        assert!(sent[0].1.contains("duty week"));

        let doc = state.lock().await;
        assert_eq!(doc.last_weekly_trigger, Some(monday));
        assert_eq!(doc.participants.position_of(2), Some(1));
    }

    #[tokio::test]
    async fn weekly_handoff_requires_weekday_and_hour() {
        let (scheduler, _state, notifier, _dir) = fixture(base_doc());

        // Monday at 11: wrong hour.
        scheduler.tick(at(date(2024, 6, 3), 11, 0)).await;
        // Tuesday at 12: wrong weekday.
        scheduler.tick(at(date(2024, 6, 4), 12, 0)).await;
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn weekly_handoff_stamps_date_even_without_candidates() {
        let mut doc = StateDocument::default();
        doc.chat_id = Some(777);
        doc.participants.add(1, "Alice").unwrap();
        doc.vacations.add(1, date(2024, 6, 1), date(2024, 6, 9)).unwrap();
        let (scheduler, state, notifier, _dir) = fixture(doc);

        let monday = date(2024, 6, 3);
        scheduler.tick(at(monday, 12, 0)).await;
        assert!(notifier.sent().is_empty());
        assert_eq!(state.lock().await.last_weekly_trigger, Some(monday));

        // Same day, later tick: the stamp prevents a retry.
        scheduler.tick(at(monday, 12, 30)).await;
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_commits_transition_without_retry() {
        let mut doc = base_doc();
        doc.vacations.add(2, date(2024, 6, 3), date(2024, 6, 7)).unwrap();
        let (scheduler, state, notifier, _dir) = fixture(doc);

        notifier.fail.store(true, Ordering::SeqCst);
        scheduler.tick(at(date(2024, 6, 3), 10, 0)).await;
        assert!(notifier.sent().is_empty());
        assert!(state.lock().await.vacations.list_for(2)[0].announced_start);

        // Channel recovers, but the announcement is gone for good.
        notifier.fail.store(false, Ordering::SeqCst);
        scheduler.tick(at(date(2024, 6, 3), 10, 1)).await;
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn no_configured_chat_commits_but_sends_nothing() {
        let mut doc = base_doc();
        doc.chat_id = None;
        doc.vacations.add(2, date(2024, 6, 3), date(2024, 6, 7)).unwrap();
        let (scheduler, state, notifier, _dir) = fixture(doc);

        scheduler.tick(at(date(2024, 6, 3), 10, 0)).await;
        assert!(notifier.sent().is_empty());
        assert!(state.lock().await.vacations.list_for(2)[0].announced_start);
    }

    #[tokio::test]
    async fn tick_persists_committed_state() {
        let mut doc = base_doc();
        doc.vacations.add(2, date(2024, 6, 3), date(2024, 6, 7)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StateStore::new(dir.path().join("rota.json")));
        let state = Arc::new(Mutex::new(doc));
        let notifier = Arc::new(RecordingNotifier::new());
        let config = SchedulerConfig {
            tick_secs: 60,
            announce_hour: 10,
            handoff_weekday: Weekday::Mon,
            handoff_hour: 12,
        };
        let scheduler = Scheduler::new(state.clone(), store.clone(), notifier, &config);

        scheduler.tick(at(date(2024, 6, 3), 10, 0)).await;

        // Reload from disk: the flag survived the process.
        let reloaded = store.load();
        assert!(reloaded.vacations.list_for(2)[0].announced_start);
    }
}
