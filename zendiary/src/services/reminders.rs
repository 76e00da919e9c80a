//! Reminder scheduler
//!
//! A background ticker reads the reminder list and compares the wall clock
//! against it once a minute. The first active reminder whose `HH:MM`
//! matches raises a nudge banner. Weekday sets are stored but not applied.

use crate::database::Reminder;
use crate::error::Result;
use crate::services::persistence::PersistentStore;
use crate::services::settings::NudgeSettings;
use chrono::{DateTime, Local, Timelike, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

/// Zero-padded `HH:MM` of a time of day
pub fn clock_label<T: Timelike>(time: &T) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// First active reminder set for exactly `label`
pub fn due_reminder<'a>(reminders: &'a [Reminder], label: &str) -> Option<&'a Reminder> {
    reminders.iter().find(|r| r.active && r.time == label)
}

/// Source of the current time of day
pub trait Clock: Send + Sync + 'static {
    fn now_label(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_label(&self) -> String {
        clock_label(&Local::now())
    }
}

/// Where the scheduler reads the reminder list on every tick
pub trait ReminderSource: Send + Sync + 'static {
    fn reminders(&self) -> impl Future<Output = Result<Vec<Reminder>>> + Send;
}

/// The list a session publishes after each reminder mutation
impl ReminderSource for watch::Receiver<Vec<Reminder>> {
    async fn reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.borrow().clone())
    }
}

/// The stored list, so changes made by other processes are picked up
impl ReminderSource for PersistentStore {
    async fn reminders(&self) -> Result<Vec<Reminder>> {
        self.load_reminders().await
    }
}

/// A raised reminder notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nudge {
    pub reminder_id: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Nudge {
    pub fn for_reminder(reminder: &Reminder) -> Self {
        Self {
            reminder_id: reminder.id.clone(),
            message: format!("Time for your daily memory: {}", reminder.title),
            raised_at: Utc::now(),
        }
    }
}

/// Where nudges are rendered
pub trait NudgeSink: Send + Sync + 'static {
    fn show(&self, nudge: &Nudge);
    fn dismiss(&self, nudge: &Nudge);
    /// Best effort; hosts without a vibration motor ignore it
    fn vibrate(&self, millis: u32);
}

/// Writes nudges to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NudgeSink for LogSink {
    fn show(&self, nudge: &Nudge) {
        tracing::info!("{}", nudge.message);
    }

    fn dismiss(&self, nudge: &Nudge) {
        tracing::debug!("Dismissed nudge for reminder {}", nudge.reminder_id);
    }

    fn vibrate(&self, millis: u32) {
        tracing::debug!("Vibrate {}ms", millis);
    }
}

struct Slot {
    current: Option<Nudge>,
    generation: u64,
}

/// The pending auto-dismiss task, cancellable without the banner's async lock
#[derive(Default)]
struct DismissTimer(StdMutex<Option<AbortHandle>>);

impl DismissTimer {
    fn replace(&self, next: Option<AbortHandle>) {
        let mut timer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = std::mem::replace(&mut *timer, next) {
            previous.abort();
        }
    }

    fn cancel(&self) {
        self.replace(None);
    }
}

struct BannerInner<S> {
    sink: S,
    settings: NudgeSettings,
    slot: Mutex<Slot>,
    timer: Arc<DismissTimer>,
}

impl<S> Drop for BannerInner<S> {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}

/// Single-slot notification banner. A new nudge replaces the one on
/// screen; nothing is queued.
pub struct NudgeBanner<S: NudgeSink> {
    inner: Arc<BannerInner<S>>,
}

impl<S: NudgeSink> Clone for NudgeBanner<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: NudgeSink> NudgeBanner<S> {
    pub fn new(sink: S, settings: NudgeSettings) -> Self {
        Self {
            inner: Arc::new(BannerInner {
                sink,
                settings,
                slot: Mutex::new(Slot {
                    current: None,
                    generation: 0,
                }),
                timer: Arc::new(DismissTimer::default()),
            }),
        }
    }

    pub fn sink(&self) -> &S {
        &self.inner.sink
    }

    pub async fn current(&self) -> Option<Nudge> {
        self.inner.slot.lock().await.current.clone()
    }

    /// Show `nudge`, replacing whatever is on screen, and arm the auto-dismiss timer
    pub async fn raise(&self, nudge: Nudge) {
        let mut slot = self.inner.slot.lock().await;

        self.inner.timer.cancel();
        slot.generation += 1;
        let generation = slot.generation;

        self.inner.sink.show(&nudge);
        if let Some(millis) = self.inner.settings.vibration() {
            self.inner.sink.vibrate(millis);
        }
        slot.current = Some(nudge);

        let inner: Weak<BannerInner<S>> = Arc::downgrade(&self.inner);
        let after = self.inner.settings.dismiss_after();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let mut slot = inner.slot.lock().await;
            if slot.generation == generation {
                if let Some(nudge) = slot.current.take() {
                    inner.sink.dismiss(&nudge);
                }
            }
        });
        self.inner.timer.replace(Some(timer.abort_handle()));
    }

    /// Cancel the pending auto-dismiss; whatever is showing stays up
    pub fn close(&self) {
        self.inner.timer.cancel();
    }

    /// User dismissal. Returns the nudge that was showing, if any.
    pub async fn dismiss(&self) -> Option<Nudge> {
        let mut slot = self.inner.slot.lock().await;

        self.inner.timer.cancel();
        let nudge = slot.current.take()?;
        self.inner.sink.dismiss(&nudge);
        Some(nudge)
    }
}

/// Background reminder ticker; stops, along with its banner timer, when dropped
pub struct ReminderScheduler {
    handle: JoinHandle<()>,
    banner_timer: Arc<DismissTimer>,
}

impl ReminderScheduler {
    /// Start ticking every `tick`. The first comparison happens one tick after start.
    pub fn start<R, C, S>(source: R, banner: NudgeBanner<S>, clock: C, tick: Duration) -> Self
    where
        R: ReminderSource,
        C: Clock,
        S: NudgeSink,
    {
        let banner_timer = banner.inner.timer.clone();
        let handle = tokio::spawn(async move {
            tracing::info!("Starting reminder scheduler");

            let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let reminders = match source.reminders().await {
                    Ok(reminders) => reminders,
                    Err(e) => {
                        tracing::warn!("Could not read reminders: {}", e);
                        continue;
                    }
                };

                let label = clock.now_label();
                if let Some(reminder) = due_reminder(&reminders, &label) {
                    tracing::info!("Reminder {} due at {}", reminder.id, label);
                    banner.raise(Nudge::for_reminder(reminder)).await;
                }
            }
        });

        Self {
            handle,
            banner_timer,
        }
    }

    pub fn stop(&self) {
        self.handle.abort();
        self.banner_timer.cancel();
        tracing::info!("Reminder scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.handle.abort();
        self.banner_timer.cancel();
    }
}
