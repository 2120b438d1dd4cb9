//! Remote command execution.
//!
//! Side-effecting commands run and report nothing. Confirm and prompt answer
//! with one correlated response; timers, intervals and animation frames answer
//! once per firing. Pending timers are tokio tasks that post a firing back onto
//! the page's task queue, tracked by correlation id so they can be cancelled.
//! Each registration gets a fresh generation that travels with its firing, so
//! a firing queued by a replaced timer never answers for its successor.

use crate::events::EventRecord;
use crate::events::capture::now_millis;
use crate::host::Host;
use crate::protocol::{CorrelationId, RemoteCommand, WindowResponse};
use crate::runtime::{ClientRuntime, Flow, PageExit, Task};
use crate::session::SESSION_ID_KEY;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep as TokioSleep};

pub const ANIMATION_FRAME_DELAY: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Timeout,
    Interval,
    AnimationFrame,
}

/// Scheduled timers of one page, keyed by correlation id. Dropping aborts them all.
#[derive(Debug, Default)]
pub struct PendingHandles {
    handles: HashMap<(HandleKind, CorrelationId), (u64, AbortHandle)>,
    last_generation: u64,
}

impl PendingHandles {
    /// Reserve the generation for the next registration.
    pub fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    /// Track `handle`, aborting whatever was registered under the same id.
    pub fn register(&mut self, kind: HandleKind, id: CorrelationId, generation: u64, handle: AbortHandle) {
        if let Some((_, previous)) = self.handles.insert((kind, id), (generation, handle)) {
            previous.abort();
        }
    }

    /// Abort and forget. `false` when nothing was pending.
    pub fn cancel(&mut self, kind: HandleKind, id: &CorrelationId) -> bool {
        match self.handles.remove(&(kind, id.clone())) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Forget a one-shot handle that has fired. `false` when it was cancelled or
    /// replaced meanwhile.
    pub fn complete(&mut self, kind: HandleKind, id: &CorrelationId, generation: u64) -> bool {
        if self.generation(kind, id) != Some(generation) {
            return false;
        }
        self.handles.remove(&(kind, id.clone())).is_some()
    }

    /// Generation of the registration currently pending under `id`.
    pub fn generation(&self, kind: HandleKind, id: &CorrelationId) -> Option<u64> {
        self.handles.get(&(kind, id.clone())).map(|(generation, _)| *generation)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for PendingHandles {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.handles.drain() {
            handle.abort();
        }
    }
}

fn schedule_once(tasks: UnboundedSender<Task>, delay: Duration, task: Task) -> AbortHandle {
    TokioSpawn(async move {
        TokioSleep(delay).await;
        let _ = tasks.send(task);
    })
    .abort_handle()
}

fn schedule_every(
    tasks: UnboundedSender<Task>,
    period: Duration,
    id: CorrelationId,
    generation: u64,
) -> AbortHandle {
    TokioSpawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tasks.send(Task::IntervalFired(id.clone(), generation)).is_err() {
                break;
            }
        }
    })
    .abort_handle()
}

impl<H: Host> ClientRuntime<'_, H> {
    pub fn execute(&mut self, command: RemoteCommand) -> Flow {
        trace!("Executing {}", command.tag());
        match command {
            RemoteCommand::Alert(message) => self.host.alert(&message),
            RemoteCommand::Navigate(target) => {
                let url = match self.context.location.join(&target.path) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Cannot open {:?}: {e}", target.path);
                        return Flow::Continue;
                    }
                };
                self.host.open(&url, target.new_page);
                if !target.new_page {
                    return Flow::Exit(PageExit::Navigate(url));
                }
            }
            RemoteCommand::Confirm { message, id } => {
                let confirm_result = self.host.confirm(&message);
                self.respond(
                    "confirm",
                    WindowResponse::Confirm {
                        confirm_result,
                        confirm_id: id.to_string(),
                    },
                );
            }
            RemoteCommand::Prompt {
                message,
                default,
                id,
            } => {
                let prompt_result = self.host.prompt(&message, default.as_deref());
                self.respond(
                    "prompt",
                    WindowResponse::Prompt {
                        prompt_result,
                        prompt_id: id.to_string(),
                    },
                );
            }
            RemoteCommand::Close => {
                self.host.close();
                return Flow::Exit(PageExit::WindowClosed);
            }
            RemoteCommand::ScrollTo(scroll) => {
                self.window.scroll_to(&scroll);
                self.host
                    .scroll(self.window.scroll_x, self.window.scroll_y, scroll.behavior);
            }
            RemoteCommand::ScrollBy(scroll) => {
                self.window.scroll_by(&scroll);
                self.host
                    .scroll(self.window.scroll_x, self.window.scroll_y, scroll.behavior);
            }
            RemoteCommand::SetTimeout { id, delay_ms } => {
                let generation = self.handles.next_generation();
                let handle = schedule_once(
                    self.tasks.clone(),
                    Duration::from_millis(delay_ms),
                    Task::TimeoutFired(id.clone(), generation),
                );
                self.handles.register(HandleKind::Timeout, id, generation, handle);
            }
            RemoteCommand::SetInterval { id, interval_ms } => {
                let period = Duration::from_millis(interval_ms.max(1));
                let generation = self.handles.next_generation();
                let handle = schedule_every(self.tasks.clone(), period, id.clone(), generation);
                self.handles.register(HandleKind::Interval, id, generation, handle);
            }
            RemoteCommand::ClearTimeout(id) => self.cancel(HandleKind::Timeout, &id),
            RemoteCommand::ClearInterval(id) => self.cancel(HandleKind::Interval, &id),
            RemoteCommand::RequestAnimationFrame(id) => {
                let generation = self.handles.next_generation();
                let handle = schedule_once(
                    self.tasks.clone(),
                    ANIMATION_FRAME_DELAY,
                    Task::FrameFired(id.clone(), generation),
                );
                self.handles
                    .register(HandleKind::AnimationFrame, id, generation, handle);
            }
            RemoteCommand::CancelAnimationFrame(id) => self.cancel(HandleKind::AnimationFrame, &id),
            RemoteCommand::ReplaceLocalStorage(entries) => {
                info!("Replacing local storage ({} entries)", entries.len());
                self.context.local_storage.replace_all(entries);
            }
            RemoteCommand::ReplaceSessionStorage(entries) => self.replace_session_storage(entries),
        }
        Flow::Continue
    }

    fn cancel(&mut self, kind: HandleKind, id: &CorrelationId) {
        if !self.handles.cancel(kind, id) {
            debug!("No pending {kind:?} with id {id}");
        }
    }

    /// Clear and repopulate, keeping the stored session identifier as it was.
    fn replace_session_storage(&mut self, mut entries: BTreeMap<String, String>) {
        let session = &mut self.context.session_storage;
        match session.get(SESSION_ID_KEY).map(str::to_string) {
            Some(id) => {
                entries.insert(SESSION_ID_KEY.to_string(), id);
            }
            None => {
                entries.remove(SESSION_ID_KEY);
            }
        }
        info!("Replacing session storage ({} entries)", entries.len());
        session.replace_all(entries);
    }

    pub(crate) fn timeout_fired(&mut self, id: CorrelationId, generation: u64) {
        if !self.handles.complete(HandleKind::Timeout, &id, generation) {
            trace!("Timeout {id} no longer pending");
            return;
        }
        self.respond(
            "set_timeout",
            WindowResponse::Timeout {
                timeout_id: id.to_string(),
                timeout_executed: true,
            },
        );
    }

    pub(crate) fn interval_fired(&mut self, id: CorrelationId, generation: u64) {
        if self.handles.generation(HandleKind::Interval, &id) != Some(generation) {
            trace!("Interval {id} no longer pending");
            return;
        }
        self.respond(
            "set_interval",
            WindowResponse::Interval {
                interval_id: id.to_string(),
                interval_executed: true,
            },
        );
    }

    pub(crate) fn frame_fired(&mut self, id: CorrelationId, generation: u64) {
        if !self.handles.complete(HandleKind::AnimationFrame, &id, generation) {
            trace!("Animation frame {id} no longer pending");
            return;
        }
        self.respond(
            "request_animation_frame",
            WindowResponse::AnimationFrame {
                animation_frame_id: id.to_string(),
                animation_frame_executed: true,
                timestamp: now_millis(),
            },
        );
    }

    fn respond(&mut self, tag: &str, response: WindowResponse) {
        self.send(EventRecord::response(tag, response));
    }
}
