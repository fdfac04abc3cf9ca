//! Tick-driven event scheduler.
//!
//! Actions are queued against a logical tick deadline and dispatched in
//! passes: a pass collects every action whose deadline has passed and runs
//! all of them before the next deadline is looked at. Time advances either
//! logically (jumping straight to the next deadline, see
//! [`EventScheduler::advance`]) or against the wall clock
//! ([`EventScheduler::run`]), where one tick lasts `1 / target_tick_rate`
//! seconds.
//!
//! Actions receive the simulation context and the scheduler itself, so a
//! repeating or chained action can register follow-ups without any
//! coroutine machinery.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use hecs::Entity;
use tracing::{debug, warn};

use crate::config::SimConfig;

/// Logical simulation time, in ticks.
pub type Tick = u64;

/// One-shot action.
pub type OnceAction<C> = Box<dyn FnOnce(&mut C, &mut EventScheduler<C>)>;
/// Body of a repeating action.
pub type RepeatAction<C> = Box<dyn FnMut(&mut C, &mut EventScheduler<C>)>;
/// Stop condition of a repeating action, checked after every run.
pub type Until<C> = Box<dyn Fn(&C) -> bool>;

// =============================================================================
// GAME CLOCK
// =============================================================================

/// Logical clock (in ticks)
#[derive(Debug, Clone)]
pub struct GameClock {
    pub tick: Tick,
}

impl GameClock {
    pub fn new() -> Self {
        Self { tick: 0 }
    }

    /// Advance time to the given tick
    pub fn advance_to(&mut self, tick: Tick) {
        debug_assert!(
            tick >= self.tick,
            "Cannot go backwards in time: {} -> {}",
            self.tick,
            tick
        );
        self.tick = tick;
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TASKS
// =============================================================================

/// Cancellable reference to a scheduled action.
///
/// A repeating action keeps the same handle across all of its runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

enum TaskKind<C> {
    Once(OnceAction<C>),
    Repeating {
        action: RepeatAction<C>,
        interval: Tick,
        until: Option<Until<C>>,
    },
}

struct Task<C> {
    owner: Option<Entity>,
    deadline: Tick,
    kind: TaskKind<C>,
}

/// Heap entry. Entries whose task was cancelled are skipped lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledDeadline {
    deadline: Tick,
    seq: u64,
    handle: TaskHandle,
}

impl PartialOrd for ScheduledDeadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledDeadline {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior (earliest deadline first,
        // then submission order)
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// The task currently executing inside a dispatch pass.
struct RunningTask {
    handle: TaskHandle,
    owner: Option<Entity>,
    cancelled: bool,
}

/// Wall-clock origin of tick 0 while [`EventScheduler::run`] is active.
#[derive(Debug, Clone, Copy)]
struct WallAnchor {
    epoch: Instant,
}

/// Counts dispatch passes and reports the achieved rate once per second.
struct PassCounter {
    count: u64,
    since: Instant,
}

impl PassCounter {
    fn new(now: Instant) -> Self {
        Self { count: 0, since: now }
    }

    fn record(&mut self, now: Instant) {
        self.count += 1;
        let elapsed = now.saturating_duration_since(self.since);
        if elapsed >= Duration::from_secs(1) {
            debug!(
                passes_per_sec = self.count as f64 / elapsed.as_secs_f64(),
                "dispatch loop rate"
            );
            self.count = 0;
            self.since = now;
        }
    }
}

// =============================================================================
// EVENT SCHEDULER
// =============================================================================

/// Dispatches delayed and repeating actions against a context `C`.
pub struct EventScheduler<C> {
    clock: GameClock,
    tick_duration: Duration,
    overrun_tolerance: Duration,
    queue: BinaryHeap<ScheduledDeadline>,
    tasks: HashMap<TaskHandle, Task<C>>,
    next_handle: u64,
    next_seq: u64,
    running: Option<RunningTask>,
    wall: Option<WallAnchor>,
    overruns: u64,
    last_pass: Option<Tick>,
}

impl<C: 'static> EventScheduler<C> {
    pub fn new(tick_duration: Duration, overrun_tolerance: Duration) -> Self {
        Self {
            clock: GameClock::new(),
            tick_duration,
            overrun_tolerance,
            queue: BinaryHeap::new(),
            tasks: HashMap::new(),
            next_handle: 0,
            next_seq: 0,
            running: None,
            wall: None,
            overruns: 0,
            last_pass: None,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.tick_duration(), config.overrun_tolerance())
    }

    /// Current logical tick.
    pub fn now(&self) -> Tick {
        self.clock.tick
    }

    /// Run `action` once, `delay` ticks from now.
    pub fn schedule_once(
        &mut self,
        delay: Tick,
        action: impl FnOnce(&mut C, &mut Self) + 'static,
    ) -> TaskHandle {
        self.insert(None, delay, TaskKind::Once(Box::new(action)))
    }

    /// Like [`Self::schedule_once`], but torn down by [`Self::cancel_owned_by`].
    pub fn schedule_once_for(
        &mut self,
        owner: Entity,
        delay: Tick,
        action: impl FnOnce(&mut C, &mut Self) + 'static,
    ) -> TaskHandle {
        self.insert(Some(owner), delay, TaskKind::Once(Box::new(action)))
    }

    /// Run `action` every `interval` ticks, first run `interval` ticks from
    /// now. `until` is checked after each run, so the action always runs at
    /// least once.
    pub fn schedule_repeating(
        &mut self,
        interval: Tick,
        action: impl FnMut(&mut C, &mut Self) + 'static,
        until: Option<Until<C>>,
    ) -> TaskHandle {
        let kind = TaskKind::Repeating {
            action: Box::new(action),
            interval,
            until,
        };
        self.insert(None, interval, kind)
    }

    /// Like [`Self::schedule_repeating`], but torn down by
    /// [`Self::cancel_owned_by`].
    pub fn schedule_repeating_for(
        &mut self,
        owner: Entity,
        interval: Tick,
        action: impl FnMut(&mut C, &mut Self) + 'static,
        until: Option<Until<C>>,
    ) -> TaskHandle {
        let kind = TaskKind::Repeating {
            action: Box::new(action),
            interval,
            until,
        };
        self.insert(Some(owner), interval, kind)
    }

    fn insert(&mut self, owner: Option<Entity>, delay: Tick, kind: TaskKind<C>) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        let deadline = self.clock.tick + delay;
        self.enqueue(handle, Task { owner, deadline, kind });
        handle
    }

    fn enqueue(&mut self, handle: TaskHandle, task: Task<C>) {
        self.queue.push(ScheduledDeadline {
            deadline: task.deadline,
            seq: self.next_seq,
            handle,
        });
        self.next_seq += 1;
        self.tasks.insert(handle, task);
    }

    /// Cancel a pending action. Returns false if it already fired (or was
    /// already cancelled). Cancelling a repeating action from inside its own
    /// run stops it from being rescheduled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let mut cancelled = self.tasks.remove(&handle).is_some();
        if let Some(running) = self.running.as_mut() {
            if running.handle == handle && !running.cancelled {
                running.cancelled = true;
                cancelled = true;
            }
        }
        cancelled
    }

    /// Cancel every pending action owned by `owner` (e.g., on death).
    /// Returns how many were removed.
    pub fn cancel_owned_by(&mut self, owner: Entity) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.owner != Some(owner));
        let mut removed = before - self.tasks.len();
        if let Some(running) = self.running.as_mut() {
            if running.owner == Some(owner) && !running.cancelled {
                running.cancelled = true;
                removed += 1;
            }
        }
        removed
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    /// Number of actions waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// Pending actions owned by `owner`.
    pub fn pending_for(&self, owner: Entity) -> usize {
        self.tasks
            .values()
            .filter(|task| task.owner == Some(owner))
            .count()
    }

    /// Actions that fired later than the overrun tolerance while running in
    /// real time.
    pub fn overrun_count(&self) -> u64 {
        self.overruns
    }

    /// Earliest live deadline, dropping cancelled heap entries on the way.
    pub fn next_deadline(&mut self) -> Option<Tick> {
        while let Some(top) = self.queue.peek() {
            if self.tasks.contains_key(&top.handle) {
                return Some(top.deadline);
            }
            self.queue.pop();
        }
        None
    }

    /// Run one dispatch pass at the current tick: every action whose deadline
    /// has passed fires, in deadline then submission order. Actions scheduled
    /// during the pass wait for the next one, even if already due.
    pub fn run_pending(&mut self, ctx: &mut C) -> usize {
        let now = self.clock.tick;
        self.last_pass = Some(now);
        let mut due = Vec::new();
        while let Some(entry) = self.queue.pop() {
            if entry.deadline > now {
                self.queue.push(entry);
                break;
            }
            due.push(entry);
        }

        let mut fired = 0;
        for entry in due {
            // Cancelled earlier, possibly by an action in this same pass
            let Some(task) = self.tasks.remove(&entry.handle) else {
                continue;
            };
            self.check_overrun(entry.deadline);

            let Task { owner, kind, .. } = task;
            self.running = Some(RunningTask {
                handle: entry.handle,
                owner,
                cancelled: false,
            });
            fired += 1;

            match kind {
                TaskKind::Once(action) => action(ctx, self),
                TaskKind::Repeating {
                    mut action,
                    interval,
                    until,
                } => {
                    action(ctx, self);
                    let finished = until.as_ref().is_some_and(|until| until(&*ctx));
                    let cancelled = self.running.as_ref().is_some_and(|r| r.cancelled);
                    if !finished && !cancelled {
                        let task = Task {
                            owner,
                            deadline: self.clock.tick + interval,
                            kind: TaskKind::Repeating {
                                action,
                                interval,
                                until,
                            },
                        };
                        self.enqueue(entry.handle, task);
                    }
                }
            }
            self.running = None;
        }
        fired
    }

    fn check_overrun(&mut self, deadline: Tick) {
        let Some(anchor) = self.wall else {
            return;
        };
        let target = anchor.epoch + self.wall_offset(deadline);
        let late = Instant::now().saturating_duration_since(target);
        if late > self.overrun_tolerance {
            self.overruns += 1;
            warn!(
                deadline,
                late_ms = late.as_millis() as u64,
                "scheduled action fired late"
            );
        }
    }

    fn wall_offset(&self, tick: Tick) -> Duration {
        self.tick_duration.mul_f64(tick as f64)
    }

    /// Advance logical time to `target`, running a pass at every deadline on
    /// the way. Never sleeps.
    ///
    /// Each tick gets one pass. Work queued during a pass for the tick it ran
    /// at (a zero-interval repeat, a zero-delay follow-up) runs at the next
    /// tick, so logical time always moves forward.
    pub fn advance_to(&mut self, target: Tick, ctx: &mut C) {
        while let Some(deadline) = self.next_deadline() {
            let tick = self.logical_pass_tick(deadline);
            if tick > target {
                break;
            }
            self.clock.advance_to(tick);
            self.run_pending(ctx);
        }
        if target > self.clock.tick {
            self.clock.advance_to(target);
        }
    }

    /// Tick at which the next logical pass for `deadline` runs: never in the
    /// past, and never a tick that already had its pass.
    fn logical_pass_tick(&self, deadline: Tick) -> Tick {
        let tick = deadline.max(self.clock.tick);
        if self.last_pass == Some(tick) {
            tick + 1
        } else {
            tick
        }
    }

    /// Advance logical time by `ticks`.
    pub fn advance(&mut self, ticks: Tick, ctx: &mut C) {
        let target = self.clock.tick + ticks;
        self.advance_to(target, ctx);
    }

    /// Jump to the next deadline and run one pass there. Returns false if
    /// nothing is scheduled.
    pub fn step(&mut self, ctx: &mut C) -> bool {
        let Some(deadline) = self.next_deadline() else {
            return false;
        };
        let tick = self.logical_pass_tick(deadline);
        self.clock.advance_to(tick);
        self.run_pending(ctx);
        true
    }

    /// Blocking real-time dispatch loop.
    ///
    /// Each iteration catches the logical clock up with the wall clock, runs
    /// a pass, hands control to `after_pass`, then sleeps until the next
    /// deadline (not at all if it is already due). Returns when `after_pass`
    /// breaks or nothing is left to schedule.
    pub fn run(
        &mut self,
        ctx: &mut C,
        mut after_pass: impl FnMut(&mut C, &mut Self) -> ControlFlow<()>,
    ) {
        let start = Instant::now();
        let epoch = start
            .checked_sub(self.wall_offset(self.clock.tick))
            .unwrap_or(start);
        self.wall = Some(WallAnchor { epoch });
        let mut passes = PassCounter::new(start);
        let tick_secs = self.tick_duration.as_secs_f64();

        loop {
            let wall_tick = (epoch.elapsed().as_secs_f64() / tick_secs) as Tick;
            if wall_tick > self.clock.tick {
                self.clock.advance_to(wall_tick);
            }

            self.run_pending(ctx);
            passes.record(Instant::now());

            if after_pass(ctx, self).is_break() {
                break;
            }

            let Some(next) = self.next_deadline() else {
                debug!("nothing left to schedule, leaving dispatch loop");
                break;
            };
            let target = epoch + self.wall_offset(next);
            let sleep = target.saturating_duration_since(Instant::now());
            if !sleep.is_zero() {
                std::thread::sleep(sleep);
            }
            if next > self.clock.tick {
                self.clock.advance_to(next);
            }
        }

        self.wall = None;
    }
}
