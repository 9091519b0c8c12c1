//! Virtual-time driver: runs a whole session headlessly and instantly.
//!
//! Interprets the sequencer's effects against a virtual clock and an
//! ordered event queue instead of threads and a terminal. A [`Plan`]
//! stands in for the user and [`Simulation::block`] stands in for a
//! hostile playback environment. Same sequencer, same effects, fully
//! deterministic.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::Duration;

use tracing::{debug, warn};

use crate::flow::{Action, Activation, Effect, Event, MediaEvent, Screen, Sequencer, Step, TimerId};
use crate::report::{Outcome, Transcript};
use crate::types::{ClipId, Script, ScreenId};

// ============================================================================
// PLAN (the simulated user)
// ============================================================================

/// Choice made on the intro screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroChoice {
    Start,
    AlreadyPassed,
}

/// What the user does when the phone rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallResponse {
    Answer { after: Duration },
    Decline { after: Duration },
    /// Let it ring.
    Wait,
}

/// Scripted user behaviour.
///
/// Queues are consumed one entry per visit; once empty, the intro defaults
/// to [`IntroChoice::Start`] and the call to [`CallResponse::Wait`].
#[derive(Debug, Clone)]
pub struct Plan {
    pub intro: VecDeque<IntroChoice>,
    pub call: VecDeque<CallResponse>,
    /// Option picked for each question, in order. Missing entries pick 0.
    pub answers: Vec<usize>,
    /// Delay before every intro, truth and quiz action.
    pub think_time: Duration,
}

impl Default for Plan {
    fn default() -> Self {
        Plan {
            intro: VecDeque::new(),
            call: VecDeque::new(),
            answers: Vec::new(),
            think_time: Duration::from_secs(1),
        }
    }
}

// ============================================================================
// EVENT QUEUE
// ============================================================================

/// Who scheduled a queued event; decides how it is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// Recurring timer, re-armed every time it fires.
    Timer(TimerId, Duration),
    Deadline,
    Media,
    User,
}

#[derive(Debug)]
struct Pending {
    activation: Activation,
    source: Source,
    event: Event,
}

/// Events keyed by (due time, insertion order) so ties keep FIFO order.
#[derive(Debug, Default)]
struct Queue {
    entries: BTreeMap<(u64, u64), Pending>,
    seq: u64,
}

impl Queue {
    fn push(&mut self, due_ms: u64, pending: Pending) {
        self.seq += 1;
        self.entries.insert((due_ms, self.seq), pending);
    }

    fn pop(&mut self) -> Option<(u64, Pending)> {
        self.entries
            .pop_first()
            .map(|((due_ms, _), pending)| (due_ms, pending))
    }

    /// Drop everything not owned by `activation`.
    fn keep_only(&mut self, activation: Activation) {
        self.entries.retain(|_, p| p.activation == activation);
    }

    fn cancel_timer(&mut self, activation: Activation, timer: TimerId) {
        self.entries.retain(|_, p| {
            !(p.activation == activation && matches!(p.source, Source::Timer(t, _) if t == timer))
        });
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activations that still own queued events.
    #[cfg(test)]
    fn owners(&self) -> HashSet<Activation> {
        self.entries.values().map(|p| p.activation).collect()
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

// ============================================================================
// SIMULATION
// ============================================================================

/// A configured headless session.
pub struct Simulation<'a> {
    script: &'a Script,
    plan: Plan,
    blocked: HashSet<ClipId>,
    limit: Duration,
}

/// Mutable state of a running simulation.
struct Run<'a> {
    script: &'a Script,
    plan: Plan,
    blocked: &'a HashSet<ClipId>,
    sequencer: Sequencer,
    queue: Queue,
    transcript: Transcript,
    now_ms: u64,
}

impl<'a> Simulation<'a> {
    pub fn new(script: &'a Script, plan: Plan) -> Self {
        Simulation {
            script,
            plan,
            blocked: HashSet::new(),
            limit: Duration::from_secs(600),
        }
    }

    /// Make a clip fail to play, like a blocked autoplay.
    pub fn block(mut self, clip: ClipId) -> Self {
        self.blocked.insert(clip);
        self
    }

    /// Block every clip.
    pub fn block_all(self) -> Self {
        self.block(ClipId::Ringing)
            .block(ClipId::InCall)
            .block(ClipId::EndCall)
    }

    /// Stop the session once virtual time passes `limit`.
    pub fn limit(mut self, limit: Duration) -> Self {
        self.limit = limit;
        self
    }

    /// Run from Intro until the session ends.
    pub fn run(self) -> Transcript {
        self.run_from(ScreenId::Intro)
    }

    /// Run from any screen until the session ends.
    pub fn run_from(self, start: ScreenId) -> Transcript {
        let mut run = Run {
            script: self.script,
            plan: self.plan,
            blocked: &self.blocked,
            sequencer: Sequencer::new(),
            queue: Queue::default(),
            transcript: Transcript::default(),
            now_ms: 0,
        };
        let limit_ms = millis(self.limit);

        let step = run.sequencer.start_at(start);
        run.apply(step);

        let outcome = loop {
            let current = run.sequencer.current();
            if run.sequencer.is_finished() {
                break Outcome::Quit { screen: current };
            }
            if current.is_terminal() {
                break Outcome::Completed { screen: current };
            }

            let Some((due_ms, pending)) = run.queue.pop() else {
                break Outcome::Stalled { screen: current };
            };
            if due_ms > limit_ms {
                run.now_ms = limit_ms;
                break Outcome::TimedOut { screen: current };
            }
            run.now_ms = due_ms;
            run.deliver(pending);
        };

        debug!(?outcome, at_ms = run.now_ms, "simulation finished");
        run.transcript.finish(run.now_ms, outcome);
        run.transcript
    }
}

impl Run<'_> {
    fn schedule(&mut self, after: Duration, source: Source, event: Event) {
        let pending = Pending {
            activation: self.sequencer.activation(),
            source,
            event,
        };
        self.queue.push(self.now_ms + millis(after), pending);
    }

    fn deliver(&mut self, pending: Pending) {
        if let Source::Timer(timer, period) = pending.source {
            // Re-arm before dispatch so StopTimer/Teardown can cancel it
            self.queue.push(
                self.now_ms + millis(period),
                Pending {
                    activation: pending.activation,
                    source: pending.source,
                    event: Event::Tick(timer),
                },
            );
        }

        if let Event::Media(MediaEvent::Failed(clip, reason)) = &pending.event {
            if pending.activation == self.sequencer.activation() {
                self.transcript
                    .record_media_failure(self.now_ms, *clip, reason);
            }
        }

        let step = self.sequencer.dispatch(pending.activation, pending.event);
        self.apply(step);
    }

    /// Interpret a step's effects against the virtual clock.
    fn apply(&mut self, step: Step) {
        self.transcript.record(self.now_ms, &step);
        let activation = self.sequencer.activation();

        for effect in &step.effects {
            match effect {
                Effect::Teardown => self.queue.keep_only(activation),
                Effect::PlayClip(clip) => {
                    if self.blocked.contains(clip) {
                        warn!(%clip, "playback blocked");
                        self.schedule(
                            Duration::ZERO,
                            Source::Media,
                            Event::Media(MediaEvent::Failed(*clip, "playback blocked".into())),
                        );
                    } else {
                        let length = self.script.clips.get(*clip).length();
                        self.schedule(length, Source::Media, Event::Media(MediaEvent::Finished(*clip)));
                    }
                }
                Effect::StartTimer { timer, period } => {
                    self.schedule(*period, Source::Timer(*timer, *period), Event::Tick(*timer));
                }
                Effect::StopTimer(timer) => self.queue.cancel_timer(activation, *timer),
                Effect::Schedule { to, after } => {
                    self.schedule(*after, Source::Deadline, Event::Deadline(*to));
                }
                Effect::Answered(answer) => {
                    // Still on the quiz: the user moves to the next question
                    if step.entered.is_none() {
                        self.plan_answer(answer.question + 1);
                    }
                }
                Effect::Quit => {}
            }
        }

        if let Some(entered) = step.entered {
            self.plan_entry(entered.to);
        }
    }

    /// Queue the simulated user's reaction to a freshly entered screen.
    fn plan_entry(&mut self, screen: ScreenId) {
        let think = self.plan.think_time;
        match screen {
            ScreenId::Intro => {
                let action = match self.plan.intro.pop_front().unwrap_or(IntroChoice::Start) {
                    IntroChoice::Start => Action::Confirm,
                    IntroChoice::AlreadyPassed => Action::AlreadyPassed,
                };
                self.schedule(think, Source::User, Event::User(action));
            }
            ScreenId::Call => match self.plan.call.pop_front().unwrap_or(CallResponse::Wait) {
                CallResponse::Answer { after } => {
                    self.schedule(after, Source::User, Event::User(Action::Confirm));
                }
                CallResponse::Decline { after } => {
                    self.schedule(after, Source::User, Event::User(Action::Decline));
                }
                CallResponse::Wait => {}
            },
            ScreenId::Truth => self.schedule(think, Source::User, Event::User(Action::Confirm)),
            ScreenId::Quiz => self.plan_answer(0),
            _ => {}
        }
    }

    fn plan_answer(&mut self, question: usize) {
        if !matches!(self.sequencer.screen(), Screen::Quiz(_)) {
            return;
        }
        let option = self.plan.answers.get(question).copied().unwrap_or(0);
        self.schedule(
            self.plan.think_time,
            Source::User,
            Event::User(Action::Choose(option)),
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
