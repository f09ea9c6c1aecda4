// FILE: crates/media-engine/src/playback_thread.rs

use crate::engine::{EngineContext, EngineCore};
use crate::error::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::output::MediaOutput;
use crate::state::EngineStatus;
use crate::trigger::Trigger;
use crossbeam_channel::{bounded, never, select, Receiver, Sender, TrySendError};
use lectern_command_channel::{CommandMessage, CommandReceiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug)]
struct Flags {
    /// Set by the thread once it has started
    running: AtomicBool,
    /// Cleared on cancel; triggers arriving afterwards are rejected
    accepting: AtomicBool,
}

/// Handle to one running playback engine thread
///
/// The thread owns the session and the media output. It attaches to the
/// command channel when started and detaches when cancelled; a cancelled
/// engine cannot be restarted, the host starts a new one instead.
pub struct PlaybackEngine {
    handle: Option<thread::JoinHandle<()>>,
    trigger_tx: Sender<Trigger>,
    flags: Arc<Flags>,
    context: EngineContext,
}

impl PlaybackEngine {
    /// Spawns the engine thread with a fresh session at track 0
    pub fn start(context: EngineContext, output: Box<dyn MediaOutput>) -> EngineResult<Self> {
        let (trigger_tx, trigger_rx) = bounded(context.config.trigger_queue_capacity.max(1));
        let commands = context.channel.attach();
        let flags = Arc::new(Flags {
            running: AtomicBool::new(false),
            accepting: AtomicBool::new(true),
        });

        let core = EngineCore::new(context.clone(), output, trigger_tx.clone());
        let flags_clone = Arc::clone(&flags);
        let spawned = thread::Builder::new()
            .name("lectern-playback".to_string())
            .spawn(move || playback_loop(core, trigger_rx, commands, flags_clone));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                context.channel.detach();
                return Err(EngineError::Spawn(e));
            }
        };

        Ok(Self {
            handle: Some(handle),
            trigger_tx,
            flags,
            context,
        })
    }

    /// Queues a trigger without blocking
    pub fn submit(&self, trigger: Trigger) -> EngineResult<()> {
        if !self.flags.accepting.load(Ordering::SeqCst) {
            return Err(EngineError::NotRunning);
        }
        match self.trigger_tx.try_send(trigger) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(t)) => {
                log::warn!("Playback engine queue full, dropped {}", t.name());
                Err(EngineError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(EngineError::NotRunning),
        }
    }

    /// True from the moment the thread started until it is cancelled
    pub fn is_running(&self) -> bool {
        self.flags.running.load(Ordering::SeqCst)
    }

    /// True until cancelled, including while the thread is still starting
    pub fn is_active(&self) -> bool {
        self.handle.is_some() && self.flags.accepting.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> EngineStatus {
        self.context.lock_status().clone()
    }

    /// Stops the engine and waits for its thread
    ///
    /// Triggers already queued behind the shutdown are rejected, not applied.
    pub fn cancel(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.flags.accepting.store(false, Ordering::SeqCst);
        self.flags.running.store(false, Ordering::SeqCst);
        self.context.barrier.reset();

        if self.trigger_tx.send(Trigger::Shutdown).is_err() {
            log::warn!("Playback thread already gone");
        }
        if handle.join().is_err() {
            log::error!("Playback thread panicked");
            self.context.channel.detach();
            self.context.lock_status().running = false;
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The engine loop: one trigger at a time, until shutdown
fn playback_loop(
    mut core: EngineCore,
    triggers: Receiver<Trigger>,
    commands: CommandReceiver,
    flags: Arc<Flags>,
) {
    flags.running.store(true, Ordering::SeqCst);
    core.started();

    let mut command_rx: Receiver<CommandMessage> = commands.as_receiver().clone();
    let mut rejected = 0u64;

    loop {
        let mut detached = false;
        let keep_running = select! {
            recv(triggers) -> msg => match msg {
                Ok(Trigger::Shutdown) | Err(_) => false,
                Ok(trigger) => {
                    dispatch(&mut core, &flags, trigger, &mut rejected);
                    true
                }
            },
            recv(command_rx) -> msg => {
                match msg {
                    Ok(message) => {
                        log::debug!("Command message: {}", message);
                        for command in message.commands() {
                            dispatch(&mut core, &flags, Trigger::from(command), &mut rejected);
                        }
                    }
                    Err(_) => detached = true,
                }
                true
            },
        };

        if !keep_running {
            break;
        }
        if detached {
            log::debug!("Command channel detached");
            command_rx = never();
        }
    }

    finish(core, &triggers, &commands, &flags, rejected);
}

fn dispatch(core: &mut EngineCore, flags: &Flags, trigger: Trigger, rejected: &mut u64) {
    if flags.accepting.load(Ordering::SeqCst) {
        core.handle(trigger);
    } else {
        *rejected += 1;
        log::warn!("Rejected {}: engine is shutting down", trigger.name());
    }
}

fn finish(
    mut core: EngineCore,
    triggers: &Receiver<Trigger>,
    commands: &CommandReceiver,
    flags: &Flags,
    mut rejected: u64,
) {
    core.shutdown();

    let ctx = core.context().clone();
    flags.running.store(false, Ordering::SeqCst);
    ctx.barrier.reset();
    ctx.channel.detach();

    rejected += commands.drain().len() as u64;
    rejected += triggers.try_iter().count() as u64;
    if rejected > 0 {
        log::warn!("Playback engine rejected {} pending triggers", rejected);
    }

    {
        let mut status = ctx.lock_status();
        status.running = false;
        status.rejected_triggers = rejected;
    }
    if let Some(adapter) = &ctx.adapter {
        adapter.on_closed();
    }
    ctx.events.publish(EngineEvent::Stopped { rejected });
    log::info!("Playback engine stopped");
}
