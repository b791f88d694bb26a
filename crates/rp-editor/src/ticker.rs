//! Ghost animation ticker bookkeeping.
//!
//! While a text or sticky-note tool is armed, the host runs an animation
//! loop (requestAnimationFrame in the browser) to repaint the hover ghost.
//! The ticker tracks the armed edge so the host receives exactly one
//! `Start` when arming and one `Stop` when disarming — never a second
//! `Start` for a repeated sync, and a `Stop` is guaranteed on teardown via
//! [`GhostTicker::release`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerCommand {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GhostTicker {
    running: bool,
}

impl GhostTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile against the current armed state. Emits a command only on
    /// an edge.
    pub fn sync(&mut self, armed: bool) -> Option<TickerCommand> {
        match (self.running, armed) {
            (false, true) => {
                self.running = true;
                Some(TickerCommand::Start)
            }
            (true, false) => {
                self.running = false;
                Some(TickerCommand::Stop)
            }
            _ => None,
        }
    }

    /// Unconditional stop, for page/surface teardown.
    pub fn release(&mut self) -> Option<TickerCommand> {
        self.sync(false)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
