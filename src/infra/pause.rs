use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use super::game_api::PauseTrigger;

/// Pause trigger fed by an independent listener through a channel.
pub struct ChannelPauseTrigger {
    presses: mpsc::Receiver<()>,
}

impl ChannelPauseTrigger {
    pub fn new(presses: mpsc::Receiver<()>) -> Self {
        Self { presses }
    }

    /// Listen on stdin: every line (Enter) counts as one press.
    pub fn from_stdin() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                if line.is_err() || tx.send(()).is_err() {
                    break;
                }
            }
            tracing::debug!("Pause listener stopped");
        });
        Self::new(rx)
    }
}

impl PauseTrigger for ChannelPauseTrigger {
    fn pressed_once(&mut self) -> bool {
        let mut pressed = false;
        while self.presses.try_recv().is_ok() {
            pressed = true;
        }
        pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_consumed_once() {
        let (tx, rx) = mpsc::channel();
        let mut trigger = ChannelPauseTrigger::new(rx);

        assert!(!trigger.pressed_once());
        tx.send(()).unwrap();
        assert!(trigger.pressed_once());
        assert!(!trigger.pressed_once());
    }

    #[test]
    fn test_queued_presses_collapse() {
        let (tx, rx) = mpsc::channel();
        let mut trigger = ChannelPauseTrigger::new(rx);

        tx.send(()).unwrap();
        tx.send(()).unwrap();
        assert!(trigger.pressed_once());
        assert!(!trigger.pressed_once());
    }

    #[test]
    fn test_disconnected_listener_never_fires() {
        let (tx, rx) = mpsc::channel::<()>();
        drop(tx);
        let mut trigger = ChannelPauseTrigger::new(rx);
        assert!(!trigger.pressed_once());
    }
}
