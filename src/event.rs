use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub enum AppEvent {
    Input(String),
    /// One timer second, tagged with the ticker generation that sent it.
    Tick(u64),
    Eof,
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    /// Starts a reader thread that forwards stdin lines.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if input_tx.send(AppEvent::Input(line)).is_err() {
                    return;
                }
            }
            let _ = input_tx.send(AppEvent::Eof);
        });

        Self { rx, tx }
    }

    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}

/// Background one-second clock. Stops on `cancel` or drop; a tick already in
/// flight may still arrive, which is why ticks carry a generation.
pub struct Ticker {
    generation: u64,
    stop: Arc<AtomicBool>,
}

impl Ticker {
    pub fn start(tx: mpsc::Sender<AppEvent>, generation: u64, period: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        thread::spawn(move || {
            loop {
                thread::sleep(period);
                if flag.load(Ordering::Acquire) {
                    return;
                }
                if tx.send(AppEvent::Tick(generation)).is_err() {
                    return;
                }
            }
        });

        Self { generation, stop }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
