use std::io;
use std::sync::mpsc::{self, Receiver, RecvError, Sender};
use std::thread;
use std::time::Duration;

use termion::event::Key;
use termion::input::TermRead;

use crate::browser::Msg;

pub enum Event {
    Input(Key),
    /// A provider result coming back from a worker thread.
    Message(Msg),
    Tick,
}

/// Terminal input, worker results and a redraw tick merged into one channel.
pub struct Events {
    rx: Receiver<Event>,
    tx: Sender<Event>,
}

impl Events {
    pub fn new() -> Events {
        Events::with_tick_rate(Duration::from_millis(250))
    }

    pub fn with_tick_rate(tick_rate: Duration) -> Events {
        let (tx, rx) = mpsc::channel();

        {
            let tx = tx.clone();
            thread::spawn(move || {
                for key in io::stdin().keys().flatten() {
                    if tx.send(Event::Input(key)).is_err() {
                        return;
                    }
                }
            });
        }
        {
            let tx = tx.clone();
            thread::spawn(move || loop {
                if tx.send(Event::Tick).is_err() {
                    break;
                }
                thread::sleep(tick_rate);
            });
        }

        Events { rx, tx }
    }

    /// A handle for worker threads to post their results.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn next(&self) -> Result<Event, RecvError> {
        self.rx.recv()
    }
}

impl Default for Events {
    fn default() -> Events {
        Events::new()
    }
}
