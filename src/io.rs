use std::sync::mpsc::{self, Receiver, SyncSender};

/// The machine's end of a blocking I/O endpoint: `IN` receives, `OUT` sends.
/// Each is a rendezvous channel (capacity zero) so a send blocks until a
/// receive is ready and vice versa: a single-slot synchronous queue.
pub struct Io {
    pub(crate) input: Receiver<i32>,
    pub(crate) output: SyncSender<i32>,
}

/// The host's end, returned alongside a freshly constructed machine.
pub struct IoHandle {
    pub input: SyncSender<i32>,
    pub output: Receiver<i32>,
}

pub fn channel() -> (Io, IoHandle) {
    let (input_tx, input_rx) = mpsc::sync_channel(0);
    let (output_tx, output_rx) = mpsc::sync_channel(0);

    (
        Io {
            input: input_rx,
            output: output_tx,
        },
        IoHandle {
            input: input_tx,
            output: output_rx,
        },
    )
}
