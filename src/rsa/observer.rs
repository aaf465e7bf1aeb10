// Window Observer
// Hooks invoked by the block codec for every transformed window

use super::bigint::RsaBigInt;

/// Role of a window in the block stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Regular,
    /// Ciphertext one bit wider than the nominal window, preceded by a marker
    Overflow,
    /// Last plaintext window, possibly shorter than nominal
    Final,
}

/// One window before and after exponentiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEvent {
    pub index: usize,
    pub kind: WindowKind,
    pub input: RsaBigInt,
    pub input_bits: usize,
    pub output: RsaBigInt,
    pub output_bits: usize,
}

pub trait WindowObserver {
    fn on_window(&mut self, _event: &WindowEvent) {}

    /// An overflow marker was written or consumed at bit `position`
    fn on_marker(&mut self, _position: usize) {}

    /// The final window length carried by a unified trailer
    fn on_trailer(&mut self, _final_bits: usize) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl WindowObserver for NoopObserver {}

/// Traces every window through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl WindowObserver for LogObserver {
    fn on_window(&mut self, event: &WindowEvent) {
        log::trace!(
            "#{:<4} {:?}: {:0>iw$b} ({}) -> {:0>ow$b} ({})",
            event.index,
            event.kind,
            event.input,
            event.input,
            event.output,
            event.output,
            iw = event.input_bits,
            ow = event.output_bits,
        );
    }

    fn on_marker(&mut self, position: usize) {
        log::trace!("overflow marker at bit {position}, next window is one bit wider");
    }

    fn on_trailer(&mut self, final_bits: usize) {
        log::trace!("trailer: final window holds {final_bits} bits");
    }
}

/// Keeps everything it sees, for inspection in tests
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub windows: Vec<WindowEvent>,
    pub markers: Vec<usize>,
    pub trailers: Vec<usize>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: WindowKind) -> usize {
        self.windows.iter().filter(|w| w.kind == kind).count()
    }
}

impl WindowObserver for RecordingObserver {
    fn on_window(&mut self, event: &WindowEvent) {
        self.windows.push(event.clone());
    }

    fn on_marker(&mut self, position: usize) {
        self.markers.push(position);
    }

    fn on_trailer(&mut self, final_bits: usize) {
        self.trailers.push(final_bits);
    }
}
