//! Message sink boundary

use tracing::info;

/// Receives the guidance message whenever it changes
pub trait MessageSink {
    fn display(&mut self, text: &str);
}

/// Prints messages to stdout and the log
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn display(&mut self, text: &str) {
        info!(message = text, "Display updated");
        println!("{text}");
    }
}

impl<T: MessageSink + ?Sized> MessageSink for Box<T> {
    fn display(&mut self, text: &str) {
        (**self).display(text)
    }
}
