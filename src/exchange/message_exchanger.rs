use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::exchange::{exchange_error::ExchangeError, wait};

/// A simple tool to send and receive text messages.
///
/// Implementations only provide the three primitives, the blocking waits are built on top of
/// `receive_now` and work for any transport.
pub trait MessageExchanger: Send {
    /// Sends one message. Either the message is handed off for delivery or an error is returned.
    fn send(&mut self, message: &str) -> impl Future<Output = Result<(), ExchangeError>> + Send;

    /// Makes a single attempt to receive a message.
    ///
    /// Returns `Ok(None)` when nothing is waiting to be received. A returned message has already
    /// been removed from its source.
    fn receive_now(&mut self) -> impl Future<Output = Result<Option<String>, ExchangeError>> + Send;

    /// Closes the connection if the transport is connection-oriented.
    /// Does nothing if the connection is already closed.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// See [`wait::wait_for_message`].
    fn wait_for_message(&mut self, poll_interval: Duration, cancel: &CancellationToken) -> impl Future<Output = Result<String, ExchangeError>> + Send {
        wait::wait_for_message(self, poll_interval, cancel)
    }

    /// See [`wait::wait_for_message_for`].
    fn wait_for_message_for(&mut self, total_wait: Duration, poll_interval: Duration, cancel: &CancellationToken) -> impl Future<Output = Result<String, ExchangeError>> + Send {
        wait::wait_for_message_for(self, total_wait, poll_interval, cancel)
    }
}
