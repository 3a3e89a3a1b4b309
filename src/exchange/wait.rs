use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::exchange::{exchange_error::ExchangeError, message_exchanger::MessageExchanger};

/// Tries to receive a message every `poll_interval` until one arrives.
///
/// Reception errors are returned immediately without retrying. There is no upper bound on the
/// total wait, use [`wait_for_message_for`] for that. Cancelling `cancel` while sleeping
/// abandons the wait with [`ExchangeError::Cancelled`].
pub async fn wait_for_message<E>(exchanger: &mut E, poll_interval: Duration, cancel: &CancellationToken) -> Result<String, ExchangeError>
where
    E: MessageExchanger + ?Sized,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        if let Some(message) = exchanger.receive_now().await? {
            tracing::debug!("message received after {} attempts", attempt);
            return Ok(message);
        }

        tracing::trace!("attempt {}: no message, sleeping {:?}", attempt, poll_interval);
        pause(poll_interval, cancel).await?;
    }
}

/// Tries to receive a message every `poll_interval`, for at most `total_wait`.
///
/// Attempts are made at `0, p, 2p, ...` for every multiple of `p` not greater than `total_wait`,
/// so a `total_wait` that is not a multiple of `poll_interval` is rounded down. When no attempt
/// succeeds, fails with [`ExchangeError::Timeout`] carrying the wait actually spent.
/// A zero `poll_interval` makes a single attempt.
pub async fn wait_for_message_for<E>(exchanger: &mut E, total_wait: Duration, poll_interval: Duration, cancel: &CancellationToken) -> Result<String, ExchangeError>
where
    E: MessageExchanger + ?Sized,
{
    let mut waited = Duration::ZERO;
    loop {
        if let Some(message) = exchanger.receive_now().await? {
            tracing::debug!("message received after waiting {:?}", waited);
            return Ok(message);
        }

        let next_attempt = match waited.checked_add(poll_interval) {
            Some(next_attempt) if !poll_interval.is_zero() && next_attempt <= total_wait => next_attempt,
            _ => {
                tracing::debug!("no message received within {:?}", total_wait);
                return Err(ExchangeError::Timeout(waited));
            }
        };

        tracing::trace!("no message after {:?}, sleeping {:?}", waited, poll_interval);
        pause(poll_interval, cancel).await?;
        waited = next_attempt;
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), ExchangeError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("wait for message cancelled");
            Err(ExchangeError::Cancelled)
        },
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
