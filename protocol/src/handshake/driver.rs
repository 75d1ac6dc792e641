//! Runs a role to completion over a [`Channel`].
//!
//! The only suspension points are channel operations. Every receive is
//! bounded by the configured timeout; on expiry the role is dropped with
//! whatever it held, which is safe because no subset of the messages lets
//! anyone derive a partial secret.

use tokio::time::timeout;
use tracing::{debug, info_span, warn, Instrument};

use crate::config::HandshakeConfig;

use super::{Channel, HandshakeError, HandshakeRole, HandshakeState, Outcome, Step};

/// Drives `role` through its script and returns what it derived.
///
/// Generates the role's keys from the OS random source if the caller has
/// not already done so.
pub async fn run_handshake<H, C>(
    mut role: H,
    channel: &mut C,
    config: &HandshakeConfig,
) -> Result<Outcome<H::Group, H::Secret>, HandshakeError>
where
    H: HandshakeRole,
    C: Channel + ?Sized,
{
    config.validate()?;
    let span = info_span!("handshake", variant = %role.variant(), role = %role.role());

    async move {
        if role.state() == HandshakeState::Init {
            role.generate_keys()?;
        }

        loop {
            match role.next_step() {
                Step::Write => {
                    let message = role.write_message()?;
                    debug!(bytes = message.len(), "sending handshake message");
                    channel.send(message).await?;
                }
                Step::Read => {
                    let message = match timeout(config.receive_timeout(), channel.receive()).await {
                        Ok(received) => received?,
                        Err(_) => {
                            warn!(
                                timeout_ms = config.receive_timeout_ms,
                                state = %role.state(),
                                "peer did not respond; abandoning session"
                            );
                            return Err(HandshakeError::Timeout(config.receive_timeout()));
                        }
                    };
                    if message.len() > config.max_message_length {
                        warn!(bytes = message.len(), "oversize handshake message");
                        return Err(HandshakeError::MalformedMessage(format!(
                            "message of {} bytes exceeds limit of {}",
                            message.len(),
                            config.max_message_length
                        )));
                    }
                    debug!(bytes = message.len(), "received handshake message");
                    role.read_message(&message)?;
                }
                Step::Done => break,
            }
        }

        let outcome = role.finish()?;
        debug!(transcript = %outcome.transcript_hash, "handshake complete");
        Ok(outcome)
    }
    .instrument(span)
    .await
}
