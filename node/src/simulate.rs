//! # In-Memory Session Simulation
//!
//! Runs Initiator/Responder pairs against each other over
//! [`MemoryChannel`]s, each pair in its own tokio task, and reports what
//! every session ended with. Both roles of every session reuse one static
//! keypair per side, as two long-lived parties would.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use jka_protocol::config::HandshakeConfig;
use jka_protocol::crypto::{Digest, Keypair};
use jka_protocol::group::Group;
use jka_protocol::handshake::{
    jka, joint_tweak, run_handshake, static_only, triple_dh, Channel, HandshakeError,
    HandshakeRole, MemoryChannel, Variant,
};

/// Offset of the first field's content in an encoded message: version
/// byte, variant tag, length prefix.
const TAMPER_OFFSET: usize = 13;

/// What one session ended with.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session: Uuid,
    pub variant: String,
    pub group: &'static str,
    /// Both roles finished and hold the same secret.
    pub agreed: bool,
    pub transcript_hash: Option<Digest>,
    pub initiator_error: Option<String>,
    pub responder_error: Option<String>,
    pub elapsed_us: u128,
}

/// Aggregate over every session of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub sessions: usize,
    pub agreed: usize,
    pub disagreed: usize,
    pub aborted: usize,
}

impl Summary {
    pub fn from_reports(reports: &[SessionReport]) -> Self {
        let mut summary = Summary {
            sessions: reports.len(),
            ..Summary::default()
        };
        for report in reports {
            if report.initiator_error.is_some() || report.responder_error.is_some() {
                summary.aborted += 1;
            } else if report.agreed {
                summary.agreed += 1;
            } else {
                summary.disagreed += 1;
            }
        }
        summary
    }
}

/// Runs `sessions` concurrent handshakes of `variant` in group `G`.
pub async fn simulate<G: Group>(
    variant: Variant,
    sessions: usize,
    config: HandshakeConfig,
    tamper: bool,
) -> Result<Vec<SessionReport>> {
    config.validate()?;
    let initiator = Arc::new(Keypair::<G>::generate()?);
    let responder = Arc::new(Keypair::<G>::generate()?);
    info!(
        %variant,
        group = G::NAME,
        sessions,
        tamper,
        initiator_static = %initiator.public_key(),
        responder_static = %responder.public_key(),
        "starting simulation"
    );

    let tasks = (0..sessions).map(|_| {
        let (initiator, responder, config) =
            (Arc::clone(&initiator), Arc::clone(&responder), config.clone());
        tokio::spawn(run_session::<G>(variant, initiator, responder, config, tamper))
    });

    let reports = join_all(tasks)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reports)
}

/// Index of the Initiator's last outbound message in `variant`'s script.
fn final_initiator_write(variant: Variant) -> usize {
    match variant {
        Variant::StaticOnly => 0,
        Variant::TripleDh | Variant::JointTweak | Variant::Jka => 1,
    }
}

async fn run_session<G: Group>(
    variant: Variant,
    initiator: Arc<Keypair<G>>,
    responder: Arc<Keypair<G>>,
    config: HandshakeConfig,
    tamper: bool,
) -> SessionReport {
    let session = Uuid::new_v4();
    let target = tamper.then(|| final_initiator_write(variant));
    let (i_pub, r_pub) = (initiator.public_key(), responder.public_key());
    let started = Instant::now();

    let span = info_span!("session", %session);
    let ended = async {
        match variant {
            Variant::StaticOnly => {
                exchange(
                    static_only::StaticOnly::initiator(initiator, r_pub),
                    static_only::StaticOnly::responder(responder, i_pub),
                    &config,
                    target,
                )
                .await
            }
            Variant::TripleDh => {
                exchange(
                    triple_dh::Initiator::new(initiator),
                    triple_dh::Responder::new(responder),
                    &config,
                    target,
                )
                .await
            }
            Variant::JointTweak => {
                exchange(
                    joint_tweak::Initiator::new(initiator, r_pub),
                    joint_tweak::Responder::new(responder, i_pub),
                    &config,
                    target,
                )
                .await
            }
            Variant::Jka => {
                exchange(
                    jka::Initiator::new(initiator, r_pub),
                    jka::Responder::new(responder, i_pub),
                    &config,
                    target,
                )
                .await
            }
        }
    }
    .instrument(span)
    .await;

    SessionReport {
        session,
        variant: variant.to_string(),
        group: G::NAME,
        agreed: ended.agreed,
        transcript_hash: ended.transcript_hash,
        initiator_error: ended.initiator_error,
        responder_error: ended.responder_error,
        elapsed_us: started.elapsed().as_micros(),
    }
}

struct Ended {
    agreed: bool,
    transcript_hash: Option<Digest>,
    initiator_error: Option<String>,
    responder_error: Option<String>,
}

async fn exchange<I, R>(
    initiator: I,
    responder: R,
    config: &HandshakeConfig,
    tamper_at: Option<usize>,
) -> Ended
where
    I: HandshakeRole,
    R: HandshakeRole<Group = I::Group, Secret = I::Secret>,
    I::Secret: PartialEq,
{
    let (left, mut right) = MemoryChannel::pair();
    let mut left = TamperingChannel {
        inner: left,
        target: tamper_at,
        sent: 0,
    };

    let (i, r) = tokio::join!(
        run_handshake(initiator, &mut left, config),
        run_handshake(responder, &mut right, config),
    );

    match (i, r) {
        (Ok(i), Ok(r)) => {
            let agreed = i.secret == r.secret;
            if !agreed {
                warn!("roles finished with different secrets");
            }
            Ended {
                agreed,
                transcript_hash: Some(i.transcript_hash),
                initiator_error: None,
                responder_error: None,
            }
        }
        (i, r) => Ended {
            agreed: false,
            transcript_hash: None,
            initiator_error: i.err().map(|e| e.to_string()),
            responder_error: r.err().map(|e| e.to_string()),
        },
    }
}

/// Passes messages through, flipping one byte of the `target`-th one sent.
struct TamperingChannel<C> {
    inner: C,
    target: Option<usize>,
    sent: usize,
}

#[async_trait]
impl<C: Channel> Channel for TamperingChannel<C> {
    async fn send(&mut self, mut message: Vec<u8>) -> Result<(), HandshakeError> {
        if self.target == Some(self.sent) {
            if let Some(byte) = message.get_mut(TAMPER_OFFSET) {
                *byte ^= 0x01;
            }
        }
        self.sent += 1;
        self.inner.send(message).await
    }

    async fn receive(&mut self) -> Result<Vec<u8>, HandshakeError> {
        self.inner.receive().await
    }
}
