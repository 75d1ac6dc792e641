//! Variant C: JKA baseline with a joint tweak.
//!
//! Both ephemeral points are hashed under the label `"t1"`, the tweaks are
//! summed into one joint tweak `t`, and
//!
//! ```text
//! D1 = (t·s1 + e1) · (t·S2 + E2)
//! D2 = (t·S1 + E1) · (t·s2 + e2)
//! ```
//!
//! The responder's point is hashed under `"t1"` on *both* sides, not
//! `"t2"`. That is how this variant is defined; the two roles only agree
//! because each derives every tweak with the same label. Variant D is the
//! one with per-role labels.

use crate::config::TWEAK_LABEL_INITIATOR;
use crate::group::Group;

use super::committed::{self, TweakSchedule};
use super::Variant;

/// Tweak schedule for variant C: `x = y = t1 + t2`.
#[derive(Debug, Clone, Copy)]
pub struct JointTweak;

impl TweakSchedule for JointTweak {
    const VARIANT: Variant = Variant::JointTweak;
    const RESPONDER_LABEL: &'static str = TWEAK_LABEL_INITIATOR;

    fn static_weights<G: Group>(ti: &G::Scalar, tr: &G::Scalar) -> (G::Scalar, G::Scalar) {
        let t = G::scalar_add(ti, tr);
        (t, t)
    }
}

pub type Initiator<G> = committed::Initiator<G, JointTweak>;
pub type Responder<G> = committed::Responder<G, JointTweak>;
