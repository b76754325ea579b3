//! Post-transition side effects
//!
//! The state machine never performs side effects. After a transition the
//! facade asks [`plan_effects`] what must follow and applies the list in
//! order. Domain effects (deposit agreement) commit in the same atomic unit
//! as the transition; notification effects are handed to observers after
//! the commit.

use serde::Serialize;

use super::{Transition, VersionState};

/// A side effect that follows a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostTransitionEffect {
    /// Mark the parent work's deposit agreement as acknowledged.
    ///
    /// Planned only for the first publication of any version of the work.
    AcknowledgeDepositAgreement,

    /// The representative version may have changed; collaborators that mirror
    /// it (search index, landing pages) should re-read the work.
    RefreshRepresentative,
}

impl PostTransitionEffect {
    /// True for effects that mutate the work and must commit with the
    /// transition.
    pub fn is_domain_effect(&self) -> bool {
        matches!(self, PostTransitionEffect::AcknowledgeDepositAgreement)
    }
}

/// Plans the ordered effects for a transition.
///
/// `agreement_acknowledged` is the parent work's flag *before* the transition.
pub fn plan_effects(transition: &Transition, agreement_acknowledged: bool) -> Vec<PostTransitionEffect> {
    let mut effects = Vec::with_capacity(2);

    if transition.to == VersionState::Published && !agreement_acknowledged {
        effects.push(PostTransitionEffect::AcknowledgeDepositAgreement);
    }
    effects.push(PostTransitionEffect::RefreshRepresentative);

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::VersionId;
    use crate::lifecycle::LifecycleEvent;
    use chrono::Utc;

    fn transition(from: VersionState, event: LifecycleEvent, to: VersionState) -> Transition {
        Transition {
            version_id: VersionId::generate(),
            version_number: 1,
            event,
            from,
            to,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_first_publish_acknowledges_agreement_first() {
        let t = transition(VersionState::Draft, LifecycleEvent::Publish, VersionState::Published);
        assert_eq!(
            plan_effects(&t, false),
            vec![
                PostTransitionEffect::AcknowledgeDepositAgreement,
                PostTransitionEffect::RefreshRepresentative,
            ]
        );
    }

    #[test]
    fn test_later_publish_does_not_reacknowledge() {
        let t = transition(VersionState::Withdrawn, LifecycleEvent::Publish, VersionState::Published);
        assert_eq!(plan_effects(&t, true), vec![PostTransitionEffect::RefreshRepresentative]);
    }

    #[test]
    fn test_withdraw_only_refreshes() {
        let t = transition(VersionState::Published, LifecycleEvent::Withdraw, VersionState::Withdrawn);
        let effects = plan_effects(&t, false);
        assert_eq!(effects, vec![PostTransitionEffect::RefreshRepresentative]);
        assert!(!effects[0].is_domain_effect());
    }
}
