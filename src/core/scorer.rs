//! Base attention scoring for allocation decisions

use super::component::{ComponentDescriptor, Urgency};
use super::context::Context;

/// Multiplier when the user is busy and the component can wait
pub const BUSY_DEFER_PENALTY: f64 = 0.3;
/// Multiplier for non-critical components while in focus mode
pub const FOCUS_PENALTY: f64 = 0.5;
/// Multiplier for voice interaction in a loud environment
pub const NOISY_VOICE_PENALTY: f64 = 0.7;
/// Noise level above which voice is penalized
pub const NOISE_THRESHOLD: f64 = 70.0;

/// Maps declared attributes and the current context to a base score.
///
/// No floor or ceiling is applied here; a zero attention weight always
/// scores zero.
pub struct AttentionScorer;

impl AttentionScorer {
    pub fn base_score(component: &ComponentDescriptor, context: &Context) -> f64 {
        let mut score = component.attention_weight * component.urgency.multiplier();

        // Penalties are independent and compound
        if context.user.is_busy && component.can_defer {
            score *= BUSY_DEFER_PENALTY;
        }
        if context.user.in_focus_mode && component.urgency != Urgency::Critical {
            score *= FOCUS_PENALTY;
        }
        if context.environment.noise_level > NOISE_THRESHOLD && context.voice_active() {
            score *= NOISY_VOICE_PENALTY;
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{ContextUpdate, Environment, InteractionState, Modality, UserState};

    fn voice() -> InteractionState {
        InteractionState { modalities: vec![Modality::Voice] }
    }

    fn critical() -> ComponentDescriptor {
        ComponentDescriptor::new("alert")
            .with_urgency(Urgency::Critical)
            .with_weight(100.0)
    }

    #[test]
    fn test_urgency_scaling() {
        let ctx = Context::default();
        assert_eq!(AttentionScorer::base_score(&critical(), &ctx), 200.0);

        let low = ComponentDescriptor::new("hint").with_urgency(Urgency::Low).with_weight(40.0);
        assert_eq!(AttentionScorer::base_score(&low, &ctx), 20.0);
    }

    #[test]
    fn test_busy_penalty_only_for_deferrable() {
        let mut ctx = Context::default();
        let deferrable = critical().deferrable(true);
        let fixed = critical();
        let idle_score = AttentionScorer::base_score(&deferrable, &ctx);

        ctx.apply(ContextUpdate::user(UserState { is_busy: true, ..Default::default() }));

        let busy_score = AttentionScorer::base_score(&deferrable, &ctx);
        assert!((busy_score - idle_score * BUSY_DEFER_PENALTY).abs() < 1e-9);
        assert_eq!(AttentionScorer::base_score(&fixed, &ctx), 200.0);
    }

    #[test]
    fn test_focus_mode_spares_critical() {
        let mut ctx = Context::default();
        ctx.apply(ContextUpdate::user(UserState { in_focus_mode: true, ..Default::default() }));

        assert_eq!(AttentionScorer::base_score(&critical(), &ctx), 200.0);
        let high = ComponentDescriptor::new("mail").with_urgency(Urgency::High).with_weight(20.0);
        assert_eq!(AttentionScorer::base_score(&high, &ctx), 15.0);
    }

    #[test]
    fn test_noise_penalty_requires_voice() {
        let mut ctx = Context::default();
        ctx.apply(ContextUpdate::environment(Environment {
            noise_level: 85.0,
            ..Default::default()
        }));
        let comp = ComponentDescriptor::new("reader").with_weight(10.0);
        assert_eq!(AttentionScorer::base_score(&comp, &ctx), 10.0);

        ctx.apply(ContextUpdate::interaction(voice()));
        assert!((AttentionScorer::base_score(&comp, &ctx) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalties_compound() {
        let mut ctx = Context::default();
        ctx.apply(ContextUpdate::user(UserState {
            is_busy: true,
            in_focus_mode: true,
            ..Default::default()
        }));
        ctx.apply(ContextUpdate::environment(Environment {
            noise_level: 71.0,
            ..Default::default()
        }));
        ctx.apply(ContextUpdate::interaction(voice()));

        let comp = ComponentDescriptor::new("promo").with_weight(100.0).deferrable(true);
        let expected = 100.0 * 0.3 * 0.5 * 0.7;
        assert!((AttentionScorer::base_score(&comp, &ctx) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weight_scores_zero() {
        let comp = critical().with_weight(0.0);
        assert_eq!(AttentionScorer::base_score(&comp, &Context::default()), 0.0);
    }
}
