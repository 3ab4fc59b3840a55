//! Canned replies served when no backend produced text.

use rand::seq::SliceRandom;

use cr_domain::error::FallbackReason;

/// Assistant-voice lines used in demo mode.
pub const CANNED_REPLIES: &[&str] = &[
    "Hi there! I'm running in demo mode right now, but I'm happy to chat.",
    "That's an interesting question. Tell me a little more about what you have in mind.",
    "Thanks for your message! I can only give sample answers at the moment.",
    "Good point. Let's break that down into smaller pieces and go from there.",
    "I'd love to help with that. Could you share a bit more detail?",
    "Here's a thought: start simple, then refine once the basics work.",
    "I hear you. Sometimes stepping back for a moment makes the answer clearer.",
    "Great question! A full answer will be available once a language model is connected.",
    "Let me think about that... In demo mode my answers are limited, but keep them coming!",
    "I'm a placeholder reply for now, but the conversation plumbing is working end to end.",
    "Noted! When a backend is configured you'll get a real, context-aware reply here.",
];

pub const QUOTA_NOTE: &str = "[Note: Using demo mode due to quota limit. Please try again later.]";
pub const SERVICE_ERROR_NOTE: &str = "[Note: Using demo mode due to service error.]";
pub const NOT_CONFIGURED_NOTE: &str =
    "[Note: Using demo mode. Configure an AI backend to get generated replies.]";

/// The bracketed diagnostic suffix for a reason.
pub fn note_for(reason: FallbackReason) -> &'static str {
    match reason {
        FallbackReason::Quota => QUOTA_NOTE,
        FallbackReason::ServiceError => SERVICE_ERROR_NOTE,
        FallbackReason::NotConfigured => NOT_CONFIGURED_NOTE,
    }
}

/// Pick a canned line uniformly at random and append the note for `reason`.
pub fn fallback_reply(reason: FallbackReason) -> String {
    let line = CANNED_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("I'm running in demo mode.");
    format!("{line}\n\n{}", note_for(reason))
}
