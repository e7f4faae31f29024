use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{ACCEPT_LANGUAGE, USER_AGENTS};

/// Headers that identify one outbound request. Built fresh for every attempt and
/// never shared between tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_agent: &'static str,
    pub accept_language: &'static str,
}

impl RequestIdentity {
    /// Picks a user agent from the fixed pool.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::pick_from(USER_AGENTS, rng)
    }

    pub fn pick_from<R: Rng + ?Sized>(pool: &[&'static str], rng: &mut R) -> Self {
        let user_agent = pool.choose(rng).copied().unwrap_or(USER_AGENTS[0]);
        Self {
            user_agent,
            accept_language: ACCEPT_LANGUAGE,
        }
    }
}
