//! Platform tiers and the re-run policy attached to each.
//!
//! Rapid observer/timer fan-out is the known way to crash WebKit on iOS, so
//! the controller never branches on the platform directly: a detector picks
//! a [`Tier`] once and every timing decision reads from [`TierParams`].

use smallvec::{smallvec, SmallVec};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Desktop engines: converge as fast as possible.
    Aggressive,
    /// Other mobile engines.
    Moderate,
    /// iOS WebKit: fewest DOM writes, no observers.
    Conservative,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Aggressive => "aggressive",
            Tier::Moderate => "moderate",
            Tier::Conservative => "conservative",
        }
    }

}

/// Settle-loop bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SettleParams {
    /// Passes run on consecutive animation frames right after start-up.
    pub animation_frames: u8,
    /// Delay between settle checks once the frame burst is over.
    pub interval_ms: u32,
    /// Two measurements closer than this are considered equal.
    pub tolerance_px: f64,
    pub max_retries: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// Re-run until two consecutive measurements agree.
    Settle(SettleParams),
    /// A few widely spaced deferred re-runs, nothing else.
    Fixed { delays_ms: SmallVec<[u32; 4]> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TierParams {
    pub tier: Tier,
    pub resize_debounce_ms: u32,
    pub orientation_delay_ms: u32,
    pub observer_enabled: bool,
    pub observer_debounce_ms: u32,
    /// `will-change`/`backface-visibility` hints on the canvas root.
    pub transform_hints: bool,
    pub overlay_debounce_ms: u32,
    /// Browser-reported tasks longer than this land in the diagnostic log.
    pub long_task_threshold_ms: f64,
    pub retry: RetryPolicy,
}

impl TierParams {
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Aggressive => Self {
                tier,
                resize_debounce_ms: 150,
                orientation_delay_ms: 200,
                observer_enabled: true,
                observer_debounce_ms: 150,
                transform_hints: true,
                overlay_debounce_ms: 100,
                long_task_threshold_ms: 50.0,
                retry: RetryPolicy::Settle(SettleParams {
                    animation_frames: 3,
                    interval_ms: 50,
                    tolerance_px: 0.5,
                    max_retries: 12,
                }),
            },
            Tier::Moderate => Self {
                tier,
                resize_debounce_ms: 250,
                orientation_delay_ms: 300,
                observer_enabled: true,
                observer_debounce_ms: 250,
                transform_hints: true,
                overlay_debounce_ms: 100,
                long_task_threshold_ms: 50.0,
                retry: RetryPolicy::Settle(SettleParams {
                    animation_frames: 1,
                    interval_ms: 120,
                    tolerance_px: 1.0,
                    max_retries: 8,
                }),
            },
            Tier::Conservative => Self {
                tier,
                resize_debounce_ms: 600,
                orientation_delay_ms: 500,
                observer_enabled: false,
                observer_debounce_ms: 0,
                transform_hints: false,
                overlay_debounce_ms: 250,
                long_task_threshold_ms: 30.0,
                retry: RetryPolicy::Fixed {
                    delays_ms: smallvec![300, 1200, 3000],
                },
            },
        }
    }

    /// Upper bound on start-up re-runs this policy can schedule.
    pub fn max_startup_passes(&self) -> u32 {
        match &self.retry {
            RetryPolicy::Settle(p) => p.animation_frames as u32 + p.max_retries,
            RetryPolicy::Fixed { delays_ms } => delays_ms.len() as u32,
        }
    }
}

/// What a detector gets to look at.
#[derive(Clone, Debug, Default)]
pub struct PlatformInfo {
    pub user_agent: String,
    pub max_touch_points: u32,
}

pub trait TierDetector {
    fn detect(&self, platform: &PlatformInfo) -> Tier;
}

/// Coarse user-agent sniffing, kept behind [`TierDetector`] so it can be
/// swapped for a capability check.
#[derive(Clone, Copy, Debug, Default)]
pub struct UserAgentDetector;

impl TierDetector for UserAgentDetector {
    fn detect(&self, platform: &PlatformInfo) -> Tier {
        let ua = platform.user_agent.to_ascii_lowercase();
        let ios = ua.contains("iphone")
            || ua.contains("ipad")
            || ua.contains("ipod")
            // iPadOS reports a desktop Safari UA but exposes touch points
            || (ua.contains("macintosh") && platform.max_touch_points > 1);
        if ios {
            return Tier::Conservative;
        }
        let mobile = ua.contains("android") || ua.contains("mobile");
        if mobile {
            Tier::Moderate
        } else {
            Tier::Aggressive
        }
    }
}

/// Always returns the same tier; handy for tests and forced overrides.
#[derive(Clone, Copy, Debug)]
pub struct FixedTier(pub Tier);

impl TierDetector for FixedTier {
    fn detect(&self, _platform: &PlatformInfo) -> Tier {
        self.0
    }
}

/// Parse a forced tier, e.g. from a `?tier=` query parameter.
pub fn parse_tier(value: &str) -> Option<Tier> {
    match value.trim().to_ascii_lowercase().as_str() {
        "aggressive" => Some(Tier::Aggressive),
        "moderate" => Some(Tier::Moderate),
        "conservative" => Some(Tier::Conservative),
        _ => None,
    }
}

/// Query parameter that forces a tier, e.g. `?tier=conservative`.
pub const TIER_QUERY_PARAM: &str = "tier";

/// Forced tier from a location query string.
pub fn tier_from_query(search: &str) -> Option<Tier> {
    search
        .trim_start_matches('?')
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key == TIER_QUERY_PARAM {
                parse_tier(value)
            } else {
                None
            }
        })
}
