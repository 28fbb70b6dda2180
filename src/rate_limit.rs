//! Sliding-window throttles for the abuse-prone endpoints.
//!
//! Hit windows live in process memory (a DashMap keyed by action and caller),
//! so counts are per-instance and reset on restart. Budgets resolve from
//! application configuration once at startup. A multi-instance deployment
//! would need a shared store behind the same interface.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86_400);

static HITS: Lazy<DashMap<(&'static str, String), VecDeque<Instant>>> = Lazy::new(DashMap::new);

static BUDGETS: Lazy<ArcSwap<Budgets>> = Lazy::new(|| ArcSwap::from_pointee(Budgets::default()));

/// Refusal carrying the wait a client should observe before retrying.
#[derive(Debug, Clone)]
pub struct Throttled {
    pub retry_after_seconds: u64,
}

/// One action's budget: this many hits inside this window.
#[derive(Debug, Clone, Copy)]
struct Budget {
    max_hits: usize,
    window: Duration,
}

#[derive(Debug, Clone)]
struct Budgets {
    login: Budget,
    registration: Budget,
    queries: Budget,
    calls: Budget,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            login: Budget {
                max_hits: 5,
                window: Duration::from_secs(300),
            },
            registration: Budget {
                max_hits: 3,
                window: HOUR,
            },
            queries: Budget {
                max_hits: 10,
                window: HOUR,
            },
            calls: Budget {
                max_hits: 5,
                window: DAY,
            },
        }
    }
}

impl Budgets {
    fn from_settings() -> Self {
        let conf = crate::app_config::rate_limit();
        Self {
            login: Budget {
                max_hits: conf.login_max_attempts as usize,
                window: Duration::from_secs(conf.login_window_seconds.into()),
            },
            registration: Budget {
                max_hits: conf.registration_per_hour as usize,
                window: HOUR,
            },
            queries: Budget {
                max_hits: conf.queries_per_hour as usize,
                window: HOUR,
            },
            calls: Budget {
                max_hits: conf.call_requests_per_day as usize,
                window: DAY,
            },
        }
    }
}

/// Resolve budgets from loaded configuration. Call once at startup, after
/// `app_config::init`.
pub fn init_rate_limits() {
    BUDGETS.store(Arc::new(Budgets::from_settings()));
    log::info!("Rate limit budgets loaded");
}

/// Record one hit against a caller's window, refusing it when the budget is
/// already spent. Timestamps are appended in order, so expiry always prunes
/// from the front.
fn record_hit(action: &'static str, caller: String, budget: Budget) -> Result<(), Throttled> {
    let now = Instant::now();
    let mut hits = HITS.entry((action, caller)).or_default();

    while let Some(&oldest) = hits.front() {
        if now.duration_since(oldest) < budget.window {
            break;
        }
        hits.pop_front();
    }

    if hits.len() >= budget.max_hits {
        // The oldest hit decides when a slot opens up again.
        let wait = hits
            .front()
            .map(|&oldest| budget.window.saturating_sub(now.duration_since(oldest)))
            .unwrap_or_default();
        return Err(Throttled {
            retry_after_seconds: wait.as_secs() + 1,
        });
    }

    hits.push_back(now);
    Ok(())
}

/// Login attempts, keyed by client address and claimed username together.
pub fn check_login_rate_limit(ip: &str, username: &str) -> Result<(), Throttled> {
    let budgets = BUDGETS.load();
    record_hit("login", format!("{}:{}", ip, username), budgets.login)
}

/// Account creation, keyed by client address.
pub fn check_registration_rate_limit(ip: &str) -> Result<(), Throttled> {
    let budgets = BUDGETS.load();
    record_hit("register", ip.to_owned(), budgets.registration)
}

/// Query submissions, keyed by investor account.
pub fn check_query_rate_limit(user_id: i32) -> Result<(), Throttled> {
    let budgets = BUDGETS.load();
    record_hit("query", user_id.to_string(), budgets.queries)
}

/// Call requests, keyed by requester account.
pub fn check_call_request_rate_limit(user_id: i32) -> Result<(), Throttled> {
    let budgets = BUDGETS.load();
    record_hit("call", user_id.to_string(), budgets.calls)
}

/// Drop callers whose entire window has passed. The maintenance task in the
/// server binary calls this every few minutes so one-off callers do not pin
/// map entries forever.
pub fn sweep_stale() {
    let now = Instant::now();
    // The longest window bounds how long any timestamp stays relevant.
    let horizon = DAY;
    HITS.retain(|_, hits| {
        while let Some(&oldest) = hits.front() {
            if now.duration_since(oldest) < horizon {
                break;
            }
            hits.pop_front();
        }
        !hits.is_empty()
    });
}
