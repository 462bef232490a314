//! Per-client sliding-window rate limiter - 100 requests per 15 minutes
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_MAX_REQUESTS: usize = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Request timestamps per client. `None` groups callers whose address is unknown.
struct Windows {
    clients: HashMap<Option<IpAddr>, VecDeque<Instant>>,
}

pub struct RateLimiter {
    windows: Mutex<Windows>,
    /// Max requests per window
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(Windows {
                clients: HashMap::new(),
            }),
            max_requests,
            window,
        }
    }

    /// Record a request for `client`.
    /// Returns `Ok(())` if under the limit, `Err(wait)` with the time until a slot frees up otherwise.
    pub async fn check(&self, client: Option<IpAddr>) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;
        self.check_at(&mut windows, client, Instant::now())
    }

    fn check_at(&self, windows: &mut Windows, client: Option<IpAddr>, now: Instant) -> Result<(), Duration> {
        // Forget clients whose whole window has expired
        let window = self.window;
        windows.clients.retain(|_, times| {
            while let Some(&front) = times.front() {
                if now.duration_since(front) >= window {
                    times.pop_front();
                } else {
                    break;
                }
            }
            !times.is_empty()
        });

        let times = windows.clients.entry(client).or_default();
        if times.len() >= self.max_requests {
            if let Some(&oldest) = times.front() {
                return Err(window.saturating_sub(now.duration_since(oldest)));
            }
        }

        times.push_back(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}
