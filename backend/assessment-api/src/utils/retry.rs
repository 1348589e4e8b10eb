use std::time::Duration;

/// Backoff policy for fire-and-forget checkpoint saves.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(25),
            max_backoff: Duration::from_millis(400),
            jitter_max: Some(Duration::from_millis(40)),
        }
    }
}

impl RetryPolicy {
    /// Used for the final submission checkpoint, where persistence matters.
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 6,
            base_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(1000),
            jitter_max: Some(Duration::from_millis(100)),
        }
    }
}

pub async fn retry_with_policy<F, Fut, T, E>(policy: RetryPolicy, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempts_left = policy.max_attempts;
    let mut backoff = policy.base_backoff;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                attempts_left = attempts_left.saturating_sub(1);
                if attempts_left == 0 {
                    return Err(e);
                }

                let wait = match policy.jitter_max {
                    Some(jitter_max) if jitter_max.as_millis() > 0 => {
                        let jitter_ms = jitter_max.as_millis() as u64;
                        backoff + Duration::from_millis(rand::random::<u64>() % (jitter_ms + 1))
                    }
                    _ => backoff,
                };
                tokio::time::sleep(wait).await;

                backoff = std::cmp::min(backoff * 2, policy.max_backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retry_succeeds_after_retries() {
        let counter = AtomicUsize::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
            jitter_max: None,
        };

        let res: Result<usize, &'static str> = retry_with_policy(policy, || async {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err("fail")
            } else {
                Ok(n)
            }
        })
        .await;

        assert!(res.is_ok());
        assert!(counter.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn retry_fails_after_max_attempts() {
        let counter = AtomicUsize::new(0);
        let policy = RetryPolicy {
            max_attempts: 2,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
            jitter_max: None,
        };

        let res: Result<(), &'static str> = retry_with_policy(policy, || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("always fail")
        })
        .await;

        assert!(res.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
