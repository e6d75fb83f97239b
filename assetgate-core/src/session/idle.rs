//! Sign out after a period of inactivity

use super::store::AuthService;
use crate::config::IdleConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Background task that signs the user out once nothing has called
/// [`IdleMonitor::touch`] for `timeout`
///
/// The sign-out goes through the auth service, so the auth store sees an
/// ordinary signed-out event.
pub struct IdleMonitor {
    last_activity: Arc<Mutex<Instant>>,
    timeout: Duration,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl IdleMonitor {
    /// Start monitoring
    pub fn start(auth: Arc<dyn AuthService>, timeout: Duration, check_interval: Duration) -> Self {
        let last_activity = Arc::new(Mutex::new(Instant::now()));
        let activity = Arc::clone(&last_activity);

        let task = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(check_interval);
            loop {
                interval_timer.tick().await;

                let idle_for = read_activity(&activity).elapsed();
                if idle_for < timeout {
                    continue;
                }

                match auth.current_session().await {
                    Ok(Some(session)) => {
                        log::info!(
                            "Signing out {} after {}s of inactivity",
                            session.identity.id,
                            idle_for.as_secs()
                        );
                        if let Err(e) = auth.sign_out().await {
                            log::error!("Idle sign-out failed: {}", e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("Idle check could not read the session: {}", e),
                }
                // One sign-out per idle period
                *write_activity(&activity) = Instant::now();
            }
        });

        Self { last_activity, timeout, task: Some(task) }
    }

    /// Start monitoring when enabled in `config`
    pub fn from_config(auth: Arc<dyn AuthService>, config: &IdleConfig) -> Option<Self> {
        config.enabled.then(|| Self::start(auth, config.timeout(), config.check_interval()))
    }

    /// Record user activity
    pub fn touch(&self) {
        *write_activity(&self.last_activity) = Instant::now();
    }

    /// Time since the last recorded activity
    pub fn idle_for(&self) -> Duration {
        read_activity(&self.last_activity).elapsed()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stop monitoring
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for IdleMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_activity(activity: &Mutex<Instant>) -> Instant {
    *activity.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_activity(activity: &Mutex<Instant>) -> std::sync::MutexGuard<'_, Instant> {
    activity.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Identity, MemoryAuthService};

    #[tokio::test]
    async fn test_signs_out_after_timeout() {
        let auth = MemoryAuthService::with_session(Identity::new("u1"));
        let _monitor = IdleMonitor::start(
            Arc::new(auth.clone()),
            Duration::from_millis(50),
            Duration::from_millis(10),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(auth.session().is_none());
    }

    #[tokio::test]
    async fn test_activity_keeps_session() {
        let auth = MemoryAuthService::with_session(Identity::new("u1"));
        let monitor = IdleMonitor::start(
            Arc::new(auth.clone()),
            Duration::from_millis(300),
            Duration::from_millis(10),
        );

        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            monitor.touch();
        }
        assert!(auth.session().is_some());
        assert!(monitor.idle_for() < monitor.timeout());
    }

    #[tokio::test]
    async fn test_disabled_by_default() {
        let auth: Arc<dyn AuthService> = Arc::new(MemoryAuthService::new());
        assert!(IdleMonitor::from_config(auth, &IdleConfig::default()).is_none());
    }
}
