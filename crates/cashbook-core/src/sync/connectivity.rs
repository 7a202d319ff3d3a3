//! Connectivity detection by probing the API host.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::client::HttpTransactionSubmitter;
use super::coordinator::ConnectivitySignal;

/// Answers "can we reach the server right now?"
pub trait ConnectivityProbe: Send + Sync {
    fn is_reachable(&self) -> impl Future<Output = bool> + Send;
}

/// Treats any HTTP response from the URL as online; only transport errors
/// count as offline.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// Probe the submitter's API host with the submitter's own client.
    pub fn for_submitter(submitter: &HttpTransactionSubmitter) -> Self {
        Self::new(submitter.base_url(), submitter.client().clone())
    }
}

impl ConnectivityProbe for HttpProbe {
    async fn is_reachable(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!("Connectivity probe failed: {error}");
                false
            }
        }
    }
}

/// Signal to emit when reachability moves from `previous` to `current`
pub const fn transition(previous: bool, current: bool) -> Option<ConnectivitySignal> {
    match (previous, current) {
        (false, true) => Some(ConnectivitySignal::Online),
        (true, false) => Some(ConnectivitySignal::Offline),
        _ => None,
    }
}

/// Polls a probe and reports online/offline transitions.
pub struct ConnectivityMonitor<P> {
    probe: P,
    interval: Duration,
}

impl<P: ConnectivityProbe> ConnectivityMonitor<P> {
    pub const fn new(probe: P, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// One-off check, for the initial state
    pub async fn check(&self) -> bool {
        self.probe.is_reachable().await
    }

    /// Poll until the receiving side goes away.
    ///
    /// `initial` is the state the receiver already knows about; only
    /// changes from it are sent.
    pub async fn run(self, initial: bool, signals: mpsc::Sender<ConnectivitySignal>) {
        let mut online = initial;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = signals.closed() => break,
                _ = ticker.tick() => {}
            }

            let reachable = self.probe.is_reachable().await;
            let Some(signal) = transition(online, reachable) else {
                continue;
            };
            online = reachable;
            if signals.send(signal).await.is_err() {
                break;
            }
        }

        tracing::debug!("Connectivity monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedProbe {
        answers: Mutex<VecDeque<bool>>,
    }

    impl ScriptedProbe {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().copied().collect()),
            }
        }
    }

    impl ConnectivityProbe for ScriptedProbe {
        async fn is_reachable(&self) -> bool {
            let mut answers = self.answers.lock().unwrap();
            // Hold the last answer once the script runs out
            if answers.len() > 1 {
                answers.pop_front().unwrap_or(false)
            } else {
                answers.front().copied().unwrap_or(false)
            }
        }
    }

    #[test]
    fn transition_only_on_change() {
        assert_eq!(transition(false, true), Some(ConnectivitySignal::Online));
        assert_eq!(transition(true, false), Some(ConnectivitySignal::Offline));
        assert_eq!(transition(true, true), None);
        assert_eq!(transition(false, false), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn monitor_emits_each_transition_once() {
        let probe = ScriptedProbe::new(&[false, true, true, false, false, true]);
        let monitor = ConnectivityMonitor::new(probe, Duration::from_millis(5));
        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(monitor.run(false, tx));

        let mut seen = Vec::new();
        for _ in 0..3 {
            let signal = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            seen.push(signal);
        }
        assert_eq!(
            seen,
            vec![
                ConnectivitySignal::Online,
                ConnectivitySignal::Offline,
                ConnectivitySignal::Online,
            ]
        );

        drop(rx);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_probe_reports_unreachable_host() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let submitter = HttpTransactionSubmitter::new(
            format!("http://{addr}"),
            None,
            Duration::from_secs(2),
        )
        .unwrap();
        let probe = HttpProbe::for_submitter(&submitter);
        assert!(!probe.is_reachable().await);
    }
}
