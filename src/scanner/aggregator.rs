//! Result aggregation.
//!
//! Drains the publication channel once every scan task has finished and
//! turns the collected records into an ordered [`ScanReport`].

use crate::scanner::traits::{PortState, ScanMode, ScanResult};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

/// Receive results until every sender is dropped, then sort them by port.
///
/// The sort is stable, so duplicate ports keep their arrival order.
pub async fn collect_results(mut rx: mpsc::Receiver<ScanResult>) -> Vec<ScanResult> {
    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results.sort_by_key(|r| r.port);
    results
}

/// Complete scan results, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: String,
    pub mode: ScanMode,
    pub service_detection: bool,
    pub started_at: DateTime<Local>,
    pub ports_scanned: usize,
    pub open_ports: usize,
    pub closed_ports: usize,
    pub filtered_ports: usize,
    pub tcpwrapped_ports: usize,
    pub duration_ms: u64,
    pub results: Vec<ScanResult>,
}

impl ScanReport {
    /// Build a report and tally the reported states.
    pub fn new(
        target: impl Into<String>,
        mode: ScanMode,
        service_detection: bool,
        started_at: DateTime<Local>,
        ports_scanned: usize,
        elapsed: Duration,
        results: Vec<ScanResult>,
    ) -> Self {
        let count = |state: PortState| results.iter().filter(|r| r.state == state).count();

        Self {
            target: target.into(),
            mode,
            service_detection,
            started_at,
            ports_scanned,
            open_ports: count(PortState::Open),
            closed_ports: count(PortState::Closed),
            filtered_ports: count(PortState::Filtered),
            tcpwrapped_ports: count(PortState::TcpWrapped),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            results,
        }
    }

    /// When the scan finished.
    pub fn completed_at(&self) -> DateTime<Local> {
        self.started_at + chrono::Duration::milliseconds(self.duration_ms as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Port;

    fn record(port: u16, state: PortState, service: &str) -> ScanResult {
        ScanResult::new(Port::new(port).unwrap())
            .with_state(state)
            .with_service(service)
    }

    #[tokio::test]
    async fn test_collect_sorts_by_port() {
        let (tx, rx) = mpsc::channel(8);
        for port in [443, 22, 8080, 80] {
            tx.send(record(port, PortState::Open, "")).await.unwrap();
        }
        drop(tx);

        let ports: Vec<u16> = collect_results(rx)
            .await
            .iter()
            .map(|r| r.port.as_u16())
            .collect();
        assert_eq!(ports, vec![22, 80, 443, 8080]);
    }

    #[tokio::test]
    async fn test_collect_is_stable_for_duplicates() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(record(80, PortState::Closed, "second")).await.unwrap();
        tx.send(record(22, PortState::Open, "ssh")).await.unwrap();
        tx.send(record(80, PortState::Closed, "first")).await.unwrap();
        drop(tx);

        let results = collect_results(rx).await;
        let services: Vec<&str> = results.iter().map(|r| r.service.as_str()).collect();
        assert_eq!(services, vec!["ssh", "second", "first"]);
    }

    #[tokio::test]
    async fn test_collect_waits_for_all_senders() {
        let (tx, rx) = mpsc::channel(8);
        let late = tx.clone();
        drop(tx);

        let collector = tokio::spawn(collect_results(rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        late.send(record(25, PortState::Open, "smtp")).await.unwrap();
        drop(late);

        let results = collector.await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_report_tallies() {
        let results = vec![
            record(22, PortState::Open, "ssh"),
            record(23, PortState::Closed, "telnet"),
            record(25, PortState::Filtered, "smtp"),
            record(80, PortState::Open, "http"),
            record(113, PortState::TcpWrapped, "ident"),
        ];
        let started = Local::now();
        let report = ScanReport::new(
            "127.0.0.1",
            ScanMode::Targeted,
            true,
            started,
            5,
            Duration::from_millis(1500),
            results,
        );

        assert_eq!(report.open_ports, 2);
        assert_eq!(report.closed_ports, 1);
        assert_eq!(report.filtered_ports, 1);
        assert_eq!(report.tcpwrapped_ports, 1);
        assert_eq!(report.duration_ms, 1500);
        assert_eq!(report.completed_at() - started, chrono::Duration::milliseconds(1500));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "targeted");
        assert_eq!(json["results"][4]["state"], "tcpwrapped");
        assert_eq!(json["results"][0]["port"], 22);
    }
}
