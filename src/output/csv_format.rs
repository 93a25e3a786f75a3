//! CSV output formatting.

use crate::scanner::ScanReport;
use std::io::{self, Write};

/// Print results in CSV format.
pub fn print_csv(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    write_csv(stdout.lock(), report)
}

/// Write results as CSV to any writer.
pub fn write_csv<W: Write>(writer: W, report: &ScanReport) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["port", "state", "service", "version"])?;

    for result in &report.results {
        wtr.write_record([
            &result.port.to_string(),
            &result.state.to_string(),
            &result.service,
            &result.version,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{PortState, ScanMode, ScanResult};
    use crate::types::Port;
    use chrono::Local;
    use std::time::Duration;

    #[test]
    fn test_csv_rows() {
        let results = vec![
            ScanResult::new(Port::new(25).unwrap())
                .with_state(PortState::Open)
                .with_service("smtp")
                .with_version("mail.example.com ESMTP Postfix, ready"),
            ScanResult::new(Port::new(113).unwrap())
                .with_state(PortState::TcpWrapped)
                .with_service("ident"),
        ];
        let report = ScanReport::new(
            "mail.example.com",
            ScanMode::Targeted,
            true,
            Local::now(),
            2,
            Duration::from_millis(10),
            results,
        );

        let mut buf = Vec::new();
        write_csv(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "port,state,service,version");
        assert_eq!(lines[1], "25,open,smtp,\"mail.example.com ESMTP Postfix, ready\"");
        assert_eq!(lines[2], "113,tcpwrapped,ident,");
    }
}
