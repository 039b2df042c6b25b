//! End-to-end passes over real temp-file ledgers with a stub mailer.

#![allow(clippy::unwrap_used, clippy::pedantic)]

use std::fs;
use std::path::{Path, PathBuf};

use docsender_core::{Config, DeliveryError, Error, Mailer, PassSummary, rewrite_ledger};
use docsender_mime::Envelope;

const CONFIG: &str = "\
host = smtp.example.com
port = 465
login = operator
password = secret
from = billing@example.com
test_recepient = qa@test.com
delimiter = ;
subject_raw = Invoice {0} for {1} {2}
body_raw = Attached for {0} {1}.
";

/// One recorded delivery attempt.
#[derive(Debug, Clone)]
struct Delivery {
    from: String,
    to: Vec<String>,
    subject: String,
    attachments: Vec<PathBuf>,
}

/// Scriptable stand-in for the SMTP session.
#[derive(Debug, Default)]
struct StubMailer {
    attempts: Vec<Delivery>,
    fail_all: bool,
    fail_attempts: Vec<usize>,
}

impl StubMailer {
    fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }
}

impl Mailer for StubMailer {
    async fn deliver(&mut self, envelope: &Envelope) -> Result<(), DeliveryError> {
        let attempt = self.attempts.len();
        self.attempts.push(Delivery {
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            subject: envelope.subject.clone(),
            attachments: envelope.attachments.clone(),
        });
        if self.fail_all || self.fail_attempts.contains(&attempt) {
            return Err(DeliveryError::Transport("stub: connection reset".into()));
        }
        Ok(())
    }
}

/// Stub that actually serializes the envelope, so attachment reads
/// happen exactly as in production.
#[derive(Debug, Default)]
struct BuildingStubMailer {
    attempts: Vec<Delivery>,
}

impl Mailer for BuildingStubMailer {
    async fn deliver(&mut self, envelope: &Envelope) -> Result<(), DeliveryError> {
        self.attempts.push(Delivery {
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            subject: envelope.subject.clone(),
            attachments: envelope.attachments.clone(),
        });
        envelope.build()?;
        Ok(())
    }
}

fn config() -> Config {
    Config::parse(CONFIG).unwrap()
}

fn write_ledger(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("ledger.csv");
    let mut content = rows.join("\n");
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split(';').map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn eligible_rows_are_sent_and_stamped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &[
            "2023_03_01_AX;NO_SENT;;100;*a@x.com, b@x.com;Acme;f1.pdf;f2.pdf;AX",
            "2023_04_02_BX;NO_SENT;;200;c@x.com;Beta;g1.pdf;g2.pdf;BX",
        ],
    );

    let mut mailer = StubMailer::default();
    let summary = rewrite_ledger(&path, &config(), &mut mailer).await.unwrap();

    assert_eq!(
        summary,
        PassSummary {
            total: 2,
            sent: 2,
            errored: 0,
            skipped: 0
        }
    );
    assert_eq!(mailer.attempts.len(), 2);

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.len(), 9);
        assert_eq!(row[1], "SENT");
        assert!(!row[2].is_empty(), "timepoint must be stamped");
        assert!(
            chrono::NaiveDateTime::parse_from_str(&row[2], "%d.%m.%Y %H:%M").is_ok(),
            "timepoint {:?} must use the ledger format",
            row[2]
        );
    }
}

#[tokio::test]
async fn worked_example_renders_subject_and_recipients() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &["2023_03_01_AX;NO_SENT;;100;*a@x.com, b@x.com;Acme;f1.pdf;f2.pdf;AX"],
    );

    let mut mailer = StubMailer::default();
    rewrite_ledger(&path, &config(), &mut mailer).await.unwrap();

    let delivery = &mailer.attempts[0];
    assert_eq!(delivery.from, "billing@example.com");
    assert_eq!(delivery.to, vec!["a@x.com", "b@x.com"]);
    assert_eq!(delivery.subject, "Invoice AX for март 2023");
    assert_eq!(
        delivery.attachments,
        vec![PathBuf::from("f1.pdf"), PathBuf::from("f2.pdf")]
    );

    assert_eq!(read_rows(&path)[0][1], "SENT");
}

#[tokio::test]
async fn test_mode_routes_to_test_recipient_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &["2023_03_01_AX;TEST;;100;*a@x.com, b@x.com;Acme;f1.pdf;f2.pdf;AX"],
    );

    let mut mailer = StubMailer::default();
    rewrite_ledger(&path, &config(), &mut mailer).await.unwrap();

    assert_eq!(mailer.attempts[0].to, vec!["qa@test.com"]);
    assert_eq!(read_rows(&path)[0][1], "SENT");
}

#[tokio::test]
async fn sent_and_unknown_modes_pass_through_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &[
            "2023_03_01_AX;SENT;01.03.2023 09:00;100;a@x.com;Acme;f1.pdf;f2.pdf;AX",
            "2023_04_01_BX;WAITING;;200;b@x.com;Beta;g1.pdf;g2.pdf;BX",
            "2023_05_01_CX;ERROR;02.05.2023 11:30;300;c@x.com;Gamma;h1.pdf;h2.pdf;CX",
        ],
    );
    let before = fs::read(&path).unwrap();

    let mut mailer = StubMailer::default();
    let summary = rewrite_ledger(&path, &config(), &mut mailer).await.unwrap();

    assert_eq!(summary.skipped, 3);
    assert!(mailer.attempts.is_empty(), "no sends for ineligible rows");
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn rerun_after_success_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &["2023_03_01_AX;NO_SENT;;100;a@x.com;Acme;f1.pdf;f2.pdf;AX"],
    );

    let mut first = StubMailer::default();
    rewrite_ledger(&path, &config(), &mut first).await.unwrap();
    let after_first = fs::read(&path).unwrap();

    let mut second = StubMailer::default();
    let summary = rewrite_ledger(&path, &config(), &mut second).await.unwrap();

    assert!(second.attempts.is_empty());
    assert_eq!(summary.sent, 0);
    assert_eq!(fs::read(&path).unwrap(), after_first);
}

#[tokio::test]
async fn failed_delivery_records_error_and_preserves_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &["2023_03_01_AX;NO_SENT;;100;*a@x.com, b@x.com;Acme;f1.pdf;f2.pdf;AX"],
    );

    let mut mailer = StubMailer::failing();
    let summary = rewrite_ledger(&path, &config(), &mut mailer).await.unwrap();

    assert_eq!(summary.errored, 1);
    assert_eq!(mailer.attempts.len(), 1, "exactly one attempt per row");

    let row = &read_rows(&path)[0];
    assert_eq!(row[0], "2023_03_01_AX");
    assert_eq!(row[1], "ERROR");
    assert_eq!(row[3], "100");
    assert_eq!(row[4], "*a@x.com, b@x.com");
    assert_eq!(row[5], "Acme");
    assert_eq!(&row[6..9], &["f1.pdf", "f2.pdf", "AX"]);
}

#[tokio::test]
async fn missing_attachment_records_error_and_pass_continues() {
    let dir = tempfile::tempdir().unwrap();

    // Row 1 points at files that do not exist; row 2 at real ones.
    let present1 = dir.path().join("g1.pdf");
    let present2 = dir.path().join("g2.pdf");
    fs::write(&present1, b"%PDF-1.4 one").unwrap();
    fs::write(&present2, b"%PDF-1.4 two").unwrap();
    let ghost = dir.path().join("gone.pdf").display().to_string();

    let row1 = format!("2023_03_01_AX;NO_SENT;;100;*a@x.com, b@x.com;Acme;{ghost};{ghost};AX");
    let row2 = format!(
        "2023_04_01_BX;NO_SENT;;200;b@x.com;Beta;{};{};BX",
        present1.display(),
        present2.display()
    );
    let path = write_ledger(dir.path(), &[&row1, &row2]);

    let mut mailer = BuildingStubMailer::default();
    let summary = rewrite_ledger(&path, &config(), &mut mailer).await.unwrap();

    assert_eq!(summary.errored, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(mailer.attempts.len(), 2);

    let rows = read_rows(&path);
    assert_eq!(rows[0][1], "ERROR");
    assert_eq!(rows[0][3], "100");
    assert_eq!(rows[0][4], "*a@x.com, b@x.com");
    assert_eq!(rows[0][5], "Acme");
    assert_eq!(rows[0][8], "AX");
    assert_eq!(rows[1][1], "SENT");
}

#[tokio::test]
async fn error_rows_are_not_retried_on_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &["2023_03_01_AX;NO_SENT;;100;a@x.com;Acme;f1.pdf;f2.pdf;AX"],
    );

    let mut failing = StubMailer::failing();
    rewrite_ledger(&path, &config(), &mut failing).await.unwrap();
    assert_eq!(read_rows(&path)[0][1], "ERROR");

    let mut second = StubMailer::default();
    let summary = rewrite_ledger(&path, &config(), &mut second).await.unwrap();
    assert!(second.attempts.is_empty());
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &[
            "2023_03_01_AX;NO_SENT;;100;a@x.com;Acme;f1.pdf;f2.pdf;AX",
            "2023_04_01_BX;NO_SENT;;200;b@x.com;Beta;g1.pdf;g2.pdf;BX",
            "2023_05_01_CX;NO_SENT;;300;c@x.com;Gamma;h1.pdf;h2.pdf;CX",
        ],
    );

    let mut mailer = StubMailer {
        fail_attempts: vec![1],
        ..StubMailer::default()
    };
    let summary = rewrite_ledger(&path, &config(), &mut mailer).await.unwrap();

    assert_eq!(summary.sent, 2);
    assert_eq!(summary.errored, 1);
    let rows = read_rows(&path);
    assert_eq!(rows[0][1], "SENT");
    assert_eq!(rows[1][1], "ERROR");
    assert_eq!(rows[2][1], "SENT");
}

#[tokio::test]
async fn malformed_row_aborts_and_leaves_original_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &[
            "2023_03_01_AX;NO_SENT;;100;a@x.com;Acme;f1.pdf;f2.pdf;AX",
            "2023_04_01_BX;NO_SENT;;200;b@x.com;Beta;g1.pdf;g2.pdf;BX",
            "short;row",
            "2023_06_01_DX;NO_SENT;;400;d@x.com;Delta;i1.pdf;i2.pdf;DX",
        ],
    );
    let before = fs::read(&path).unwrap();

    let mut mailer = StubMailer::default();
    let err = rewrite_ledger(&path, &config(), &mut mailer)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Ledger(_)));
    assert_eq!(fs::read(&path).unwrap(), before, "original must be intact");

    // No temp file may leak into the ledger directory.
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("ledger.csv")]);
}

#[tokio::test]
async fn out_of_range_month_aborts_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(
        dir.path(),
        &["2023_13_01;NO_SENT;;100;a@x.com;Acme;f1.pdf;f2.pdf;AX"],
    );
    let before = fs::read(&path).unwrap();

    let mut mailer = StubMailer::default();
    let err = rewrite_ledger(&path, &config(), &mut mailer)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Compose { line: 1, .. }));
    assert!(mailer.attempts.is_empty());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn simple_schema_attaches_the_code_column() {
    let simple_config = Config::parse(
        &CONFIG
            .replace(
                "subject_raw = Invoice {0} for {1} {2}",
                "subject = Monthly notice",
            )
            .replace("body_raw = Attached for {0} {1}.", "body = See attachment."),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(dir.path(), &["docs/notice.pdf;NO_SENT;;50;*ops@x.com;Acme"]);

    let mut mailer = StubMailer::default();
    rewrite_ledger(&path, &simple_config, &mut mailer)
        .await
        .unwrap();

    let delivery = &mailer.attempts[0];
    assert_eq!(delivery.subject, "Monthly notice");
    assert_eq!(delivery.attachments, vec![PathBuf::from("docs/notice.pdf")]);
    assert_eq!(delivery.to, vec!["ops@x.com"]);

    let row = &read_rows(&path)[0];
    assert_eq!(row.len(), 6);
    assert_eq!(row[1], "SENT");
}

#[tokio::test]
async fn row_count_and_arity_survive_mixed_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let rows = [
        "2023_01_01_AX;NO_SENT;;1;a@x.com;A;f.pdf;g.pdf;AX",
        "2023_02_01_BX;SENT;01.02.2023 08:00;2;b@x.com;B;f.pdf;g.pdf;BX",
        "2023_03_01_CX;TEST;;3;c@x.com;C;f.pdf;g.pdf;CX",
        "2023_04_01_DX;LIMBO;;4;d@x.com;D;f.pdf;g.pdf;DX",
    ];
    let path = write_ledger(dir.path(), &rows);

    let mut mailer = StubMailer::default();
    let summary = rewrite_ledger(&path, &config(), &mut mailer).await.unwrap();

    assert_eq!(summary.total, 4);
    let out = read_rows(&path);
    assert_eq!(out.len(), rows.len());
    assert!(out.iter().all(|row| row.len() == 9));
    // Source order preserved.
    assert_eq!(out[0][0], "2023_01_01_AX");
    assert_eq!(out[3][0], "2023_04_01_DX");
    assert_eq!(out[3][1], "LIMBO");
}
