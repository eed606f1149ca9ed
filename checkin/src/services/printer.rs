//! CUPS print sink
//!
//! Every submission is written to a temporary PostScript file and handed to
//! `lp` as one job. The file is removed when the submission finishes, on
//! every path.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use shared::{checkin_debug, checkin_error};
use shared::logging::Component;

use crate::config::KioskConfig;
use crate::core::layout::RenderedPage;
use crate::error::{CheckinError, CheckinResult};
use crate::services::postscript::encode_document;
use crate::traits::PrintSink;

pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Media name for the 30256 shipping label (167 x 288 points)
pub const PAGE_SIZE: &str = "PageSize=w167h288";

/// Landscape orientation
pub const ORIENTATION: &str = "orientation-requested=4";

const SPOOL_PREFIX: &str = "checkin-labels-";
const SPOOL_SUFFIX: &str = ".ps";

/// Print sink backed by the CUPS command line tools
#[derive(Clone, Debug)]
pub struct CupsPrintSink {
    printer_name: String,
    lp_program: PathBuf,
    lpstat_program: PathBuf,
    spool_dir: Option<PathBuf>,
    submit_timeout: Duration,
    status_timeout: Duration,
}

impl CupsPrintSink {
    pub fn new(printer_name: impl Into<String>) -> Self {
        Self {
            printer_name: printer_name.into(),
            lp_program: PathBuf::from("lp"),
            lpstat_program: PathBuf::from("lpstat"),
            spool_dir: None,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }

    pub fn from_config(config: &KioskConfig) -> Self {
        Self::new(config.printer_name.clone())
    }

    /// Use a different `lp` executable (fluent API)
    pub fn with_lp_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.lp_program = program.into();
        self
    }

    /// Use a different `lpstat` executable (fluent API)
    pub fn with_lpstat_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.lpstat_program = program.into();
        self
    }

    /// Write spool files here instead of the system temp directory
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = Some(dir.into());
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    pub fn printer_name(&self) -> &str {
        &self.printer_name
    }

    /// Arguments passed to `lp` for one spool file
    pub fn lp_args(&self, file: &Path) -> Vec<String> {
        vec![
            "-d".to_string(),
            self.printer_name.clone(),
            "-o".to_string(),
            PAGE_SIZE.to_string(),
            "-o".to_string(),
            ORIENTATION.to_string(),
            "-o".to_string(),
            "fit-to-page".to_string(),
            file.to_string_lossy().into_owned(),
        ]
    }

    /// Raw `lpstat -p` listing of every configured printer
    pub async fn list_printers(&self) -> CheckinResult<String> {
        let output = self
            .run(&self.lpstat_program, &["-p".to_string()], self.status_timeout)
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spool_file(&self) -> std::io::Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SPOOL_PREFIX).suffix(SPOOL_SUFFIX);
        match &self.spool_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }

    async fn run(&self, program: &Path, args: &[String], timeout: Duration) -> CheckinResult<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let operation = program.display().to_string();
        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(CheckinError::print(format!("failed to run {operation}: {e}"))),
            Err(_) => Err(CheckinError::Timeout { operation, timeout }),
        }
    }
}

#[async_trait]
impl PrintSink for CupsPrintSink {
    async fn submit(&self, pages: &[RenderedPage]) -> CheckinResult<()> {
        if pages.is_empty() {
            return Err(CheckinError::print("no pages to print"));
        }

        // Removed on drop, including every early return below
        let spool = self.spool_file()?;
        tokio::fs::write(spool.path(), encode_document(pages)).await?;

        checkin_debug!(
            Component::Printer,
            "🖨️ Sending {} pages to {} via {}",
            pages.len(),
            self.printer_name,
            spool.path().display()
        );

        let output = self
            .run(&self.lp_program, &self.lp_args(spool.path()), self.submit_timeout)
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            checkin_error!(
                Component::Printer,
                printer = %self.printer_name,
                "lp rejected the job ({}): {}",
                output.status,
                stderr.trim()
            );
            return Err(CheckinError::print(format!(
                "lp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let args = ["-p".to_string(), self.printer_name.clone()];
        match self.run(&self.lpstat_program, &args, self.status_timeout).await {
            Ok(output) => output.status.success(),
            Err(e) => {
                checkin_debug!(Component::Printer, "Printer status check failed: {}", e);
                false
            }
        }
    }
}
