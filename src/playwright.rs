//! Playwright-backed document driver
//!
//! Spawns a long-lived Node helper that owns one Chromium page and speaks a
//! JSON-lines command/reply protocol over stdin/stdout. Keeping one page
//! alive for the whole run is what makes the document stateful across the
//! set-field / trigger / read-output steps of a scenario.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::driver::{DocumentDriver, DEFAULT_WAIT_TIMEOUT_MS};
use crate::error::{VerifyError, VerifyResult};

/// Helper script executed by `node`. Reads one JSON command per line and
/// answers with one JSON reply per line.
const HELPER_JS: &str = r#"
const readline = require('readline');
const { chromium } = require('playwright');

(async () => {
  const headless = process.env.GHG_E2E_HEADED !== '1';
  const browser = await chromium.launch({ headless });
  const page = await browser.newPage();
  await page.setViewportSize({ width: 1920, height: 1080 });

  const reply = (obj) => process.stdout.write(JSON.stringify(obj) + '\n');

  const mustExist = async (selector) => {
    if (await page.locator(selector).count() === 0) {
      const e = new Error('no element matches ' + selector);
      e.kind = 'not_found';
      throw e;
    }
  };

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    let cmd;
    try {
      cmd = JSON.parse(line);
    } catch (err) {
      reply({ ok: false, error: 'malformed command line', kind: 'driver' });
      continue;
    }
    try {
      switch (cmd.cmd) {
        case 'navigate':
          await page.goto(cmd.url, { waitUntil: 'load' });
          await page.waitForSelector(cmd.ready, { state: 'visible', timeout: cmd.timeout_ms });
          reply({ ok: true });
          break;
        case 'set_field':
          await mustExist(cmd.selector);
          await page.fill(cmd.selector, cmd.value);
          reply({ ok: true });
          break;
        case 'select_option':
          await mustExist(cmd.selector);
          await page.selectOption(cmd.selector, cmd.value);
          reply({ ok: true });
          break;
        case 'read_value':
          await mustExist(cmd.selector);
          reply({ ok: true, value: await page.inputValue(cmd.selector) });
          break;
        case 'click':
          await mustExist(cmd.selector);
          await page.click(cmd.selector);
          reply({ ok: true });
          break;
        case 'wait_visible':
          await page.waitForSelector(cmd.selector, { state: 'visible', timeout: cmd.timeout_ms });
          reply({ ok: true });
          break;
        case 'read_text':
          await mustExist(cmd.selector);
          reply({ ok: true, value: await page.textContent(cmd.selector) });
          break;
        case 'reload':
          await page.reload({ waitUntil: 'load' });
          await page.waitForSelector(cmd.ready, { state: 'visible', timeout: cmd.timeout_ms });
          reply({ ok: true });
          break;
        case 'close':
          reply({ ok: true });
          await browser.close();
          process.exit(0);
        default:
          reply({ ok: false, error: 'unknown command: ' + cmd.cmd, kind: 'driver' });
      }
    } catch (err) {
      const kind = err.kind || (err.name === 'TimeoutError' ? 'timeout' : 'driver');
      reply({ ok: false, error: String(err.message || err), kind });
    }
  }
})().catch((err) => {
  process.stderr.write(String((err && err.stack) || err) + '\n');
  process.exit(1);
});
"#;

#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Command<'a> {
    Navigate {
        url: &'a str,
        ready: &'a str,
        timeout_ms: u64,
    },
    SetField {
        selector: &'a str,
        value: &'a str,
    },
    SelectOption {
        selector: &'a str,
        value: &'a str,
    },
    ReadValue {
        selector: &'a str,
    },
    Click {
        selector: &'a str,
    },
    WaitVisible {
        selector: &'a str,
        timeout_ms: u64,
    },
    ReadText {
        selector: &'a str,
    },
    Reload {
        ready: &'a str,
        timeout_ms: u64,
    },
    Close,
}

#[derive(Debug, Deserialize)]
struct Reply {
    ok: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Configuration for the Playwright driver
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Selector that must be visible for the document to count as loaded
    pub ready_marker: String,

    /// Timeout for the ready marker after navigate/reload
    pub ready_timeout_ms: u64,

    /// Upper bound on any single command round-trip
    pub command_timeout_ms: u64,

    /// Run with a visible browser window (debugging)
    pub headed: bool,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            ready_marker: "#facilityName".to_string(),
            ready_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            command_timeout_ms: 30_000,
            headed: false,
        }
    }
}

/// Driver over a Playwright helper process
pub struct PlaywrightDriver {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    config: PlaywrightConfig,
    // Navigated-to location, kept for reset()
    location: Option<String>,
    // Keeps the helper script alive for the child's lifetime
    _script_dir: tempfile::TempDir,
}

impl PlaywrightDriver {
    /// Spawn the helper process and wait for it to accept commands.
    pub async fn launch(config: PlaywrightConfig) -> VerifyResult<Self> {
        Self::check_node_installed()?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("ghg-e2e-driver.js");
        std::fs::write(&script_path, HELPER_JS)?;

        debug!("Spawning Playwright helper: node {}", script_path.display());

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if config.headed {
            cmd.env("GHG_E2E_HEADED", "1");
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| VerifyError::Driver(format!("failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VerifyError::Driver("helper stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VerifyError::Driver("helper stdout not captured".to_string()))?;

        info!("Playwright helper started (pid: {:?})", child.id());

        Ok(Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            config,
            location: None,
            _script_dir: script_dir,
        })
    }

    /// Check that Node is available before spawning anything.
    fn check_node_installed() -> VerifyResult<()> {
        let status = std::process::Command::new("node")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(s) if s.success() => Ok(()),
            _ => Err(VerifyError::NodeNotFound),
        }
    }

    /// One command round-trip, bounded by the command timeout.
    async fn send(&mut self, command: Command<'_>) -> VerifyResult<Reply> {
        let mut line = serde_json::to_string(&command)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| VerifyError::Driver(format!("helper write failed: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| VerifyError::Driver(format!("helper flush failed: {}", e)))?;

        let timeout = Duration::from_millis(self.config.command_timeout_ms);
        let next = tokio::time::timeout(timeout, self.lines.next_line())
            .await
            .map_err(|_| VerifyError::Driver("helper did not reply in time".to_string()))?
            .map_err(|e| VerifyError::Driver(format!("helper read failed: {}", e)))?;

        let raw = next.ok_or_else(|| {
            VerifyError::Driver("helper exited before replying".to_string())
        })?;

        Ok(serde_json::from_str(&raw)?)
    }

    /// Map a failed reply onto the harness error taxonomy.
    fn reply_error(reply: Reply, what: &str, timeout_ms: u64) -> VerifyError {
        let message = reply.error.unwrap_or_else(|| "unknown driver error".to_string());
        match reply.kind.as_deref() {
            Some("not_found") => VerifyError::FieldNotFound(what.to_string()),
            Some("timeout") => VerifyError::Timeout {
                what: what.to_string(),
                ms: timeout_ms,
            },
            _ => VerifyError::Driver(message),
        }
    }

    async fn expect_ok(
        &mut self,
        command: Command<'_>,
        what: &str,
        timeout_ms: u64,
    ) -> VerifyResult<Reply> {
        let reply = self.send(command).await?;
        if reply.ok {
            Ok(reply)
        } else {
            Err(Self::reply_error(reply, what, timeout_ms))
        }
    }
}

#[async_trait]
impl DocumentDriver for PlaywrightDriver {
    async fn navigate(&mut self, location: &str) -> VerifyResult<()> {
        let ready = self.config.ready_marker.clone();
        let timeout_ms = self.config.ready_timeout_ms;
        let result = self
            .expect_ok(
                Command::Navigate {
                    url: location,
                    ready: &ready,
                    timeout_ms,
                },
                &ready,
                timeout_ms,
            )
            .await;

        match result {
            Ok(_) => {
                self.location = Some(location.to_string());
                Ok(())
            }
            // Ready marker not observable means the document never loaded
            Err(VerifyError::Timeout { what, ms }) => Err(VerifyError::Load(format!(
                "ready marker {} not visible within {}ms",
                what, ms
            ))),
            Err(e) => Err(e),
        }
    }

    async fn set_field(&mut self, field: &str, value: &str) -> VerifyResult<()> {
        self.expect_ok(
            Command::SetField {
                selector: field,
                value,
            },
            field,
            self.config.command_timeout_ms,
        )
        .await?;
        Ok(())
    }

    async fn select_option(&mut self, field: &str, value: &str) -> VerifyResult<()> {
        self.expect_ok(
            Command::SelectOption {
                selector: field,
                value,
            },
            field,
            self.config.command_timeout_ms,
        )
        .await?;
        Ok(())
    }

    async fn read_value(&mut self, field: &str) -> VerifyResult<String> {
        let reply = self
            .expect_ok(
                Command::ReadValue { selector: field },
                field,
                self.config.command_timeout_ms,
            )
            .await?;
        Ok(reply.value.unwrap_or_default())
    }

    async fn trigger(&mut self, action: &str) -> VerifyResult<()> {
        self.expect_ok(
            Command::Click { selector: action },
            action,
            self.config.command_timeout_ms,
        )
        .await?;
        Ok(())
    }

    async fn wait_for_visible(&mut self, element: &str, timeout_ms: u64) -> VerifyResult<()> {
        self.expect_ok(
            Command::WaitVisible {
                selector: element,
                timeout_ms,
            },
            element,
            timeout_ms,
        )
        .await?;
        Ok(())
    }

    async fn read_text(&mut self, element: &str) -> VerifyResult<String> {
        let reply = self
            .expect_ok(
                Command::ReadText { selector: element },
                element,
                self.config.command_timeout_ms,
            )
            .await?;
        Ok(reply.value.unwrap_or_default())
    }

    async fn reset(&mut self) -> VerifyResult<()> {
        let ready = self.config.ready_marker.clone();
        let timeout_ms = self.config.ready_timeout_ms;
        self.expect_ok(
            Command::Reload {
                ready: &ready,
                timeout_ms,
            },
            &ready,
            timeout_ms,
        )
        .await?;
        Ok(())
    }

    async fn close(&mut self) -> VerifyResult<()> {
        // Orderly shutdown; the Drop backstop kills the child if this fails.
        match self.send(Command::Close).await {
            Ok(_) => {}
            Err(e) => warn!("Helper close command failed: {}", e),
        }
        let _ = self.child.wait().await;
        Ok(())
    }
}

impl Drop for PlaywrightDriver {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_in_wire_format() {
        let cmd = Command::SetField {
            selector: "#facilityName",
            value: "Test Facility",
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(
            json,
            r##"{"cmd":"set_field","selector":"#facilityName","value":"Test Facility"}"##
        );

        let cmd = Command::WaitVisible {
            selector: "#results",
            timeout_ms: 5000,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(
            json,
            r##"{"cmd":"wait_visible","selector":"#results","timeout_ms":5000}"##
        );
    }

    #[test]
    fn replies_deserialize_with_optional_fields() {
        let reply: Reply = serde_json::from_str(r#"{"ok":true,"value":"2,025.13"}"#).unwrap();
        assert!(reply.ok);
        assert_eq!(reply.value.as_deref(), Some("2,025.13"));

        let reply: Reply =
            serde_json::from_str(r#"{"ok":false,"error":"no element","kind":"not_found"}"#)
                .unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.kind.as_deref(), Some("not_found"));
    }

    #[test]
    fn reply_errors_map_to_taxonomy() {
        let not_found = Reply {
            ok: false,
            value: None,
            error: Some("no element matches #missing".to_string()),
            kind: Some("not_found".to_string()),
        };
        assert!(matches!(
            PlaywrightDriver::reply_error(not_found, "#missing", 5000),
            VerifyError::FieldNotFound(_)
        ));

        let timeout = Reply {
            ok: false,
            value: None,
            error: Some("Timeout 5000ms exceeded".to_string()),
            kind: Some("timeout".to_string()),
        };
        assert!(matches!(
            PlaywrightDriver::reply_error(timeout, "#results", 5000),
            VerifyError::Timeout { ms: 5000, .. }
        ));
    }
}
