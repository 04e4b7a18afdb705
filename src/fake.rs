//! Scriptable in-memory document for engine and controller tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::driver::DocumentDriver;
use crate::error::{VerifyError, VerifyResult};

type Compute = Box<dyn Fn(&HashMap<String, String>) -> HashMap<String, String> + Send>;

/// Counters observable after the driver has been consumed by the controller.
#[derive(Debug, Default)]
pub(crate) struct Probe {
    pub closed: AtomicBool,
    pub navigations: AtomicUsize,
    pub resets: AtomicUsize,
    pub triggers: AtomicUsize,
}

impl Probe {
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn triggers(&self) -> usize {
        self.triggers.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }
}

/// A deterministic document: fields hold whatever was written (unless
/// configured otherwise) and triggering runs the compute function over the
/// current field values to produce output texts.
pub(crate) struct FakeDriver {
    fields: HashMap<String, String>,
    outputs: HashMap<String, String>,
    compute: Option<Compute>,
    missing: HashSet<String>,
    nonretentive: HashSet<String>,
    results_ready: bool,
    hang_results: bool,
    fail_navigate: bool,
    probe: Arc<Probe>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
            outputs: HashMap::new(),
            compute: None,
            missing: HashSet::new(),
            nonretentive: HashSet::new(),
            results_ready: false,
            hang_results: false,
            fail_navigate: false,
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn with_compute(
        mut self,
        f: impl Fn(&HashMap<String, String>) -> HashMap<String, String> + Send + 'static,
    ) -> Self {
        self.compute = Some(Box::new(f));
        self
    }

    /// Any interaction with `field` fails with FieldNotFound.
    pub fn with_missing(mut self, field: &str) -> Self {
        self.missing.insert(field.to_string());
        self
    }

    /// Writes to `field` do not stick (retention-check failures).
    pub fn with_nonretentive(mut self, field: &str) -> Self {
        self.nonretentive.insert(field.to_string());
        self
    }

    /// The results marker never becomes visible.
    pub fn with_hung_results(mut self) -> Self {
        self.hang_results = true;
        self
    }

    pub fn with_failing_navigate(mut self) -> Self {
        self.fail_navigate = true;
        self
    }

    pub fn probe(&self) -> Arc<Probe> {
        Arc::clone(&self.probe)
    }

    fn check_present(&self, field: &str) -> VerifyResult<()> {
        if self.missing.contains(field) {
            Err(VerifyError::FieldNotFound(field.to_string()))
        } else {
            Ok(())
        }
    }

    fn write(&mut self, field: &str, value: &str) -> VerifyResult<()> {
        self.check_present(field)?;
        let stored = if self.nonretentive.contains(field) {
            String::new()
        } else {
            value.to_string()
        };
        self.fields.insert(field.to_string(), stored);
        Ok(())
    }
}

#[async_trait]
impl DocumentDriver for FakeDriver {
    async fn navigate(&mut self, location: &str) -> VerifyResult<()> {
        if self.fail_navigate {
            return Err(VerifyError::Load(format!("cannot load {}", location)));
        }
        self.probe.navigations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_field(&mut self, field: &str, value: &str) -> VerifyResult<()> {
        self.write(field, value)
    }

    async fn select_option(&mut self, field: &str, value: &str) -> VerifyResult<()> {
        self.write(field, value)
    }

    async fn read_value(&mut self, field: &str) -> VerifyResult<String> {
        self.check_present(field)?;
        Ok(self.fields.get(field).cloned().unwrap_or_default())
    }

    async fn trigger(&mut self, action: &str) -> VerifyResult<()> {
        self.check_present(action)?;
        self.probe.triggers.fetch_add(1, Ordering::SeqCst);
        if let Some(compute) = &self.compute {
            self.outputs = compute(&self.fields);
        }
        self.results_ready = true;
        Ok(())
    }

    async fn wait_for_visible(&mut self, element: &str, timeout_ms: u64) -> VerifyResult<()> {
        if self.hang_results || !self.results_ready {
            return Err(VerifyError::Timeout {
                what: element.to_string(),
                ms: timeout_ms,
            });
        }
        Ok(())
    }

    async fn read_text(&mut self, element: &str) -> VerifyResult<String> {
        self.outputs
            .get(element)
            .cloned()
            .ok_or_else(|| VerifyError::FieldNotFound(element.to_string()))
    }

    async fn reset(&mut self) -> VerifyResult<()> {
        self.fields.clear();
        self.outputs.clear();
        self.results_ready = false;
        self.probe.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> VerifyResult<()> {
        self.probe.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
