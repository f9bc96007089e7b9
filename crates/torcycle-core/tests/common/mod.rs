//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record what the session
//! asks of the outside world without touching it.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use torcycle_core::config::RotatorConfig;
use torcycle_core::error::{Error, Result};
use torcycle_core::traits::{
    AddressProbe, CommandStatus, Console, ControlBackend, DaemonState, Progress, ServiceAction,
    ServiceManager,
};
use torcycle_core::{Lifecycle, Rotator, RotatorEvent, Session, TerminationReason};
use tokio::sync::mpsc;

/// A ServiceManager that records every action
pub struct MockServiceManager {
    /// Actions in call order
    actions: Arc<Mutex<Vec<ServiceAction>>>,
    /// State returned by query_state()
    state: DaemonState,
    /// Backend reported by backend()
    backend: ControlBackend,
    /// Actions that exit non-zero
    failing: HashSet<ServiceAction>,
    /// Actions whose command cannot be spawned
    unspawnable: HashSet<ServiceAction>,
    /// Action during which a terminal signal arrives
    signalled_during: Option<(ServiceAction, Lifecycle)>,
    /// query_state() cannot run its command
    status_broken: bool,
}

impl MockServiceManager {
    /// An active daemon under systemctl where every action succeeds
    pub fn new() -> Self {
        Self {
            actions: Arc::new(Mutex::new(Vec::new())),
            state: DaemonState::Active,
            backend: ControlBackend::Systemctl,
            failing: HashSet::new(),
            unspawnable: HashSet::new(),
            signalled_during: None,
            status_broken: false,
        }
    }

    pub fn with_state(mut self, state: DaemonState) -> Self {
        self.state = state;
        self
    }

    /// No status mechanism: query_state() reports Unknown
    pub fn without_systemctl(mut self) -> Self {
        self.backend = ControlBackend::Service;
        self.state = DaemonState::Unknown;
        self
    }

    pub fn failing(mut self, action: ServiceAction) -> Self {
        self.failing.insert(action);
        self
    }

    pub fn unspawnable(mut self, action: ServiceAction) -> Self {
        self.unspawnable.insert(action);
        self
    }

    /// Terminate `lifecycle` while `action` runs; the command dies with no exit code
    pub fn signalled_during(mut self, action: ServiceAction, lifecycle: &Lifecycle) -> Self {
        self.signalled_during = Some((action, lifecycle.clone()));
        self
    }

    /// systemctl is present but its status check cannot be spawned
    pub fn with_broken_status(mut self) -> Self {
        self.status_broken = true;
        self
    }

    /// Create a MockServiceManager that shares the action log with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            actions: Arc::clone(&other.actions),
            state: other.state,
            backend: other.backend,
            failing: other.failing.clone(),
            unspawnable: other.unspawnable.clone(),
            signalled_during: other.signalled_during.clone(),
            status_broken: other.status_broken,
        }
    }

    pub fn actions(&self) -> Vec<ServiceAction> {
        self.actions.lock().unwrap().clone()
    }

    pub fn count(&self, action: ServiceAction) -> usize {
        self.actions().iter().filter(|a| **a == action).count()
    }
}

#[async_trait::async_trait]
impl ServiceManager for MockServiceManager {
    async fn manage(&self, action: ServiceAction) -> Result<CommandStatus> {
        self.actions.lock().unwrap().push(action);

        if self.unspawnable.contains(&action) {
            return Err(Error::service_control(format!("{}: not found", action)));
        }

        if let Some((signalled, lifecycle)) = &self.signalled_during
            && *signalled == action
        {
            lifecycle.terminate(TerminationReason::Interrupt);
            return Ok(CommandStatus { code: None });
        }

        if self.failing.contains(&action) {
            Ok(CommandStatus::from_code(1))
        } else {
            Ok(CommandStatus::from_code(0))
        }
    }

    async fn query_state(&self) -> Result<DaemonState> {
        if self.status_broken {
            return Err(Error::service_control("systemctl: permission denied"));
        }
        Ok(self.state)
    }

    fn backend(&self) -> ControlBackend {
        self.backend
    }
}

/// What the probe double does on each call
#[derive(Clone)]
pub enum ProbeBehavior {
    /// Return `10.0.0.<n>` on the n-th call
    Sequential,
    /// Always fail with this cause
    Fail(&'static str),
    /// Never complete
    Hang,
}

/// An AddressProbe that counts calls
pub struct MockProbe {
    behavior: ProbeBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockProbe {
    pub fn new(behavior: ProbeBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            behavior: other.behavior.clone(),
            calls: Arc::clone(&other.calls),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressProbe for MockProbe {
    async fn fetch(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            ProbeBehavior::Sequential => Ok(format!("10.0.0.{}", n)),
            ProbeBehavior::Fail(cause) => Err(Error::probe(*cause)),
            ProbeBehavior::Hang => std::future::pending().await,
        }
    }
}

/// A reported address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reported {
    pub address: String,
    pub progress: Option<Progress>,
}

#[derive(Default)]
struct ConsoleLog {
    answers: VecDeque<Option<String>>,
    prompts: Vec<String>,
    lines: Vec<String>,
    reported: Vec<Reported>,
    clears: usize,
}

/// A Console fed from a script of answers
///
/// `None` answers are end of input. Once the script is exhausted, `ask`
/// never completes.
pub struct ScriptedConsole {
    log: Arc<Mutex<ConsoleLog>>,
    fail_reports: bool,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let log = ConsoleLog {
            answers: answers.into_iter().map(|a| a.map(Into::into)).collect(),
            ..ConsoleLog::default()
        };
        Self {
            log: Arc::new(Mutex::new(log)),
            fail_reports: false,
        }
    }

    /// Answer both prompts
    pub fn answering(interval: &str, count: &str) -> Self {
        Self::new([Some(interval), Some(count)])
    }

    /// Make report_address() fail with an I/O error
    pub fn failing_reports(mut self) -> Self {
        self.fail_reports = true;
        self
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            log: Arc::clone(&other.log),
            fail_reports: other.fail_reports,
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.log.lock().unwrap().prompts.clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.log.lock().unwrap().lines.clone()
    }

    pub fn reported(&self) -> Vec<Reported> {
        self.log.lock().unwrap().reported.clone()
    }

    pub fn clears(&self) -> usize {
        self.log.lock().unwrap().clears
    }

    pub fn printed(&self, line: &str) -> bool {
        self.lines().iter().any(|l| l == line)
    }
}

#[async_trait::async_trait]
impl Console for ScriptedConsole {
    fn clear(&self) -> std::io::Result<()> {
        self.log.lock().unwrap().clears += 1;
        Ok(())
    }

    fn say(&self, line: &str) -> std::io::Result<()> {
        self.log.lock().unwrap().lines.push(line.to_string());
        Ok(())
    }

    fn report_address(
        &self,
        _prefix: &str,
        address: &str,
        progress: Option<Progress>,
    ) -> std::io::Result<()> {
        if self.fail_reports {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdout closed",
            ));
        }
        self.log.lock().unwrap().reported.push(Reported {
            address: address.to_string(),
            progress,
        });
        Ok(())
    }

    async fn ask(&self, prompt: &str) -> std::io::Result<Option<String>> {
        let next = {
            let mut log = self.log.lock().unwrap();
            log.prompts.push(prompt.to_string());
            log.answers.pop_front()
        };

        match next {
            Some(answer) => Ok(answer),
            None => std::future::pending().await,
        }
    }
}

/// Default configuration with room for every event a test produces
pub fn test_config() -> RotatorConfig {
    RotatorConfig {
        event_channel_capacity: 4096,
        ..RotatorConfig::default()
    }
}

/// Build a rotator around the given doubles
pub fn rotator(
    service: MockServiceManager,
    probe: MockProbe,
    console: ScriptedConsole,
) -> (Rotator, mpsc::Receiver<RotatorEvent>) {
    Rotator::new(
        Box::new(service),
        Box::new(probe),
        Box::new(console),
        test_config(),
    )
    .expect("rotator construction succeeds")
}

/// Build a session around the given doubles
pub fn session(
    service: MockServiceManager,
    probe: MockProbe,
    console: ScriptedConsole,
) -> (Session, mpsc::Receiver<RotatorEvent>, Lifecycle) {
    let (rotator, events) = rotator(service, probe, console);
    let lifecycle = Lifecycle::new();
    (Session::new(rotator, lifecycle.clone()), events, lifecycle)
}

/// Collect every event emitted so far
pub fn drain(events: &mut mpsc::Receiver<RotatorEvent>) -> Vec<RotatorEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Delays from DelayScheduled events
pub fn delays(events: &[RotatorEvent]) -> Vec<std::time::Duration> {
    events
        .iter()
        .filter_map(|e| match e {
            RotatorEvent::DelayScheduled { delay } => Some(*delay),
            _ => None,
        })
        .collect()
}
