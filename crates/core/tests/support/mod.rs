//! Shared test helpers for `mgsdb-core` integration tests.
//!
//! [`MockTransport`] scripts the server side of the upload protocol and
//! records every call so tests can assert on ordering and concurrency.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mgsdb_common::resilience::Backoff;
use mgsdb_core::{PartUpload, SchedulerConfig, SentBytes, UploadTransport};
use mgsdb_domain::{
    FileReferenceResponse, InitMultipartResponse, PartUploadResponse, UploadError,
};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

pub const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Direct { file_name: String, len: usize },
    Init { file_name: String, total_parts: u32 },
    Part { part_number: u32, total_parts: u32, session_id: String, len: usize },
    Complete { session_id: String },
}

struct Script {
    init: Result<InitMultipartResponse, UploadError>,
    complete: Result<FileReferenceResponse, UploadError>,
    direct: Result<FileReferenceResponse, UploadError>,
    part_failures: HashMap<u32, VecDeque<UploadError>>,
    always_fail: HashMap<u32, UploadError>,
    stalls: HashMap<u32, usize>,
    rotations: HashMap<u32, String>,
}

pub struct MockTransport {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    part_delay: Mutex<Duration>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        let file_ref = FileReferenceResponse {
            file_url: Some("https://files.example.org/f/1".into()),
            key: Some("uploads/1".into()),
            bucket: Some("mgsdb".into()),
        };
        Self {
            script: Mutex::new(Script {
                init: Ok(InitMultipartResponse { upload_session: Some("session-1".into()) }),
                complete: Ok(file_ref.clone()),
                direct: Ok(file_ref),
                part_failures: HashMap::new(),
                always_fail: HashMap::new(),
                stalls: HashMap::new(),
                rotations: HashMap::new(),
            }),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            part_delay: Mutex::new(Duration::ZERO),
            gate: Mutex::new(None),
        }
    }
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next call of `part_number` with `err` (stackable).
    pub fn fail_part(&self, part_number: u32, err: UploadError) {
        self.script.lock().part_failures.entry(part_number).or_default().push_back(err);
    }

    pub fn always_fail_part(&self, part_number: u32, err: UploadError) {
        self.script.lock().always_fail.insert(part_number, err);
    }

    /// The next `times` calls of `part_number` never answer.
    pub fn stall_part(&self, part_number: u32, times: usize) {
        self.script.lock().stalls.insert(part_number, times);
    }

    /// Acknowledging `part_number` hands out `session_id` for later calls.
    pub fn rotate_after(&self, part_number: u32, session_id: &str) {
        self.script.lock().rotations.insert(part_number, session_id.to_string());
    }

    pub fn set_init(&self, response: Result<InitMultipartResponse, UploadError>) {
        self.script.lock().init = response;
    }

    pub fn set_complete(&self, response: Result<FileReferenceResponse, UploadError>) {
        self.script.lock().complete = response;
    }

    pub fn set_part_delay(&self, delay: Duration) {
        *self.part_delay.lock() = delay;
    }

    /// Part calls, and a direct upload after sending half its body, block
    /// until a permit is added to the returned semaphore.
    pub fn close_gate(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn part_calls(&self) -> Vec<(u32, String, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Part { part_number, session_id, len, .. } => {
                    Some((part_number, session_id, len))
                }
                _ => None,
            })
            .collect()
    }

    pub fn part_order(&self) -> Vec<u32> {
        self.part_calls().into_iter().map(|(n, _, _)| n).collect()
    }

    pub fn started_parts(&self) -> usize {
        self.part_calls().len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed_sessions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Complete { session_id } => Some(session_id),
                _ => None,
            })
            .collect()
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UploadTransport for MockTransport {
    async fn upload_direct(
        &self,
        file_name: &str,
        content: Bytes,
        sent: SentBytes,
    ) -> Result<FileReferenceResponse, UploadError> {
        self.calls.lock().push(Call::Direct { file_name: file_name.into(), len: content.len() });
        let len = content.len() as u64;
        sent.send_replace(len / 2);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        sent.send_replace(len);
        self.script.lock().direct.clone()
    }

    async fn init_session(
        &self,
        file_name: &str,
        total_parts: u32,
    ) -> Result<InitMultipartResponse, UploadError> {
        self.calls.lock().push(Call::Init { file_name: file_name.into(), total_parts });
        self.script.lock().init.clone()
    }

    async fn upload_part(&self, part: PartUpload) -> Result<PartUploadResponse, UploadError> {
        self.calls.lock().push(Call::Part {
            part_number: part.part_number,
            total_parts: part.total_parts,
            session_id: part.session_id.clone(),
            len: part.content.len(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let stall = {
            let mut script = self.script.lock();
            match script.stalls.get_mut(&part.part_number) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let delay = *self.part_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script.lock();
        if let Some(err) = script.always_fail.get(&part.part_number) {
            return Err(err.clone());
        }
        if let Some(err) =
            script.part_failures.get_mut(&part.part_number).and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(PartUploadResponse { upload_session: script.rotations.get(&part.part_number).cloned() })
    }

    async fn complete_session(
        &self,
        session_id: &str,
    ) -> Result<FileReferenceResponse, UploadError> {
        self.calls.lock().push(Call::Complete { session_id: session_id.into() });
        self.script.lock().complete.clone()
    }
}

/// Scheduler settings for tests: no backoff sleeps, given part size and
/// concurrency.
pub fn test_config(part_size: u64, concurrency: usize) -> SchedulerConfig {
    SchedulerConfig {
        part_size,
        concurrency,
        max_part_attempts: None,
        backoff: Backoff::none(),
        part_timeout: None,
    }
}
