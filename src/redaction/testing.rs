// file: src/redaction/testing.rs
// description: scripted oracle double for pipeline tests
// reference: in-memory test collaborators with call recording

use crate::error::Result;
use crate::models::DataRow;
use crate::parser::CsvFramer;
use crate::redaction::oracle::{RedactionOracle, RedactionRequest};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::time::Instant;

type Responder = dyn Fn(&RedactionRequest, usize) -> Result<String> + Send + Sync;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub request: RedactionRequest,
}

/// Oracle whose answer is computed from the request and the zero-based call number.
pub struct StubOracle {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubOracle {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RedactionRequest, usize) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn identity() -> Self {
        Self::new(|request, _| Ok(request.batch_csv.clone()))
    }

    /// Replaces one column of every row with `MASKED`.
    pub fn masking(column: usize) -> Self {
        Self::new(move |request, _| {
            let rows: Vec<DataRow> = CsvFramer::parse_records(&request.batch_csv)
                .expect("stub input")
                .into_iter()
                .map(|row| {
                    let mut cells = row.into_cells();
                    if let Some(cell) = cells.get_mut(column) {
                        *cell = "MASKED".to_string();
                    }
                    DataRow::new(cells)
                })
                .collect();
            CsvFramer::serialize_rows(&rows)
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }
}

#[async_trait]
impl RedactionOracle for StubOracle {
    async fn complete(&self, request: &RedactionRequest) -> Result<String> {
        let call_index = {
            let mut calls = self.calls.lock().expect("lock");
            calls.push(RecordedCall {
                at: Instant::now(),
                request: request.clone(),
            });
            calls.len() - 1
        };
        (self.responder)(request, call_index)
    }
}
