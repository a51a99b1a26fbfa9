//! Shared fixtures for integration tests: scripted sources, recording
//! sinks, and payload builders.

use netdyn::pipeline::{
    AxisMeta, Matrix, Metadata, Payload, Pipe, Role, SignalPacket,
};
use netdyn::Result;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// A windowed signal payload with sequential sample coordinates and
/// labelled channels, filled with `base + offset` values.
pub fn signal_payload(rows: usize, cols: usize, base: f64) -> Payload {
    let mut data = Matrix::zeros(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            data.set(r, c, base + (r * cols + c) as f64);
        }
    }
    let meta = Metadata {
        axis0: Some(AxisMeta::numeric(
            "Samples",
            (0..rows).map(|s| s as f64).collect(),
        )),
        axis1: Some(AxisMeta::labels(
            "Channels",
            (0..cols).map(|c| format!("ch_{c}")).collect(),
        )),
        time: None,
    };
    Payload::new(data, meta)
}

/// Source that yields a scripted sequence of payloads, then exhausts.
pub struct ScriptedSource {
    payloads: std::vec::IntoIter<Payload>,
}

impl ScriptedSource {
    pub fn new(payloads: Vec<Payload>) -> Self {
        Self {
            payloads: payloads.into_iter(),
        }
    }
}

impl Pipe for ScriptedSource {
    fn role(&self) -> Role {
        Role::Interface
    }
    fn locator(&self) -> &str {
        "test.ScriptedSource"
    }
    fn params(&self) -> Value {
        json!({})
    }
    fn next_payload(&mut self) -> Result<Option<Payload>> {
        Ok(self.payloads.next())
    }
}

/// Preproc stage that shifts every element by a constant. Used to observe
/// whether in-place mutation on one branch leaks into a sibling branch.
pub struct AddConstant {
    pub amount: f64,
}

impl Pipe for AddConstant {
    fn role(&self) -> Role {
        Role::Preproc
    }
    fn locator(&self) -> &str {
        "test.AddConstant"
    }
    fn params(&self) -> Value {
        json!({ "amount": self.amount })
    }
    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        let mut payload = packet.payload;
        let amount = self.amount;
        payload.data.map_inplace(|v| v + amount);
        Ok(Some(payload))
    }
}

/// Terminal sink recording every received packet and counting closes.
pub struct RecordingSink {
    pub tag: &'static str,
    pub received: Arc<Mutex<Vec<(String, SignalPacket)>>>,
    pub closes: Arc<Mutex<u32>>,
}

impl RecordingSink {
    pub fn new(
        tag: &'static str,
        received: Arc<Mutex<Vec<(String, SignalPacket)>>>,
        closes: Arc<Mutex<u32>>,
    ) -> Self {
        Self {
            tag,
            received,
            closes,
        }
    }
}

impl Pipe for RecordingSink {
    fn role(&self) -> Role {
        Role::Logger
    }
    fn locator(&self) -> &str {
        "test.RecordingSink"
    }
    fn params(&self) -> Value {
        json!({ "tag": self.tag })
    }
    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        self.received
            .lock()
            .unwrap()
            .push((self.tag.to_string(), packet));
        Ok(None)
    }
    fn on_close(&mut self) {
        *self.closes.lock().unwrap() += 1;
    }
}
