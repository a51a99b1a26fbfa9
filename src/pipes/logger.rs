//! Terminal sinks. Loggers accept any packet shape, never forward, and
//! release held resources when the close cascade reaches them.

use crate::error::{Error, Result};
use crate::pipeline::packet::{Payload, SignalPacket};
use crate::pipeline::pipe::Pipe;
use crate::pipeline::role::Role;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct ConsoleParams {
    description: String,
}

/// Logs a one-line summary of every received packet through the tracing
/// subscriber.
pub struct Console {
    description: String,
    received: u64,
}

impl Console {
    pub fn from_params(params: &Value) -> Result<Box<dyn Pipe>> {
        let parsed: ConsoleParams = serde_json::from_value(params.clone())
            .map_err(|e| Error::Config(format!("logger.Console parameters: {e}")))?;
        Ok(Box::new(Self {
            description: parsed.description,
            received: 0,
        }))
    }
}

impl Pipe for Console {
    fn role(&self) -> Role {
        Role::Logger
    }

    fn locator(&self) -> &str {
        "logger.Console"
    }

    fn params(&self) -> Value {
        json!({ "description": self.description })
    }

    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        self.received += 1;
        let data = &packet.payload.data;
        tracing::info!(
            sink = %self.description,
            key = %packet.key,
            rows = data.rows(),
            cols = data.cols(),
            time = packet.payload.meta.time.as_ref().map(|t| t.index),
            "packet received"
        );
        Ok(None)
    }

    fn on_close(&mut self) {
        tracing::info!(sink = %self.description, received = self.received, "console sink closed");
    }
}

#[derive(Debug, Deserialize)]
struct CacheParams {
    cache_name: PathBuf,
}

/// Appends every received packet to a JSON-lines file, one single-key
/// envelope object per line. The file handle is opened lazily on the first
/// packet and flushed and dropped on close, so a run that never reaches
/// this sink leaves no file behind.
pub struct JsonlCache {
    cache_name: PathBuf,
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl JsonlCache {
    pub fn from_params(params: &Value) -> Result<Box<dyn Pipe>> {
        let parsed: CacheParams = serde_json::from_value(params.clone())
            .map_err(|e| Error::Config(format!("logger.JsonlCache parameters: {e}")))?;
        Ok(Box::new(Self {
            cache_name: parsed.cache_name,
            writer: None,
            written: 0,
        }))
    }
}

impl Pipe for JsonlCache {
    fn role(&self) -> Role {
        Role::Logger
    }

    fn locator(&self) -> &str {
        "logger.JsonlCache"
    }

    fn params(&self) -> Value {
        json!({ "cache_name": self.cache_name })
    }

    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        if self.writer.is_none() {
            tracing::debug!(path = %self.cache_name.display(), "opening cache file");
            self.writer = Some(BufWriter::new(File::create(&self.cache_name)?));
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::processing("logger.JsonlCache", "cache writer unavailable"))?;

        let mut envelope = serde_json::Map::new();
        envelope.insert(
            packet.key.as_str().to_string(),
            serde_json::to_value(&packet.payload)
                .map_err(|e| Error::processing("logger.JsonlCache", e.to_string()))?,
        );
        let line = serde_json::to_string(&Value::Object(envelope))
            .map_err(|e| Error::processing("logger.JsonlCache", e.to_string()))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        self.written += 1;
        Ok(None)
    }

    fn on_close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::error!(path = %self.cache_name.display(), error = %e, "cache flush failed");
            }
        }
        tracing::info!(
            path = %self.cache_name.display(),
            written = self.written,
            "cache sink closed"
        );
    }
}
