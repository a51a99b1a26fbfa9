//! Graph-theoretic reductions over adjacency matrices.

use crate::error::{Error, Result};
use crate::pipeline::packet::{Matrix, Metadata, Payload, SignalPacket};
use crate::pipeline::pipe::Pipe;
use crate::pipeline::role::Role;
use serde::Deserialize;
use serde_json::{json, Value};

fn require_time(locator: &str, payload: &Payload) -> Result<()> {
    if payload.meta.time.is_none() {
        return Err(Error::processing(
            locator,
            "inbound payload lacks a time descriptor",
        ));
    }
    Ok(())
}

/// Mean of the off-diagonal adjacency entries, collapsed to a 1×1 value.
/// Self-connections are excluded so a unit diagonal cannot inflate the
/// summary. A 1×1 input has no off-diagonal entries and reduces to zero.
pub struct GlobalMean;

impl GlobalMean {
    pub fn from_params(params: &Value) -> Result<Box<dyn Pipe>> {
        if !params.is_object() {
            return Err(Error::Config(
                "topo.GlobalMean parameters must be an object".to_string(),
            ));
        }
        Ok(Box::new(Self))
    }
}

impl Pipe for GlobalMean {
    fn role(&self) -> Role {
        Role::GlobalTopo
    }

    fn locator(&self) -> &str {
        "topo.GlobalMean"
    }

    fn params(&self) -> Value {
        json!({})
    }

    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        let payload = packet.payload;
        require_time(self.locator(), &payload)?;

        let n = payload.data.rows();
        let mean = if n > 1 {
            let total: f64 = payload.data.as_slice().iter().sum();
            let trace: f64 = (0..n).map(|i| payload.data.get(i, i)).sum();
            (total - trace) / (n * n - n) as f64
        } else {
            0.0
        };

        let meta = Metadata {
            time: payload.meta.time,
            ..Metadata::default()
        };
        Ok(Some(Payload::new(Matrix::scalar(mean), meta)))
    }
}

/// Per-node strength: the sum of each row's off-diagonal entries, emitted
/// as an n×1 column keyed by the inbound node axis.
pub struct NodeStrength;

impl NodeStrength {
    pub fn from_params(params: &Value) -> Result<Box<dyn Pipe>> {
        if !params.is_object() {
            return Err(Error::Config(
                "topo.NodeStrength parameters must be an object".to_string(),
            ));
        }
        Ok(Box::new(Self))
    }
}

impl Pipe for NodeStrength {
    fn role(&self) -> Role {
        Role::NodeTopo
    }

    fn locator(&self) -> &str {
        "topo.NodeStrength"
    }

    fn params(&self) -> Value {
        json!({})
    }

    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        let payload = packet.payload;
        require_time(self.locator(), &payload)?;

        let n = payload.data.rows();
        let strengths: Vec<f64> = (0..n)
            .map(|i| {
                payload
                    .data
                    .row(i)
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, v)| v)
                    .sum()
            })
            .collect();

        let meta = Metadata {
            axis0: payload.meta.axis0,
            axis1: None,
            time: payload.meta.time,
        };
        Ok(Some(Payload::new(Matrix::column(strengths), meta)))
    }
}

#[derive(Debug, Deserialize)]
struct ThresholdParams {
    threshold: f64,
}

/// Sparsifies an adjacency matrix: entries with magnitude below the
/// threshold are zeroed, everything else passes through. Shape, axes, and
/// time descriptor are preserved.
pub struct EdgeThreshold {
    threshold: f64,
}

impl EdgeThreshold {
    pub fn from_params(params: &Value) -> Result<Box<dyn Pipe>> {
        let parsed: ThresholdParams = serde_json::from_value(params.clone())
            .map_err(|e| Error::Config(format!("topo.EdgeThreshold parameters: {e}")))?;
        if !parsed.threshold.is_finite() || parsed.threshold < 0.0 {
            return Err(Error::Config(format!(
                "threshold must be finite and non-negative, got {}",
                parsed.threshold
            )));
        }
        Ok(Box::new(Self {
            threshold: parsed.threshold,
        }))
    }
}

impl Pipe for EdgeThreshold {
    fn role(&self) -> Role {
        Role::EdgeTopo
    }

    fn locator(&self) -> &str {
        "topo.EdgeThreshold"
    }

    fn params(&self) -> Value {
        json!({ "threshold": self.threshold })
    }

    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        let mut payload = packet.payload;
        require_time(self.locator(), &payload)?;

        let threshold = self.threshold;
        payload
            .data
            .map_inplace(|v| if v.abs() >= threshold { v } else { 0.0 });
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::identity::IdentityHash;
    use crate::pipeline::packet::{AxisMeta, TimeMeta};
    use serde_json::json;

    fn adjacency_packet(data: Matrix) -> SignalPacket {
        let n = data.rows();
        let channels = AxisMeta::labels("Channels", (0..n).map(|c| format!("ch_{c}")).collect());
        let meta = Metadata {
            axis0: Some(channels.clone()),
            axis1: Some(channels),
            time: Some(TimeMeta {
                label: "Samples".to_string(),
                index: 5.0,
            }),
        };
        SignalPacket::tag(
            IdentityHash::compute("test.Adj", &json!({})),
            Payload::new(data, meta),
        )
    }

    #[test]
    fn test_global_mean_excludes_diagonal() {
        let mut pipe = GlobalMean;
        let out = pipe
            .process(adjacency_packet(Matrix::from_rows(&[
                vec![1.0, 0.2, 0.4],
                vec![0.2, 1.0, 0.6],
                vec![0.4, 0.6, 1.0],
            ])))
            .unwrap()
            .unwrap();

        assert_eq!((out.data.rows(), out.data.cols()), (1, 1));
        assert!((out.data.get(0, 0) - 0.4).abs() < 1e-12);
        assert!(out.meta.axis0.is_none());
        assert_eq!(out.meta.time.unwrap().index, 5.0);
    }

    #[test]
    fn test_node_strength_column() {
        let mut pipe = NodeStrength;
        let out = pipe
            .process(adjacency_packet(Matrix::from_rows(&[
                vec![1.0, 0.2, 0.4],
                vec![0.2, 1.0, 0.6],
                vec![0.4, 0.6, 1.0],
            ])))
            .unwrap()
            .unwrap();

        assert_eq!((out.data.rows(), out.data.cols()), (3, 1));
        assert!((out.data.get(0, 0) - 0.6).abs() < 1e-12);
        assert!((out.data.get(2, 0) - 1.0).abs() < 1e-12);
        assert!(out.meta.axis0.is_some());
        assert!(out.meta.axis1.is_none());
    }

    #[test]
    fn test_edge_threshold_zeroes_weak_edges() {
        let mut pipe = EdgeThreshold { threshold: 0.5 };
        let out = pipe
            .process(adjacency_packet(Matrix::from_rows(&[
                vec![1.0, 0.2],
                vec![0.2, 1.0],
            ])))
            .unwrap()
            .unwrap();

        assert_eq!(out.data.get(0, 1), 0.0);
        assert_eq!(out.data.get(0, 0), 1.0);
        assert!(out.data.is_square());
        assert!(out.meta.time.is_some());
    }

    #[test]
    fn test_missing_time_is_processing_error() {
        let mut pipe = GlobalMean;
        let packet = SignalPacket::tag(
            IdentityHash::compute("test.Adj", &json!({})),
            Payload::new(Matrix::scalar(1.0), Metadata::default()),
        );
        assert!(pipe.process(packet).is_err());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        assert!(EdgeThreshold::from_params(&json!({"threshold": -0.1})).is_err());
    }
}
