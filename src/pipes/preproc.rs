//! Schema-preserving signal cleanup stages.

use crate::error::{Error, Result};
use crate::pipeline::packet::{Payload, SignalPacket};
use crate::pipeline::pipe::Pipe;
use crate::pipeline::role::Role;
use serde_json::{json, Value};

/// Common average re-referencing: subtracts the cross-channel mean from
/// every sample, removing signal components shared by all channels. Shape
/// and metadata pass through unchanged.
pub struct CommonAvgRef;

impl CommonAvgRef {
    pub fn from_params(params: &Value) -> Result<Box<dyn Pipe>> {
        if !params.is_object() {
            return Err(Error::Config(
                "preproc.CommonAvgRef parameters must be an object".to_string(),
            ));
        }
        Ok(Box::new(Self))
    }
}

impl Pipe for CommonAvgRef {
    fn role(&self) -> Role {
        Role::Preproc
    }

    fn locator(&self) -> &str {
        "preproc.CommonAvgRef"
    }

    fn params(&self) -> Value {
        json!({})
    }

    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        let mut payload = packet.payload;
        let cols = payload.data.cols();
        for r in 0..payload.data.rows() {
            let mean: f64 = payload.data.row(r).iter().sum::<f64>() / cols as f64;
            for c in 0..cols {
                let v = payload.data.get(r, c);
                payload.data.set(r, c, v - mean);
            }
        }
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::identity::IdentityHash;
    use crate::pipeline::packet::{AxisMeta, Matrix, Metadata};
    use serde_json::json;

    fn packet(data: Matrix) -> SignalPacket {
        let rows = data.rows();
        let cols = data.cols();
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
        SignalPacket::tag(
            IdentityHash::compute("test.Up", &json!({})),
            Payload::new(data, meta),
        )
    }

    #[test]
    fn test_rows_are_zero_mean_after_referencing() {
        let mut pipe = CommonAvgRef;
        let out = pipe
            .process(packet(Matrix::from_rows(&[
                vec![1.0, 2.0, 3.0],
                vec![10.0, 10.0, 10.0],
            ])))
            .unwrap()
            .unwrap();

        assert_eq!(out.data.row(0), &[-1.0, 0.0, 1.0]);
        assert_eq!(out.data.row(1), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_metadata_passes_through() {
        let mut pipe = CommonAvgRef;
        let input = packet(Matrix::from_rows(&[vec![1.0, 2.0]]));
        let meta = input.payload.meta.clone();
        let out = pipe.process(input).unwrap().unwrap();
        assert_eq!(out.meta, meta);
    }

    #[test]
    fn test_non_object_params_rejected() {
        assert!(CommonAvgRef::from_params(&json!([1, 2])).is_err());
    }
}
