//! Association measures: windowed signal in, square adjacency matrix out.

use crate::error::{Error, Result};
use crate::pipeline::packet::{
    AxisIndex, AxisMeta, Matrix, Payload, SignalPacket, TimeMeta,
};
use crate::pipeline::pipe::Pipe;
use crate::pipeline::role::Role;
use serde_json::{json, Value};

/// Absolute Pearson correlation between every channel pair.
///
/// Consumes an `n_sample × n_channel` window and emits an
/// `n_channel × n_channel` matrix of `|r|` values with unit diagonal. The
/// window's sample axis collapses into a scalar time descriptor placed at
/// the window midpoint; the channel axis becomes both output axes.
pub struct PearsonCorrelation;

impl PearsonCorrelation {
    pub fn from_params(params: &Value) -> Result<Box<dyn Pipe>> {
        if !params.is_object() {
            return Err(Error::Config(
                "adjacency.PearsonCorrelation parameters must be an object".to_string(),
            ));
        }
        Ok(Box::new(Self))
    }
}

impl Pipe for PearsonCorrelation {
    fn role(&self) -> Role {
        Role::Adjacency
    }

    fn locator(&self) -> &str {
        "adjacency.PearsonCorrelation"
    }

    fn params(&self) -> Value {
        json!({})
    }

    fn process(&mut self, packet: SignalPacket) -> Result<Option<Payload>> {
        let payload = packet.payload;
        let data = &payload.data;
        let n_sample = data.rows();
        let n_chan = data.cols();

        let channel_axis = payload.meta.axis1.clone().ok_or_else(|| {
            Error::processing(self.locator(), "inbound payload lacks a channel axis")
        })?;
        let sample_axis = payload.meta.axis0.as_ref().ok_or_else(|| {
            Error::processing(self.locator(), "inbound payload lacks a sample axis")
        })?;
        let time_label = sample_axis.label.clone();
        let midpoint = match &sample_axis.index {
            AxisIndex::Numeric(v) if !v.is_empty() => (v[0] + v[v.len() - 1]) / 2.0,
            _ => {
                return Err(Error::processing(
                    self.locator(),
                    "sample axis must carry numeric coordinates",
                ))
            }
        };

        let means: Vec<f64> = (0..n_chan)
            .map(|c| data.col(c).iter().sum::<f64>() / n_sample as f64)
            .collect();
        let sds: Vec<f64> = (0..n_chan)
            .map(|c| {
                data.col(c)
                    .iter()
                    .map(|v| (v - means[c]).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect();

        let mut corr = Matrix::zeros(n_chan, n_chan);
        for i in 0..n_chan {
            corr.set(i, i, 1.0);
            for j in (i + 1)..n_chan {
                let cov: f64 = (0..n_sample)
                    .map(|s| (data.get(s, i) - means[i]) * (data.get(s, j) - means[j]))
                    .sum();
                // Flat channels have no defined correlation; report none.
                let r = if sds[i] == 0.0 || sds[j] == 0.0 {
                    0.0
                } else {
                    (cov / (sds[i] * sds[j])).abs()
                };
                corr.set(i, j, r);
                corr.set(j, i, r);
            }
        }

        let mut meta = payload.meta;
        meta.axis0 = Some(channel_axis.clone());
        meta.axis1 = Some(channel_axis);
        meta.time = Some(TimeMeta {
            label: time_label,
            index: midpoint,
        });
        Ok(Some(Payload::new(corr, meta)))
    }
}
