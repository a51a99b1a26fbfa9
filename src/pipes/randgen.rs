//! Synthetic signal sources.

use crate::error::{Error, Result};
use crate::pipeline::packet::{AxisMeta, Matrix, Metadata, Payload};
use crate::pipeline::pipe::Pipe;
use crate::pipeline::role::Role;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct NoiseParams {
    n_node: usize,
    n_sample: usize,
    win_width: usize,
    win_shift: usize,
    #[serde(default)]
    seed: Option<u64>,
}

/// Correlated multivariate Gaussian noise, emitted in sliding windows.
///
/// The full `n_sample × n_node` signal is drawn once at construction:
/// iid standard-normal draws mixed through a random loading matrix, so the
/// channels carry a nontrivial correlation structure rather than being
/// independent. `next_payload` then walks a `win_width`-sample window
/// forward by `win_shift` samples until the remaining signal is shorter
/// than one window.
pub struct MvarNoiseSource {
    params: Value,
    n_sample: usize,
    win_width: usize,
    win_shift: usize,
    signal: Matrix,
    channels: Vec<String>,
    start: usize,
}

impl MvarNoiseSource {
    pub fn from_params(params: &Value) -> Result<Box<dyn Pipe>> {
        let parsed: NoiseParams = serde_json::from_value(params.clone())
            .map_err(|e| Error::Config(format!("randgen.MvarNoiseSource parameters: {e}")))?;

        if parsed.n_node == 0 || parsed.n_sample == 0 {
            return Err(Error::Config(
                "n_node and n_sample must be positive".to_string(),
            ));
        }
        if parsed.win_shift == 0 {
            return Err(Error::Config("win_shift must be positive".to_string()));
        }
        if parsed.win_width == 0 || parsed.win_width > parsed.n_sample {
            return Err(Error::Config(format!(
                "win_width must be in 1..={}, got {}",
                parsed.n_sample, parsed.win_width
            )));
        }

        let mut rng = match parsed.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let n = parsed.n_node;
        // Loading matrix: identity plus random off-diagonal weights. Keeps
        // each channel dominated by its own latent factor while leaking
        // enough cross-channel signal for downstream association measures.
        let mut loading = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let w: f64 = rng.sample(StandardNormal);
                loading.set(i, j, if i == j { 1.0 } else { 0.4 * w });
            }
        }

        let mut signal = Matrix::zeros(parsed.n_sample, n);
        for s in 0..parsed.n_sample {
            let latent: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
            for c in 0..n {
                let mixed: f64 = (0..n).map(|j| loading.get(c, j) * latent[j]).sum();
                signal.set(s, c, mixed);
            }
        }

        let channels = (0..n).map(|c| format!("ch_{c}")).collect();

        Ok(Box::new(Self {
            params: json!({
                "n_node": parsed.n_node,
                "n_sample": parsed.n_sample,
                "win_width": parsed.win_width,
                "win_shift": parsed.win_shift,
                "seed": parsed.seed,
            }),
            n_sample: parsed.n_sample,
            win_width: parsed.win_width,
            win_shift: parsed.win_shift,
            signal,
            channels,
            start: 0,
        }))
    }
}

impl Pipe for MvarNoiseSource {
    fn role(&self) -> Role {
        Role::Interface
    }

    fn locator(&self) -> &str {
        "randgen.MvarNoiseSource"
    }

    fn params(&self) -> Value {
        self.params.clone()
    }

    fn next_payload(&mut self) -> Result<Option<Payload>> {
        if self.start + self.win_width > self.n_sample {
            tracing::debug!(
                emitted_up_to = self.start,
                n_sample = self.n_sample,
                "signal exhausted"
            );
            return Ok(None);
        }

        let n_node = self.signal.cols();
        let mut window = Matrix::zeros(self.win_width, n_node);
        for r in 0..self.win_width {
            for c in 0..n_node {
                window.set(r, c, self.signal.get(self.start + r, c));
            }
        }

        let samples: Vec<f64> = (self.start..self.start + self.win_width)
            .map(|s| s as f64)
            .collect();
        let meta = Metadata {
            axis0: Some(AxisMeta::numeric("Samples", samples)),
            axis1: Some(AxisMeta::labels("Channels", self.channels.clone())),
            time: None,
        };

        self.start += self.win_shift;
        Ok(Some(Payload::new(window, meta)))
    }

    fn on_close(&mut self) {
        tracing::debug!(locator = self.locator(), "source closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::packet::AxisIndex;
    use serde_json::json;

    fn source(params: Value) -> Box<dyn Pipe> {
        MvarNoiseSource::from_params(&params).unwrap()
    }

    #[test]
    fn test_window_count_and_shape() {
        let mut pipe = source(json!({
            "n_node": 4, "n_sample": 40, "win_width": 10, "win_shift": 10, "seed": 1
        }));
        let mut count = 0;
        while let Some(payload) = pipe.next_payload().unwrap() {
            assert_eq!(payload.data.rows(), 10);
            assert_eq!(payload.data.cols(), 4);
            assert_eq!(payload.meta.axis0.as_ref().unwrap().index.len(), 10);
            assert_eq!(payload.meta.axis1.as_ref().unwrap().index.len(), 4);
            count += 1;
        }
        assert_eq!(count, 4);
        // Exhaustion is stable.
        assert!(pipe.next_payload().unwrap().is_none());
    }

    #[test]
    fn test_overlapping_windows() {
        let mut pipe = source(json!({
            "n_node": 2, "n_sample": 30, "win_width": 10, "win_shift": 5, "seed": 1
        }));
        let mut starts = Vec::new();
        while let Some(payload) = pipe.next_payload().unwrap() {
            match &payload.meta.axis0.unwrap().index {
                AxisIndex::Numeric(v) => starts.push(v[0]),
                AxisIndex::Labels(_) => panic!("sample axis must be numeric"),
            }
        }
        assert_eq!(starts, vec![0.0, 5.0, 10.0, 15.0, 20.0]);
    }

    #[test]
    fn test_seed_makes_signal_reproducible() {
        let params = json!({
            "n_node": 3, "n_sample": 20, "win_width": 20, "win_shift": 20, "seed": 42
        });
        let a = source(params.clone()).next_payload().unwrap().unwrap();
        let b = source(params).next_payload().unwrap().unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_invalid_window_rejected() {
        let err = MvarNoiseSource::from_params(&json!({
            "n_node": 2, "n_sample": 10, "win_width": 11, "win_shift": 5
        }))
        .unwrap_err();
        assert!(err.to_string().contains("win_width"));
    }

    #[test]
    fn test_params_snapshot_includes_seed() {
        let pipe = source(json!({
            "n_node": 2, "n_sample": 10, "win_width": 5, "win_shift": 5, "seed": 9
        }));
        assert_eq!(pipe.params()["seed"], json!(9));
        assert_eq!(pipe.params()["n_node"], json!(2));
    }
}
