//! Signal packets — the single-key enveloped payloads that flow along edges.
//!
//! A [`SignalPacket`] pairs exactly one identity key with a [`Payload`].
//! The "exactly one top-level key" invariant of the envelope holds by
//! construction: the only ways to build a packet are [`SignalPacket::tag`]
//! (source side) and [`SignalPacket::retag`] (flow side), both of which
//! produce a fresh envelope keyed by a single pipe identity.
//!
//! Payloads are plain values (`Clone`), so sibling branches in a fan-out can
//! each be handed their own copy and in-place mutation never crosses
//! branches.

use crate::pipeline::identity::IdentityHash;
use serde::{Deserialize, Serialize};

/// Dense row-major matrix of `f64` — the numeric body of every payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from row slices. All rows must have equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        debug_assert!(rows.iter().all(|r| r.len() == n_cols));
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for row in rows {
            data.extend_from_slice(row);
        }
        Self {
            rows: rows.len(),
            cols: n_cols,
            data,
        }
    }

    /// Build from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(rows * cols, data.len());
        Self { rows, cols, data }
    }

    /// 1×1 matrix holding a single scalar.
    pub fn scalar(value: f64) -> Self {
        Self {
            rows: 1,
            cols: 1,
            data: vec![value],
        }
    }

    /// n×1 column vector.
    pub fn column(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        self.data[r * self.cols + c] = value;
    }

    /// Row `r` as a slice.
    #[inline]
    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Column `c` collected into a Vec.
    pub fn col(&self, c: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, c)).collect()
    }

    /// The flat row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the flat row-major buffer.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Apply `f` to every element in place.
    pub fn map_inplace(&mut self, f: impl Fn(f64) -> f64) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }
}

/// Index attached to an axis descriptor: either a numeric coordinate per
/// entry (sample timestamps) or a string label per entry (channel names).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisIndex {
    Numeric(Vec<f64>),
    Labels(Vec<String>),
}

impl AxisIndex {
    pub fn len(&self) -> usize {
        match self {
            AxisIndex::Numeric(v) => v.len(),
            AxisIndex::Labels(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Descriptor for one axis of the payload matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMeta {
    /// Unit of measurement or axis meaning ("Time (sec)", "Channels").
    pub label: String,
    /// One entry per row/column of the described axis.
    pub index: AxisIndex,
}

impl AxisMeta {
    pub fn numeric(label: impl Into<String>, index: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            index: AxisIndex::Numeric(index),
        }
    }

    pub fn labels(label: impl Into<String>, index: Vec<String>) -> Self {
        Self {
            label: label.into(),
            index: AxisIndex::Labels(index),
        }
    }
}

/// Scalar time descriptor carried by packets past the association boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMeta {
    pub label: String,
    pub index: f64,
}

/// Axis and time descriptors for a payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "ax_0", skip_serializing_if = "Option::is_none")]
    pub axis0: Option<AxisMeta>,
    #[serde(rename = "ax_1", skip_serializing_if = "Option::is_none")]
    pub axis1: Option<AxisMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeMeta>,
}

/// The data + metadata body of a packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub data: Matrix,
    pub meta: Metadata,
}

impl Payload {
    pub fn new(data: Matrix, meta: Metadata) -> Self {
        Self { data, meta }
    }
}

/// Single-key envelope flowing along an edge: one pipe identity mapped to
/// the payload that pipe produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPacket {
    pub key: IdentityHash,
    pub payload: Payload,
}

impl SignalPacket {
    /// Wrap a raw payload in a fresh envelope keyed by the producing pipe's
    /// identity. Used by source pipes at production time.
    pub fn tag(key: IdentityHash, payload: Payload) -> Self {
        Self { key, payload }
    }

    /// Re-envelope with a new identity, keeping the inner payload. Used by
    /// every non-source pipe after computing its output, so the identity at
    /// each stage reflects that stage rather than its upstream.
    pub fn retag(self, key: IdentityHash) -> Self {
        Self {
            key,
            payload: self.payload,
        }
    }
}
