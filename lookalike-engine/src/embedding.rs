use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

/// Descriptor length produced by the holistic face recognition network.
pub const DESCRIPTOR_DIM: usize = 128;
/// Landmark mesh size; each landmark contributes x, y, z.
pub const LANDMARK_COUNT: usize = 468;
pub const LANDMARKS_DIM: usize = LANDMARK_COUNT * 3;

/// Extraction method an embedding was produced by.
///
/// Vectors from different methods live in different spaces and are only
/// ever combined through [`crate::fusion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Descriptor,
    Landmarks,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::Descriptor, Method::Landmarks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Descriptor => "descriptor",
            Method::Landmarks => "landmarks",
        }
    }

    /// Length vectors of this method usually have.
    pub fn typical_dim(&self) -> usize {
        match self {
            Method::Descriptor => DESCRIPTOR_DIM,
            Method::Landmarks => LANDMARKS_DIM,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "descriptor" => Ok(Method::Descriptor),
            "landmarks" => Ok(Method::Landmarks),
            other => Err(format!("unknown method {other:?}")),
        }
    }
}

/// Face embedding: a non-empty vector of finite `f32` values.
///
/// Serialized as a plain numeric array; validation runs on deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Embedding {
    pub vector: Array1<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(MatchError::EmptyEmbedding);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(MatchError::NonFinite { index });
        }
        Ok(Self {
            vector: Array1::from_vec(values),
        })
    }

    pub fn len(&self) -> usize {
        self.vector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.vector.view()
    }
}

impl TryFrom<Vec<f32>> for Embedding {
    type Error = MatchError;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Embedding::new(values)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(e: Embedding) -> Self {
        e.vector.to_vec()
    }
}
