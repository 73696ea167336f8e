//! Sampled functions: a 1-D curve `y(x)` and a 2-D field `z(x, y)`, each
//! with free-form string-keyed attributes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{NdArray, Value};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoFunc {
    pub x: NdArray,
    pub y: NdArray,
    pub attrs: BTreeMap<String, Value>,
}

impl CoFunc {
    /// Pair `x` and `y`. Fails unless both are 1-D of equal length.
    pub fn new(x: impl Into<NdArray>, y: impl Into<NdArray>) -> Result<CoFunc, String> {
        let (x, y) = (x.into(), y.into());
        if x.ndim() != 1 || y.ndim() != 1 || x.len() != y.len() {
            return Err(format!(
                "x {:?} and y {:?} are not 1-D of equal length",
                x.shape(),
                y.shape()
            ));
        }
        Ok(CoFunc {
            x,
            y,
            attrs: BTreeMap::new(),
        })
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> CoFunc {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoFunc2d {
    pub x: NdArray,
    pub y: NdArray,
    pub z: NdArray,
    pub attrs: BTreeMap<String, Value>,
}

impl CoFunc2d {
    /// `z` must be `len(x) x len(y)`.
    pub fn new(
        x: impl Into<NdArray>,
        y: impl Into<NdArray>,
        z: impl Into<NdArray>,
    ) -> Result<CoFunc2d, String> {
        let (x, y, z) = (x.into(), y.into(), z.into());
        if x.ndim() != 1 || y.ndim() != 1 || z.shape() != [x.len(), y.len()] {
            return Err(format!(
                "z {:?} does not match x {:?} by y {:?}",
                z.shape(),
                x.shape(),
                y.shape()
            ));
        }
        Ok(CoFunc2d {
            x,
            y,
            z,
            attrs: BTreeMap::new(),
        })
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> CoFunc2d {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

fn attrs_suffix(attrs: &BTreeMap<String, Value>) -> String {
    attrs.iter().map(|(k, v)| format!(", {k}={v}")).collect()
}

impl fmt::Display for CoFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coFunc(x=array({}), y=array({}){})", self.x, self.y, attrs_suffix(&self.attrs))
    }
}

impl fmt::Display for CoFunc2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "coFunc2d(x=array({}), y=array({}), z=array({}){})",
            self.x,
            self.y,
            self.z,
            attrs_suffix(&self.attrs)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn lengths_must_agree() {
        assert!(CoFunc::new(array![1.0, 2.0], array![3.0]).is_err());
        let f = CoFunc::new(array![1.0, 2.0], array![3.0, 4.0]).unwrap().with_attr("unit", "s");
        assert_eq!(f.to_string(), "coFunc(x=array([1.0, 2.0]), y=array([3.0, 4.0]), unit='s')");
    }

    #[test]
    fn grid_shape_checked() {
        let z = Array2::<f64>::zeros((2, 3));
        assert!(CoFunc2d::new(array![0.0, 1.0], array![0.0, 1.0, 2.0], z.clone()).is_ok());
        assert!(CoFunc2d::new(array![0.0, 1.0, 2.0], array![0.0, 1.0], z).is_err());
    }
}
