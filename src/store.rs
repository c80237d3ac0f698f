// Access to the hierarchical nuclear-data store.
//
// The loader only ever talks to a store through the [`Group`] and [`Dataset`]
// traits. A handle is an owned value: opening a group or dataset acquires it
// and dropping the value releases it, so every handle opened inside a scope is
// released when that scope ends, whether it ends normally or through `?`.
//
// Two implementations ship with the crate: the in-memory store in
// [`crate::store_memory`] and, behind the `hdf5` feature, the HDF5 one.

use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SabError};

/// Value of an attribute attached to a group or dataset.
///
/// Integer attributes are widened to `f64`; readers that need integers
/// (offsets, interpolation codes) convert back with [`AttrValue::to_usize_vec`]
/// or [`AttrValue::to_i32_vec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Float(f64),
    Str(String),
    Floats(Vec<f64>),
    Strings(Vec<String>),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Floats(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s.as_str()),
            AttrValue::Strings(v) if v.len() == 1 => Some(v[0].as_str()),
            _ => None,
        }
    }

    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            AttrValue::Float(v) => Some(vec![*v]),
            AttrValue::Floats(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn to_strings(&self) -> Option<Vec<String>> {
        match self {
            AttrValue::Str(s) => Some(vec![s.clone()]),
            AttrValue::Strings(v) => Some(v.clone()),
            // An empty array carries no type information
            AttrValue::Floats(v) if v.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }

    /// Integer view of a numeric attribute; fails on negative or fractional values.
    pub fn to_usize_vec(&self) -> Option<Vec<usize>> {
        self.to_f64_vec()?
            .into_iter()
            .map(|v| {
                if v >= 0.0 && v.fract() == 0.0 {
                    Some(v as usize)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn to_i32_vec(&self) -> Option<Vec<i32>> {
        self.to_f64_vec()?
            .into_iter()
            .map(|v| if v.fract() == 0.0 { Some(v as i32) } else { None })
            .collect()
    }
}

fn attr_type_error(owner: &str, name: &str, expected: &str) -> SabError {
    SabError::MissingData(format!(
        "attribute '{}' on '{}' is not {}",
        name, owner, expected
    ))
}

/// A group in the store: a named container of groups, datasets and attributes.
pub trait Group: Sized {
    type Dataset: Dataset;

    /// Full path of the group, e.g. `/c_Graphite`.
    fn name(&self) -> String;

    fn open_group(&self, name: &str) -> Result<Self>;

    fn open_dataset(&self, name: &str) -> Result<Self::Dataset>;

    /// Names of all direct members (groups and datasets).
    fn member_names(&self) -> Result<Vec<String>>;

    /// Names of the datasets directly under this group.
    fn dataset_names(&self) -> Result<Vec<String>>;

    /// Whether `path` (relative, `/`-separated) names an existing member.
    fn exists(&self, path: &str) -> bool;

    fn attr(&self, name: &str) -> Result<AttrValue>;

    fn attr_f64(&self, name: &str) -> Result<f64> {
        self.attr(name)?
            .as_f64()
            .ok_or_else(|| attr_type_error(&self.name(), name, "a scalar number"))
    }

    fn attr_string(&self, name: &str) -> Result<String> {
        self.attr(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| attr_type_error(&self.name(), name, "a string"))
    }

    fn attr_strings(&self, name: &str) -> Result<Vec<String>> {
        self.attr(name)?
            .to_strings()
            .ok_or_else(|| attr_type_error(&self.name(), name, "a string array"))
    }
}

/// A multi-dimensional `f64` dataset, stored row-major.
pub trait Dataset: Sized {
    fn name(&self) -> String;

    /// Dimensions as reported by the store; empty for a scalar.
    fn shape(&self) -> Vec<usize>;

    /// All values in row-major order.
    fn read_raw(&self) -> Result<Vec<f64>>;

    fn attr(&self, name: &str) -> Result<AttrValue>;

    fn has_attr(&self, name: &str) -> bool;

    fn attr_string(&self, name: &str) -> Result<String> {
        self.attr(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| attr_type_error(&self.name(), name, "a string"))
    }

    fn attr_usize_vec(&self, name: &str) -> Result<Vec<usize>> {
        self.attr(name)?
            .to_usize_vec()
            .ok_or_else(|| attr_type_error(&self.name(), name, "a non-negative integer array"))
    }

    fn attr_i32_vec(&self, name: &str) -> Result<Vec<i32>> {
        self.attr(name)?
            .to_i32_vec()
            .ok_or_else(|| attr_type_error(&self.name(), name, "an integer array"))
    }

    fn read_scalar(&self) -> Result<f64> {
        let data = self.read_raw()?;
        if data.len() != 1 {
            return Err(SabError::ShapeMismatch(format!(
                "dataset '{}' holds {} values, expected a scalar",
                self.name(),
                data.len()
            )));
        }
        Ok(data[0])
    }

    fn read_1d(&self) -> Result<Array1<f64>> {
        let shape = self.checked_shape(1)?;
        let data = self.read_raw()?;
        Array1::from_shape_vec(shape[0], data).map_err(|e| self.shape_error(e))
    }

    fn read_2d(&self) -> Result<Array2<f64>> {
        let shape = self.checked_shape(2)?;
        let data = self.read_raw()?;
        Array2::from_shape_vec((shape[0], shape[1]), data).map_err(|e| self.shape_error(e))
    }

    fn read_3d(&self) -> Result<Array3<f64>> {
        let shape = self.checked_shape(3)?;
        let data = self.read_raw()?;
        Array3::from_shape_vec((shape[0], shape[1], shape[2]), data)
            .map_err(|e| self.shape_error(e))
    }

    #[doc(hidden)]
    fn checked_shape(&self, ndim: usize) -> Result<Vec<usize>> {
        let shape = self.shape();
        if shape.len() != ndim {
            return Err(SabError::ShapeMismatch(format!(
                "dataset '{}' has shape {:?}, expected {} dimensions",
                self.name(),
                shape,
                ndim
            )));
        }
        Ok(shape)
    }

    #[doc(hidden)]
    fn shape_error(&self, e: ndarray::ShapeError) -> SabError {
        SabError::ShapeMismatch(format!("dataset '{}': {}", self.name(), e))
    }
}
