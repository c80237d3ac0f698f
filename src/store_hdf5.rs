// Store traits over the hdf5 crate
// Matches the layout OpenMC writes for thermal scattering data

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::Attribute;

use crate::error::{Result, SabError};
use crate::store::{AttrValue, Dataset as StoreDataset, Group as StoreGroup};

/// Read an attribute of any supported type.
///
/// Handles numeric attributes (widened to f64) and the HDF5 string types:
/// variable-length unicode, variable-length ASCII and fixed-size strings.
fn read_attr_value(attr: &Attribute, owner: &str, name: &str) -> Result<AttrValue> {
    let scalar = attr.ndim() == 0;
    let descriptor = attr.dtype()?.to_descriptor()?;

    match descriptor {
        TypeDescriptor::Float(_) => {
            let values: Vec<f64> = attr.read_raw()?;
            Ok(numeric_value(values, scalar))
        }
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            let values: Vec<i64> = attr.read_raw()?;
            Ok(numeric_value(
                values.into_iter().map(|v| v as f64).collect(),
                scalar,
            ))
        }
        TypeDescriptor::VarLenUnicode => {
            let values: Vec<VarLenUnicode> = attr.read_raw()?;
            Ok(string_value(values.iter().map(|s| s.to_string()).collect(), scalar))
        }
        TypeDescriptor::VarLenAscii => {
            let values: Vec<VarLenAscii> = attr.read_raw()?;
            Ok(string_value(values.iter().map(|s| s.to_string()).collect(), scalar))
        }
        TypeDescriptor::FixedAscii(size) | TypeDescriptor::FixedUnicode(size) => {
            read_fixed_strings(attr, size)
                .map(|values| string_value(values, scalar))
                .ok_or_else(|| {
                    SabError::MissingData(format!(
                        "could not read fixed-size string attribute '{}' on '{}'",
                        name, owner
                    ))
                })
        }
        other => Err(SabError::unrecognized(
            "attribute type",
            format!("{:?} ('{}' on '{}')", other, name, owner),
        )),
    }
}

fn numeric_value(values: Vec<f64>, scalar: bool) -> AttrValue {
    if scalar && values.len() == 1 {
        AttrValue::Float(values[0])
    } else {
        AttrValue::Floats(values)
    }
}

fn string_value(mut values: Vec<String>, scalar: bool) -> AttrValue {
    if scalar && values.len() == 1 {
        AttrValue::Str(values.remove(0))
    } else {
        AttrValue::Strings(values)
    }
}

/// Fixed-size strings need a compile-time capacity; use the smallest one that
/// fits the stored size.
fn read_fixed_strings(attr: &Attribute, size: usize) -> Option<Vec<String>> {
    macro_rules! try_fixed_smallest_first {
        ($($n:literal),*) => {
            $(
                if size <= $n {
                    if let Ok(values) = attr.read_raw::<FixedAscii<$n>>() {
                        return Some(values.iter().map(|s| trim_fixed(s.as_str())).collect());
                    }
                    if let Ok(values) = attr.read_raw::<FixedUnicode<$n>>() {
                        return Some(values.iter().map(|s| trim_fixed(s.as_str())).collect());
                    }
                }
            )*
        }
    }

    try_fixed_smallest_first!(4, 8, 16, 32, 64, 128, 256);
    None
}

fn trim_fixed(s: &str) -> String {
    s.trim_end_matches('\0').trim_end().to_string()
}

fn last_component(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

impl StoreGroup for hdf5::Group {
    type Dataset = hdf5::Dataset;

    fn name(&self) -> String {
        hdf5::Location::name(self)
    }

    fn open_group(&self, name: &str) -> Result<Self> {
        self.group(name).map_err(|e| {
            SabError::MissingData(format!("group '{}' in '{}': {}", name, self.name(), e))
        })
    }

    fn open_dataset(&self, name: &str) -> Result<hdf5::Dataset> {
        self.dataset(name).map_err(|e| {
            SabError::MissingData(format!("dataset '{}' in '{}': {}", name, self.name(), e))
        })
    }

    fn member_names(&self) -> Result<Vec<String>> {
        Ok(hdf5::Group::member_names(self)?)
    }

    fn dataset_names(&self) -> Result<Vec<String>> {
        Ok(self
            .datasets()?
            .iter()
            .map(|ds| last_component(&ds.name()))
            .collect())
    }

    fn exists(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = parts.split_last() else {
            return false;
        };
        let mut current = self.clone();
        for part in parents {
            if !current.link_exists(part) {
                return false;
            }
            match current.group(part) {
                Ok(g) => current = g,
                Err(_) => return false,
            }
        }
        current.link_exists(last)
    }

    fn attr(&self, name: &str) -> Result<AttrValue> {
        let attr = hdf5::Location::attr(self, name).map_err(|e| {
            SabError::MissingData(format!("attribute '{}' on '{}': {}", name, self.name(), e))
        })?;
        read_attr_value(&attr, &self.name(), name)
    }
}

impl StoreDataset for hdf5::Dataset {
    fn name(&self) -> String {
        hdf5::Location::name(self)
    }

    fn shape(&self) -> Vec<usize> {
        hdf5::Container::shape(self)
    }

    fn read_raw(&self) -> Result<Vec<f64>> {
        Ok(hdf5::Container::read_raw::<f64>(self)?)
    }

    fn attr(&self, name: &str) -> Result<AttrValue> {
        let attr = hdf5::Location::attr(self, name).map_err(|e| {
            SabError::MissingData(format!("attribute '{}' on '{}': {}", name, self.name(), e))
        })?;
        read_attr_value(&attr, &hdf5::Location::name(self), name)
    }

    fn has_attr(&self, name: &str) -> bool {
        self.attr_names()
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(false)
    }
}
