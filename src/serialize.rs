//! JSON records for saving and loading built tables.
//!
//! The document stores everything evaluation needs: the header fields, the
//! baked transfer-function coefficients (zeros for uniform tables), the
//! explicit grid for nonuniform tables, and every block's coefficients.
//! Loading re-checks internal consistency; loading *as* a particular family
//! additionally checks the `name` field.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::PolynomialBlock;
use crate::lut::{for_each_table, LookupTable};
use crate::pade::PadeTable;
use crate::table::{GridType, MetaTable};
use crate::transfer::TransferFunction;
use crate::{LutError, LutResult, Scalar};

/// One subinterval's coefficients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableEntryRecord<T> {
    pub coefs: Vec<T>,
}

/// The serialized form of any lookup table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct TableRecord<T> {
    pub name: String,
    #[serde(rename = "minArg")]
    pub min_arg: T,
    #[serde(rename = "maxArg")]
    pub max_arg: T,
    #[serde(rename = "tableMaxArg")]
    pub table_max_arg: T,
    #[serde(rename = "stepSize")]
    pub step_size: T,
    #[serde(rename = "numIntervals")]
    pub num_intervals: usize,
    #[serde(rename = "numTableEntries")]
    pub num_table_entries: usize,
    pub order: u32,
    #[serde(rename = "dataSize")]
    pub data_size: usize,
    pub transfer_function_coefs: [T; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<T>>,
    pub table: Vec<TableEntryRecord<T>>,
}

fn malformed(reason: impl Into<String>) -> LutError {
    LutError::MalformedRecord {
        reason: reason.into(),
    }
}

fn grid_type_of_name(name: &str) -> GridType {
    if name.starts_with("NonUniformPseudo") {
        GridType::NonuniformPseudo
    } else if name.starts_with("NonUniform") {
        GridType::Nonuniform
    } else {
        GridType::Uniform
    }
}

fn parse_pade_name(name: &str) -> Option<(usize, usize)> {
    let inner = name.strip_prefix("UniformPade<")?.strip_suffix('>')?;
    let (m, n) = inner.split_once(',')?;
    Some((m.trim().parse().ok()?, n.trim().parse().ok()?))
}

impl<const N: usize, T: Scalar> MetaTable<N, T> {
    pub(crate) fn to_record(&self) -> TableRecord<T> {
        TableRecord {
            name: self.name.clone(),
            min_arg: self.min_arg,
            max_arg: self.max_arg,
            table_max_arg: self.table_max_arg,
            step_size: self.step_size,
            num_intervals: self.num_intervals,
            num_table_entries: self.num_table_entries,
            order: self.order,
            data_size: self.data_size,
            transfer_function_coefs: self.transfer.coefs(),
            grid: self.grid.clone(),
            table: self
                .table
                .iter()
                .map(|block| TableEntryRecord {
                    coefs: block.coefs().to_vec(),
                })
                .collect(),
        }
    }

    pub(crate) fn from_record(record: TableRecord<T>) -> LutResult<Self> {
        if record.step_size <= T::zero() {
            return Err(malformed("nonpositive step size"));
        }
        if record.num_table_entries != record.num_intervals + 1 {
            return Err(malformed("entry count does not fit interval count"));
        }
        if record.table.len() != record.num_table_entries {
            return Err(malformed("table length does not match entry count"));
        }
        let grid_type = grid_type_of_name(&record.name);
        if grid_type != GridType::Uniform {
            match &record.grid {
                None => return Err(malformed("nonuniform table without a grid")),
                Some(grid) if grid.len() != record.num_table_entries => {
                    return Err(malformed("grid length does not match entries"))
                }
                Some(_) => {}
            }
        }

        let mut table = Vec::with_capacity(record.table.len());
        for entry in &record.table {
            if entry.coefs.len() != N {
                return Err(malformed(format!(
                    "expected {N} coefficients per entry, found {}",
                    entry.coefs.len()
                )));
            }
            let mut coefs = [T::zero(); N];
            coefs.copy_from_slice(&entry.coefs);
            table.push(PolynomialBlock::new(coefs));
        }

        let transfer = TransferFunction::from_coefs(
            record.transfer_function_coefs,
            record.min_arg,
            record.table_max_arg,
            record.step_size,
        );
        Ok(Self {
            name: record.name,
            min_arg: record.min_arg,
            max_arg: record.max_arg,
            table_max_arg: record.table_max_arg,
            step_size: record.step_size,
            step_size_inv: T::one() / record.step_size,
            order: record.order,
            data_size: record.data_size,
            num_intervals: record.num_intervals,
            num_table_entries: record.num_table_entries,
            grid_type,
            grid: record.grid,
            transfer,
            table,
        })
    }
}

impl<T: Scalar> PadeTable<T> {
    pub(crate) fn to_record(&self) -> TableRecord<T> {
        let stride = self.coefs_per_entry();
        TableRecord {
            name: self.name.clone(),
            min_arg: self.min_arg,
            max_arg: self.max_arg,
            table_max_arg: self.table_max_arg,
            step_size: self.step_size,
            num_intervals: self.num_intervals,
            num_table_entries: self.num_table_entries,
            order: self.order,
            data_size: self.data_size,
            transfer_function_coefs: self.transfer_function_coefs(),
            grid: None,
            table: self
                .coefs
                .chunks_exact(stride)
                .map(|chunk| TableEntryRecord {
                    coefs: chunk.to_vec(),
                })
                .collect(),
        }
    }

    pub(crate) fn from_record(record: TableRecord<T>) -> LutResult<Self> {
        let (m, n) = parse_pade_name(&record.name)
            .ok_or_else(|| malformed("not a Padé table name"))?;
        if record.step_size <= T::zero() {
            return Err(malformed("nonpositive step size"));
        }
        if record.table.len() != record.num_table_entries {
            return Err(malformed("table length does not match entry count"));
        }
        let stride = m + n + 1;
        let mut coefs = Vec::with_capacity(stride * record.table.len());
        for entry in &record.table {
            if entry.coefs.len() != stride {
                return Err(malformed(format!(
                    "expected {stride} coefficients per entry, found {}",
                    entry.coefs.len()
                )));
            }
            coefs.extend_from_slice(&entry.coefs);
        }
        Ok(Self {
            name: record.name,
            min_arg: record.min_arg,
            max_arg: record.max_arg,
            table_max_arg: record.table_max_arg,
            step_size: record.step_size,
            step_size_inv: T::one() / record.step_size,
            order: record.order,
            data_size: record.data_size,
            num_intervals: record.num_intervals,
            num_table_entries: record.num_table_entries,
            numer_degree: m,
            denom_degree: n,
            coefs,
        })
    }
}

impl<T: Scalar + Serialize> LookupTable<T> {
    /// The table as a JSON value.
    pub fn to_json(&self) -> LutResult<Value> {
        Ok(serde_json::to_value(self.to_record())?)
    }

    /// The table's serialized record.
    pub fn to_record(&self) -> TableRecord<T> {
        for_each_table!(self, t => t.to_record())
    }
}

impl<T: Scalar + DeserializeOwned> LookupTable<T> {
    /// Rebuild a table from JSON, dispatching on its `name` field.
    pub fn from_json(value: &Value) -> LutResult<Self> {
        let record: TableRecord<T> = serde_json::from_value(value.clone())?;
        Self::from_record(record)
    }

    /// Rebuild from JSON, failing unless the stored `name` is exactly
    /// `expected_name`.
    pub fn from_json_expecting(
        value: &Value,
        expected_name: &str,
    ) -> LutResult<Self> {
        let record: TableRecord<T> = serde_json::from_value(value.clone())?;
        if record.name != expected_name {
            return Err(LutError::NameMismatch {
                expected: expected_name.to_string(),
                found: record.name,
            });
        }
        Self::from_record(record)
    }

    /// Rebuild a table from its record, dispatching on the `name` field.
    pub fn from_record(record: TableRecord<T>) -> LutResult<Self> {
        if parse_pade_name(&record.name).is_some() {
            return Ok(LookupTable::Pade(PadeTable::from_record(record)?));
        }
        let name = record.name.clone();
        let family = name
            .strip_prefix("NonUniformPseudo")
            .or_else(|| name.strip_prefix("NonUniform"))
            .or_else(|| name.strip_prefix("Uniform"))
            .ok_or_else(|| LutError::UnknownTableName { name: name.clone() })?;
        match family {
            "ConstantTaylor" => {
                Ok(Self::ConstantTaylor(MetaTable::from_record(record)?))
            }
            "LinearInterpolation" => {
                Ok(Self::LinearInterpolation(MetaTable::from_record(record)?))
            }
            "LinearTaylor" => {
                Ok(Self::LinearTaylor(MetaTable::from_record(record)?))
            }
            "QuadraticInterpolation" => Ok(Self::QuadraticInterpolation(
                MetaTable::from_record(record)?,
            )),
            "QuadraticTaylor" => {
                Ok(Self::QuadraticTaylor(MetaTable::from_record(record)?))
            }
            "CubicInterpolation" => {
                Ok(Self::CubicInterpolation(MetaTable::from_record(record)?))
            }
            "CubicTaylor" => {
                Ok(Self::CubicTaylor(MetaTable::from_record(record)?))
            }
            "CubicHermite" => {
                Ok(Self::CubicHermite(MetaTable::from_record(record)?))
            }
            "QuarticInterpolation" => Ok(Self::QuarticInterpolation(
                MetaTable::from_record(record)?,
            )),
            "QuinticInterpolation" => Ok(Self::QuinticInterpolation(
                MetaTable::from_record(record)?,
            )),
            "SexticInterpolation" => {
                Ok(Self::SexticInterpolation(MetaTable::from_record(record)?))
            }
            "SepticInterpolation" => {
                Ok(Self::SepticInterpolation(MetaTable::from_record(record)?))
            }
            _ => Err(LutError::UnknownTableName { name }),
        }
    }
}
