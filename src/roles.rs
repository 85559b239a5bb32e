//! Semantic column roles and their resolution against a loaded dataset.
//!
//! Dataset versions name their columns differently (Chinese and English
//! variants); each role carries an ordered alias list and binds to the
//! first alias present. All downstream feature access goes through the
//! resolved map, never through column positions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::PipelineError;

/// Display-only columns consulted for the recommendation panel. Not
/// resolved as roles: they are never trained on and may be absent.
pub const ISSUES_ALIASES: &[&str] = &["常见问题", "issues"];
pub const YIELD_ALIASES: &[&str] = &["产量等级", "yield"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Month,
    Temperature,
    Rainfall,
    Ph,
    Crop,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Month,
        Role::Temperature,
        Role::Rainfall,
        Role::Ph,
        Role::Crop,
    ];

    /// Feature roles in canonical training order.
    pub const FEATURES: [Role; 4] = [Role::Month, Role::Temperature, Role::Rainfall, Role::Ph];

    /// Accepted column-name variants, in resolution order. Names are
    /// matched against normalized dataset columns.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Role::Month => &["种植月", "月份", "month"],
            Role::Temperature => &["温度℃", "温度", "temp"],
            Role::Rainfall => &["降雨mm", "降雨", "rain"],
            Role::Ph => &["土壤pH", "pH值", "ph"],
            Role::Crop => &["作物", "crop"],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Month => "month",
            Role::Temperature => "temperature",
            Role::Rainfall => "rainfall",
            Role::Ph => "ph",
            Role::Crop => "crop",
        };
        f.write_str(name)
    }
}

/// The resolved binding from each role to a concrete dataset column.
#[derive(Debug, Clone)]
pub struct RoleMap {
    columns: HashMap<Role, String>,
}

impl RoleMap {
    /// Binds every role to the first of its aliases present in `dataset`.
    /// Fails fast on the first role with no match; no partial map is
    /// ever produced.
    pub fn resolve(dataset: &Dataset) -> Result<RoleMap, PipelineError> {
        let mut columns = HashMap::new();
        for role in Role::ALL {
            let alias = role
                .aliases()
                .iter()
                .copied()
                .find(|name| dataset.column_index(name).is_some());
            match alias {
                Some(name) => {
                    columns.insert(role, name.to_string());
                }
                None => {
                    return Err(PipelineError::MissingColumn {
                        role,
                        tried: role.aliases(),
                    })
                }
            }
        }
        Ok(RoleMap { columns })
    }

    /// The concrete column bound to `role`. A `RoleMap` always holds all
    /// five roles, so this never misses.
    pub fn column(&self, role: Role) -> &str {
        &self.columns[&role]
    }
}
