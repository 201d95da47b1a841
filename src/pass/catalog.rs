// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use lazy_static::lazy_static;
use serde::Deserialize;

const DEFAULT_SHAPES_JSON: &str = include_str!("./known_shapes.json");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("known shapes JSON error: {0}")]
    Json(String),
    #[error("shim scope `{0}` listed more than once")]
    DuplicateScope(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(error: serde_json::Error) -> Self {
        CatalogError::Json(alloc::format!("{error}"))
    }
}

#[derive(Debug, Deserialize)]
struct ShapeCatalog {
    #[serde(default)]
    serious_errors: Vec<String>,
    #[serde(default)]
    shim_scopes: Vec<ShimScopeConfig>,
}

#[derive(Debug, Deserialize)]
struct ShimScopeConfig {
    scope: String,
    #[serde(default)]
    bindings: Vec<String>,
}

/// Runtime error shapes that are always worth reporting, and bindings in the
/// trusted base scope that are known to be missing at analysis time.
#[derive(Debug, Default)]
pub struct KnownShapes {
    serious_errors: BTreeSet<String>,
    shims: BTreeMap<String, BTreeSet<String>>,
}

impl KnownShapes {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: ShapeCatalog = serde_json::from_str(json)?;

        let mut shims = BTreeMap::new();
        for scope in catalog.shim_scopes {
            let bindings = scope.bindings.into_iter().collect();
            if shims.insert(scope.scope.clone(), bindings).is_some() {
                return Err(CatalogError::DuplicateScope(scope.scope));
            }
        }

        Ok(KnownShapes {
            serious_errors: catalog.serious_errors.into_iter().collect(),
            shims,
        })
    }

    pub fn is_serious(&self, error_type: &str) -> bool {
        self.serious_errors.contains(error_type)
    }

    pub fn is_shim(&self, scope: &str, name: &str) -> bool {
        self.shims
            .get(scope)
            .is_some_and(|bindings| bindings.contains(name))
    }
}

lazy_static! {
    static ref DEFAULT_SHAPES: KnownShapes = KnownShapes::from_json(DEFAULT_SHAPES_JSON)
        .expect("failed to load known runtime error shapes");
}

pub fn known_shapes() -> &'static KnownShapes {
    &DEFAULT_SHAPES
}
