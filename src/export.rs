//! JSON export of assembled elemental matrices and geometry, for inspection
//! and for handing results to external tooling. Enabled by the default
//! `json_export` feature.

use json::{object, JsonValue};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::Write;

use crate::assembly::ElementMatrices;
use crate::element::ElementGeometry;

fn matrix_to_json(matrix: &DMatrix<f64>) -> JsonValue {
    let rows: Vec<JsonValue> = (0..matrix.nrows())
        .map(|i| {
            let row: Vec<JsonValue> = (0..matrix.ncols())
                .map(|j| JsonValue::from(matrix[(i, j)]))
                .collect();
            JsonValue::Array(row)
        })
        .collect();

    JsonValue::Array(rows)
}

fn family_to_json(family: &[DMatrix<f64>]) -> JsonValue {
    JsonValue::Array(family.iter().map(matrix_to_json).collect())
}

/// All three families of one element as a JSON object, one matrix per
/// coefficient basis function in each family
pub fn element_matrices_to_json(matrices: &ElementMatrices) -> JsonValue {
    object! {
        "N_NN": family_to_json(&matrices.nn),
        "N_NxNx": family_to_json(&matrices.nxnx),
        "N_NyNy": family_to_json(&matrices.nyny),
    }
}

/// Element type, geometric order and node coordinates of a triangle provider
pub fn geometry_to_json<G: ElementGeometry>(geometry: &G) -> JsonValue {
    let nodes: Vec<JsonValue> = (0..3).map(|idx| geometry.node(idx).into()).collect();

    object! {
        "element_type": format!("{}", geometry.element_type()),
        "polynomial_order": geometry.polynomial_order(),
        "nodes": JsonValue::Array(nodes),
    }
}

/// Write the assembled matrices of many elements to a JSON file
pub fn write_element_matrices(
    path: impl AsRef<str>,
    all: &[ElementMatrices],
) -> std::io::Result<()> {
    let doc = JsonValue::Array(all.iter().map(element_matrices_to_json).collect());

    let mut file = File::create(path.as_ref())?;
    file.write_all(json::stringify_pretty(doc, 4).as_bytes())
}
