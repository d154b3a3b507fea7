#![allow(clippy::useless_conversion)]

use pyo3::{
    exceptions::{PyNotImplementedError, PyValueError},
    prelude::*,
    types::{PyDict, PyList},
    wrap_pyfunction,
};

use crate::{
    estimators::Termination,
    error::DriftError,
    models::RigidTransform,
    settings::{DriftSettings, GlobalAlignmentSettings},
    types::PointSet,
};

fn to_py_err(err: DriftError) -> PyErr {
    match err {
        DriftError::NotImplemented(_) => PyNotImplementedError::new_err(err.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

fn matrix_from_python(obj: &Bound<'_, PyAny>) -> PyResult<PointSet> {
    let rows: Vec<Vec<f64>> = obj.extract()?;
    if rows.is_empty() {
        return Ok(PointSet::from_row_slice(0, 0, &[]));
    }

    let width = rows[0].len();
    if !rows.iter().all(|r| r.len() == width) {
        return Err(PyValueError::new_err("all rows must have the same length"));
    }

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Ok(PointSet::from_row_slice(flat.len() / width.max(1), width, &flat))
}

fn matrix_to_python<'py>(py: Python<'py>, matrix: &PointSet) -> Bound<'py, PyList> {
    let rows: Vec<Vec<f64>> = matrix
        .row_iter()
        .map(|row| row.iter().copied().collect::<Vec<f64>>())
        .collect();
    PyList::new_bound(py, rows)
}

fn termination_name(termination: Termination) -> &'static str {
    match termination {
        Termination::Converged => "converged",
        Termination::Diverged => "diverged",
        Termination::IterationCap => "iteration_cap",
    }
}

fn transform_from_python(obj: &Bound<'_, PyAny>) -> PyResult<RigidTransform> {
    let rotation = matrix_from_python(&obj.get_item("rotation")?)?;
    let translation: Vec<f64> = obj.get_item("translation")?.extract()?;
    let scale: f64 = obj.get_item("scale")?.extract()?;
    Ok(RigidTransform::new(
        rotation,
        nalgebra::DVector::from_vec(translation),
        scale,
    ))
}

fn transform_to_python<'py>(
    py: Python<'py>,
    transform: &RigidTransform,
) -> PyResult<Bound<'py, PyDict>> {
    let out = PyDict::new_bound(py);
    out.set_item("rotation", matrix_to_python(py, &transform.rotation))?;
    out.set_item(
        "translation",
        transform.translation.iter().copied().collect::<Vec<f64>>(),
    )?;
    out.set_item("scale", transform.scale)?;
    Ok(out)
}

#[pyclass(name = "DriftSettings")]
#[derive(Clone)]
pub struct PyDriftSettings {
    inner: DriftSettings,
}

#[pymethods]
impl PyDriftSettings {
    #[new]
    #[pyo3(signature = (
        outlier_weight=0.5,
        convergence_sigma_squared=1e-10,
        divergence_ratio=1e8,
    ))]
    pub fn new(outlier_weight: f64, convergence_sigma_squared: f64, divergence_ratio: f64) -> Self {
        Self {
            inner: DriftSettings {
                outlier_weight,
                convergence_sigma_squared,
                divergence_ratio,
            },
        }
    }

    #[getter]
    pub fn outlier_weight(&self) -> f64 {
        self.inner.outlier_weight
    }

    #[getter]
    pub fn convergence_sigma_squared(&self) -> f64 {
        self.inner.convergence_sigma_squared
    }

    #[getter]
    pub fn divergence_ratio(&self) -> f64 {
        self.inner.divergence_ratio
    }
}

#[pyfunction(signature = (a, b))]
pub fn pairwise_distance_squared_py(a: Bound<PyAny>, b: Bound<PyAny>) -> PyResult<Py<PyList>> {
    let py = a.py();
    let a = matrix_from_python(&a)?;
    let b = matrix_from_python(&b)?;
    let distances = crate::pairwise_distance_squared(&a, &b).map_err(to_py_err)?;
    Ok(matrix_to_python(py, &distances).unbind())
}

#[pyfunction(signature = (a, b))]
pub fn rmsd_py(a: Bound<PyAny>, b: Bound<PyAny>) -> PyResult<f64> {
    let a = matrix_from_python(&a)?;
    let b = matrix_from_python(&b)?;
    crate::rmsd(&a, &b).map_err(to_py_err)
}

/// Run rigid CPD and return every emitted transform, in order.
#[pyfunction(signature = (fixed, moving, w=0.5, max_iterations=100, initial=None))]
pub fn rigid_drift_py(
    fixed: Bound<PyAny>,
    moving: Bound<PyAny>,
    w: f64,
    max_iterations: usize,
    initial: Option<Bound<PyAny>>,
) -> PyResult<Py<PyDict>> {
    let py = fixed.py();
    let fixed = matrix_from_python(&fixed)?;
    let moving = matrix_from_python(&moving)?;
    let initial = initial.as_ref().map(transform_from_python).transpose()?;

    let mut estimator = crate::rigid_drift(&fixed, &moving, w, initial).map_err(to_py_err)?;
    let steps = PyList::empty_bound(py);
    for step in estimator.by_ref().take(max_iterations) {
        let transform = step.map_err(to_py_err)?;
        steps.append(transform_to_python(py, &transform)?)?;
    }

    let out = PyDict::new_bound(py);
    out.set_item("transforms", steps)?;
    out.set_item("sigma_squared", estimator.sigma_squared())?;
    out.set_item(
        "termination",
        termination_name(
            estimator
                .termination()
                .unwrap_or(Termination::IterationCap),
        ),
    )?;
    Ok(out.unbind())
}

#[pyfunction(signature = (fixed, moving, settings=None, max_iterations=100))]
pub fn global_alignment_py(
    fixed: Bound<PyAny>,
    moving: Bound<PyAny>,
    settings: Option<PyDriftSettings>,
    max_iterations: usize,
) -> PyResult<Py<PyDict>> {
    let py = fixed.py();
    let fixed = matrix_from_python(&fixed)?;
    let moving = matrix_from_python(&moving)?;
    let settings = GlobalAlignmentSettings {
        drift: settings.map(|s| s.inner).unwrap_or_default(),
        max_iterations,
        ..GlobalAlignmentSettings::default()
    };

    let result = crate::global_alignment(&fixed, &moving, Some(settings)).map_err(to_py_err)?;
    let out = transform_to_python(py, &result.transform)?;
    out.set_item("rmsd", result.rmsd)?;
    out.set_item("initial_angle", result.initial_angle)?;
    out.set_item("iterations", result.iterations)?;
    out.set_item("termination", termination_name(result.termination))?;
    Ok(out.unbind())
}

#[pymodule]
fn _drift_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDriftSettings>()?;

    m.add_function(wrap_pyfunction!(pairwise_distance_squared_py, m)?)?;
    m.add_function(wrap_pyfunction!(rmsd_py, m)?)?;
    m.add_function(wrap_pyfunction!(rigid_drift_py, m)?)?;
    m.add_function(wrap_pyfunction!(global_alignment_py, m)?)?;
    Ok(())
}
