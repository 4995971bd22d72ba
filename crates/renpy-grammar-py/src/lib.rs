//! Python bindings for the Ren'Py grammar loader.

use pyo3::create_exception;
use pyo3::exceptions::PyException;
use pyo3::prelude::*;
use renpy_grammar::{BytesArtifact, GrammarLoader, LoaderConfig};

create_exception!(
    _renpy_grammar,
    GrammarLoadError,
    PyException,
    "Raised when a grammar artifact cannot be loaded."
);

fn load_error(err: &renpy_grammar::GrammarLoadError) -> PyErr {
    GrammarLoadError::new_err(err.to_string())
}

/// A loaded grammar. Immutable and safe to share between threads.
#[pyclass(name = "Language", frozen, module = "_renpy_grammar")]
struct PyLanguage(renpy_grammar::Language);

#[pymethods]
impl PyLanguage {
    #[getter]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[getter]
    fn abi_version(&self) -> u16 {
        self.0.abi_version()
    }

    #[getter]
    fn start_rule(&self) -> &str {
        self.0.start_rule()
    }

    #[getter]
    fn symbol_count(&self) -> usize {
        self.0.symbol_count()
    }

    #[getter]
    fn field_count(&self) -> usize {
        self.0.field_count()
    }

    fn node_kind_for_id(&self, id: u16) -> Option<&str> {
        self.0.node_kind_for_id(id)
    }

    #[pyo3(signature = (kind, named = true))]
    fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<u16> {
        self.0.id_for_node_kind(kind, named)
    }

    fn field_name_for_id(&self, id: u16) -> Option<&str> {
        self.0.field_name_for_id(id)
    }

    fn field_id_for_name(&self, name: &str) -> Option<u16> {
        self.0.field_id_for_name(name)
    }

    fn __repr__(&self) -> String {
        format!(
            "Language(name={:?}, abi_version={}, symbols={}, fields={})",
            self.0.name(),
            self.0.abi_version(),
            self.0.symbol_count(),
            self.0.field_count()
        )
    }
}

/// Returns the bundled Ren'Py grammar.
#[pyfunction]
fn language() -> PyResult<PyLanguage> {
    renpy_grammar::language()
        .map(PyLanguage)
        .map_err(|e| load_error(&e))
}

/// Loads a grammar from artifact bytes.
#[pyfunction]
#[pyo3(signature = (data, strict = false))]
fn load_artifact(py: Python<'_>, data: &[u8], strict: bool) -> PyResult<PyLanguage> {
    let config = LoaderConfig::default().strict(strict).cached(false);
    let loader = GrammarLoader::with_config(BytesArtifact::new(data), config);
    py.allow_threads(|| loader.load_grammar())
        .map(PyLanguage)
        .map_err(|e| load_error(&e))
}

#[pymodule]
fn _renpy_grammar(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("GrammarLoadError", m.py().get_type::<GrammarLoadError>())?;
    m.add("ABI_VERSION", renpy_grammar::ABI_VERSION)?;
    m.add_class::<PyLanguage>()?;
    m.add_function(wrap_pyfunction!(language, m)?)?;
    m.add_function(wrap_pyfunction!(load_artifact, m)?)?;
    Ok(())
}
