//! safetensors import and export of model weights.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use syncml_core::Tensor;
use syncml_nn::Module;

use crate::api::error::{SudokuError, SudokuResult};
use crate::core::config::SudokuTransformerConfig;
use crate::core::model::SudokuTransformer;

impl SudokuTransformer {
    /// Write every parameter as little-endian f32, keyed by its dotted name.
    pub fn save_safetensors<P: AsRef<Path>>(&self, path: P) -> SudokuResult<()> {
        let mut buffers: Vec<(String, Vec<usize>, Vec<u8>)> = Vec::new();
        self.visit_parameters("", &mut |name, t| {
            let bytes: Vec<u8> = t.iter().flat_map(|v| v.to_le_bytes()).collect();
            buffers.push((name.to_string(), t.shape().to_vec(), bytes));
        });

        let views = buffers
            .iter()
            .map(|(name, shape, bytes)| {
                TensorView::new(Dtype::F32, shape.clone(), bytes).map(|v| (name.as_str(), v))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let tensor_list: Vec<(&str, &TensorView)> = views.iter().map(|(k, v)| (*k, v)).collect();
        let serialized = safetensors::serialize(tensor_list, &None)?;
        std::fs::write(&path, serialized)?;

        log::info!("[sudoku] saved {} tensors to {}", views.len(), path.as_ref().display());
        Ok(())
    }

    /// Replace every parameter with the tensor of the same name in `path`.
    ///
    /// Missing names, dtype other than F32 and shape changes are errors;
    /// unknown extra tensors are logged and ignored.
    pub fn load_safetensors<P: AsRef<Path>>(&mut self, path: P) -> SudokuResult<()> {
        let bytes = std::fs::read(&path)?;
        let file = SafeTensors::deserialize(&bytes)?;

        let mut loaded: HashMap<String, Tensor> = HashMap::new();
        for (name, view) in file.tensors() {
            if view.dtype() != Dtype::F32 {
                return Err(SudokuError::Weights(format!(
                    "tensor {} has dtype {:?}, expected F32",
                    name,
                    view.dtype()
                )));
            }
            let data: Vec<f32> = view
                .data()
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            loaded.insert(name, Tensor::from_vec(data, view.shape().to_vec())?);
        }

        let mut used = HashSet::new();
        let mut first_error: Option<SudokuError> = None;
        self.visit_parameters_mut("", &mut |name, param| {
            if first_error.is_some() {
                return;
            }
            match loaded.get(name) {
                Some(t) if t.shape() == param.shape() => {
                    *param = t.clone();
                    used.insert(name.to_string());
                }
                Some(t) => {
                    first_error = Some(SudokuError::Weights(format!(
                        "tensor {} has shape {:?}, model expects {:?}",
                        name,
                        t.shape(),
                        param.shape()
                    )));
                }
                None => {
                    first_error = Some(SudokuError::Weights(format!("missing tensor {}", name)));
                }
            }
        });
        if let Some(err) = first_error {
            return Err(err);
        }

        for name in loaded.keys().filter(|n| !used.contains(*n)) {
            log::warn!("[sudoku] ignoring unknown tensor {}", name);
        }
        log::info!("[sudoku] loaded {} tensors from {}", used.len(), path.as_ref().display());
        Ok(())
    }

    /// Build a model for `config` and load its weights from `path`.
    pub fn from_safetensors<P: AsRef<Path>>(
        config: SudokuTransformerConfig,
        path: P,
    ) -> SudokuResult<Self> {
        let mut model = Self::new(config)?;
        model.load_safetensors(path)?;
        Ok(model)
    }
}
