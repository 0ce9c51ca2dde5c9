//! SafeTensors weight loading utilities.
//!
//! The classifier's weights ship as one or more `.safetensors` files next to
//! a `config.json`. Floating point weights are normalised to F32 on load, the
//! precision the classifier computes in.
//!
//! # Example
//!
//! ```ignore
//! use dgascan_core::model::WeightLoader;
//!
//! let loader = WeightLoader::from_dir(Path::new("/path/to/model"), &Device::Cpu)?;
//! let tensor = loader.get_tensor("embedding.weight", &[40, 128])?;
//! ```

use crate::error::{DgaError, Result};
use candle_core::{DType, Device, Tensor};
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Weight loader for SafeTensors format.
pub struct WeightLoader {
    /// Loaded tensors indexed by name.
    tensors: HashMap<String, Tensor>,
    /// Device for loaded tensors.
    device: Device,
}

impl WeightLoader {
    /// Create a new weight loader from a model directory.
    ///
    /// Loads all .safetensors files in the directory.
    pub fn from_dir(dir: &Path, device: &Device) -> Result<Self> {
        let mut tensors = HashMap::new();

        let mut safetensor_files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "safetensors") {
                safetensor_files.push(path);
            }
        }

        // Sort for deterministic loading order
        safetensor_files.sort();

        if safetensor_files.is_empty() {
            return Err(DgaError::ModelError(format!(
                "No .safetensors files found in {}",
                dir.display()
            )));
        }

        for path in &safetensor_files {
            tensors.extend(Self::load_safetensors_file(path, device)?);
        }

        tracing::debug!(
            dir = %dir.display(),
            files = safetensor_files.len(),
            tensors = tensors.len(),
            "loaded weights"
        );

        Ok(Self {
            tensors,
            device: device.clone(),
        })
    }

    /// Create a weight loader from a single file.
    pub fn from_file(path: &Path, device: &Device) -> Result<Self> {
        let tensors = Self::load_safetensors_file(path, device)?;
        Ok(Self {
            tensors,
            device: device.clone(),
        })
    }

    /// Load tensors from a single safetensors file.
    fn load_safetensors_file(path: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
        let data = fs::read(path)?;
        let safetensors = SafeTensors::deserialize(&data).map_err(|e| {
            DgaError::ModelError(format!("Failed to deserialize {}: {}", path.display(), e))
        })?;

        let mut tensors = HashMap::new();
        for (name, view) in safetensors.tensors() {
            let tensor = Self::view_to_tensor(&view, device)?;
            tensors.insert(name.to_string(), tensor);
        }

        Ok(tensors)
    }

    /// Convert a SafeTensors view to a Candle tensor.
    fn view_to_tensor(view: &safetensors::tensor::TensorView, device: &Device) -> Result<Tensor> {
        let shape: Vec<usize> = view.shape().to_vec();
        let data = view.data();

        // Byte buffers inside a safetensors file are not guaranteed to be
        // aligned for the element type, so copy through pod_collect.
        let tensor = match view.dtype() {
            safetensors::Dtype::F32 => {
                let values: Vec<f32> = bytemuck::allocation::pod_collect_to_vec(data);
                Tensor::from_vec(values, shape.as_slice(), device)?
            }
            safetensors::Dtype::F16 => {
                let values: Vec<half::f16> = bytemuck::allocation::pod_collect_to_vec(data);
                Tensor::from_vec(values, shape.as_slice(), device)?.to_dtype(DType::F32)?
            }
            safetensors::Dtype::BF16 => {
                let values: Vec<half::bf16> = bytemuck::allocation::pod_collect_to_vec(data);
                Tensor::from_vec(values, shape.as_slice(), device)?.to_dtype(DType::F32)?
            }
            safetensors::Dtype::F64 => {
                let values: Vec<f64> = bytemuck::allocation::pod_collect_to_vec(data);
                Tensor::from_vec(values, shape.as_slice(), device)?.to_dtype(DType::F32)?
            }
            other => {
                return Err(DgaError::ModelError(format!(
                    "Unsupported weight dtype: {:?}",
                    other
                )));
            }
        };

        Ok(tensor)
    }

    /// Get a tensor by name, checking its shape.
    pub fn get_tensor(&self, name: &str, expected: &[usize]) -> Result<Tensor> {
        let tensor = self
            .tensors
            .get(name)
            .cloned()
            .ok_or_else(|| DgaError::ModelError(format!("Tensor not found: {}", name)))?;

        if tensor.dims() != expected {
            return Err(DgaError::ShapeMismatch(format!(
                "{}: expected {:?}, got {:?}",
                name,
                expected,
                tensor.dims()
            )));
        }
        Ok(tensor)
    }

    /// Check if a tensor exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Get all tensor names.
    pub fn tensor_names(&self) -> Vec<&str> {
        self.tensors.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of loaded tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Check if no tensors are loaded.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Get the device tensors are loaded to.
    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl std::fmt::Debug for WeightLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.tensor_names();
        names.sort_unstable();
        f.debug_struct("WeightLoader")
            .field("tensors", &names)
            .field("device", &self.device)
            .finish()
    }
}
