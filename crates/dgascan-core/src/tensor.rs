//! Input tensor construction and scoped tensor release.
//!
//! Every prediction owns two tensors: the `(1, 45)` input and whatever the
//! model returns. Both are wrapped in a [`ScopedTensor`] as soon as they
//! exist, so they are released when the prediction's scope ends, whether it
//! ends with a result or an error. A [`TensorLedger`] counts acquisitions and
//! releases so hosts and tests can check that nothing outlives its call.

use crate::error::{DgaError, Result};
use crate::vocab::MAX_DOMAIN_LEN;
use candle_core::{Device, Tensor};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL_LEDGER: TensorLedger = TensorLedger::new();

/// Which stage of a prediction a tensor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorRole {
    /// Padded token ids fed to the model.
    Input,
    /// Raw model output.
    Output,
}

impl TensorRole {
    /// Short name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TensorRole::Input => "input",
            TensorRole::Output => "output",
        }
    }
}

/// Counters for tensors handed out to prediction calls.
#[derive(Debug, Default)]
pub struct TensorLedger {
    acquired: AtomicU64,
    released: AtomicU64,
}

impl TensorLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Ledger shared by every call that does not bring its own.
    pub fn global() -> &'static TensorLedger {
        &GLOBAL_LEDGER
    }

    /// Total tensors acquired.
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Acquire)
    }

    /// Total tensors released.
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Acquire)
    }

    /// Tensors acquired but not yet released.
    pub fn live(&self) -> u64 {
        // Read `released` first so a concurrent release cannot make the
        // difference underflow.
        let released = self.released();
        self.acquired().saturating_sub(released)
    }

    fn record_acquire(&self) {
        self.acquired.fetch_add(1, Ordering::AcqRel);
    }

    fn record_release(&self) {
        self.released.fetch_add(1, Ordering::AcqRel);
    }
}

/// A tensor owned by one prediction call, released on drop.
#[derive(Debug)]
pub struct ScopedTensor<'l> {
    tensor: Tensor,
    role: TensorRole,
    ledger: &'l TensorLedger,
}

impl<'l> ScopedTensor<'l> {
    /// Take ownership of `tensor` and record it in `ledger`.
    pub fn acquire(tensor: Tensor, role: TensorRole, ledger: &'l TensorLedger) -> Self {
        ledger.record_acquire();
        tracing::trace!(role = role.as_str(), shape = ?tensor.dims(), "tensor acquired");
        Self {
            tensor,
            role,
            ledger,
        }
    }

    /// Role of this tensor.
    pub fn role(&self) -> TensorRole {
        self.role
    }
}

impl Deref for ScopedTensor<'_> {
    type Target = Tensor;

    fn deref(&self) -> &Tensor {
        &self.tensor
    }
}

impl Drop for ScopedTensor<'_> {
    fn drop(&mut self) {
        self.ledger.record_release();
        tracing::trace!(role = self.role.as_str(), "tensor released");
    }
}

/// Wrap a padded sequence as a single-row `(1, len)` u32 tensor.
///
/// The sequence must already be [`MAX_DOMAIN_LEN`] long; see
/// [`crate::vocab::pad`].
pub fn build_input(padded: &[u32], device: &Device) -> Result<Tensor> {
    if padded.len() != MAX_DOMAIN_LEN {
        return Err(DgaError::ShapeMismatch(format!(
            "padded sequence: expected {} ids, got {}",
            MAX_DOMAIN_LEN,
            padded.len()
        )));
    }
    Ok(Tensor::from_slice(padded, (1, MAX_DOMAIN_LEN), device)?)
}
