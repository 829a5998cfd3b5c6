// src/utils/candle.rs

use anyhow::{Context, Result as AnyhowResult};
use candle_core::{Device, Tensor};
use once_cell::sync::Lazy;

// The comparison loop is linear over the roster; CPU tensors are sufficient
// and keep the pipeline deterministic across hosts.
static CANDLE_DEVICE: Lazy<Device> = Lazy::new(|| Device::Cpu);

/// Cosine similarity between two equal-length vectors via candle tensors.
/// Returns 0.0 when either magnitude is zero or the result is not finite.
pub fn cosine_similarity_candle(v1_slice: &[f32], v2_slice: &[f32]) -> AnyhowResult<f64> {
    if v1_slice.len() != v2_slice.len() {
        return Err(anyhow::anyhow!(
            "Input vector lengths differ: {} vs {}",
            v1_slice.len(),
            v2_slice.len()
        ));
    }
    if v1_slice.is_empty() {
        return Err(anyhow::anyhow!("Input vectors must not be empty"));
    }

    let v1 = Tensor::from_slice(v1_slice, (v1_slice.len(),), &CANDLE_DEVICE)
        .with_context(|| format!("Failed to create tensor v1 with len {}", v1_slice.len()))?;
    let v2 = Tensor::from_slice(v2_slice, (v2_slice.len(),), &CANDLE_DEVICE)
        .with_context(|| format!("Failed to create tensor v2 with len {}", v2_slice.len()))?;

    let dot_product = ((&v1 * &v2)
        .with_context(|| "Tensor multiplication for dot product failed")?)
    .sum_all()
    .with_context(|| "Summing tensor for dot product failed")?
    .to_scalar::<f32>()
    .with_context(|| "Converting dot product tensor to scalar failed")? as f64;

    let mag1 = ((&v1 * &v1)
        .with_context(|| "Tensor multiplication for v1 magnitude failed")?)
    .sum_all()
    .with_context(|| "Summing tensor for v1 magnitude failed")?
    .sqrt()
    .with_context(|| "Sqrt for v1 magnitude failed")?
    .to_scalar::<f32>()
    .with_context(|| "Converting v1 magnitude tensor to scalar failed")? as f64;

    let mag2 = ((&v2 * &v2)
        .with_context(|| "Tensor multiplication for v2 magnitude failed")?)
    .sum_all()
    .with_context(|| "Summing tensor for v2 magnitude failed")?
    .sqrt()
    .with_context(|| "Sqrt for v2 magnitude failed")?
    .to_scalar::<f32>()
    .with_context(|| "Converting v2 magnitude tensor to scalar failed")? as f64;

    if mag1 == 0.0 || mag2 == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot_product / (mag1 * mag2);

    if similarity.is_nan() || similarity.is_infinite() {
        log::warn!(
            "Calculated similarity is NaN or Infinite. dot_product: {}, mag1: {}, mag2: {}",
            dot_product,
            mag1,
            mag2
        );
        return Ok(0.0);
    }

    Ok(similarity)
}
