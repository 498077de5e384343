use anyhow::{bail, Result};
use candle_core::{DType, Tensor};

/// Mean of the token states selected by `attention_mask`, L2-normalised per row.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` in any numeric dtype.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _time, hidden_dim) = match hidden.dims() {
        [b, t, h] => (*b, *t, *h),
        other => bail!("hidden states must be [B,T,H], got {:?}", other),
    };

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = mask_3d.broadcast_as(hidden.shape())?;
    let sum = (hidden * &mask_broadcast)?.sum(1)?;
    // Rows with an all-zero mask would divide by zero.
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(sum.dtype())?.clamp(1f32, f32::MAX)?;
    let mean = sum.broadcast_div(&lengths)?;

    let eps_val = match hidden.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(0)?;
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.broadcast_add(&eps)?;
    let pooled = mean.broadcast_div(&norm)?;
    if pooled.dims() != [batch, hidden_dim] {
        bail!("pooled shape {:?} != [{batch}, {hidden_dim}]", pooled.dims());
    }
    Ok(pooled)
}
