use anyhow::{bail, Result};
use candle_core::Tensor;

/// Mean of the token states selected by `attention_mask`, L2-normalized per row.
///
/// `hidden` is `[batch, tokens, dim]`, `attention_mask` is `[batch, tokens]`
/// with 1 for real tokens and 0 for padding. Returns `[batch, dim]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, dim) = hidden.dims3()?;
    if attention_mask.dims() != [batch, tokens] {
        bail!("attention mask shape {:?} does not match hidden states [{batch}, {tokens}, _]", attention_mask.dims());
    }
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let weights = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let summed = (hidden * &weights)?.sum(1)?;
    // A fully padded row would divide by zero.
    let counts = (mask.sum_keepdim(1)? + 1e-9)?;
    let mean = summed.broadcast_div(&counts)?;
    let norms = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + 1e-12)?;
    let pooled = mean.broadcast_div(&norms)?;
    debug_assert_eq!(pooled.dims(), &[batch, dim]);
    Ok(pooled)
}
