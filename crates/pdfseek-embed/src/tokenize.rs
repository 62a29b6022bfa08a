use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Truncate to `width` or right-pad with `pad_id` (mask 0).
pub fn pad_row(ids: &[u32], mask: &[u32], width: usize, pad_id: u32) -> (Vec<u32>, Vec<u32>) {
    let keep = ids.len().min(width);
    let mut row_ids = ids[..keep].to_vec();
    let mut row_mask = mask[..keep.min(mask.len())].to_vec();
    row_mask.resize(keep, 1);
    row_ids.resize(width, pad_id);
    row_mask.resize(width, 0);
    (row_ids, row_mask)
}

/// Tokenize a batch into `[batch, width]` id and mask tensors, where `width`
/// is the longest encoding capped at `max_len`.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, pad_id: u32, device: &Device) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer.encode_batch(texts.to_vec(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let width = encodings.iter().map(|e| e.get_ids().len().min(max_len)).max().unwrap_or(0).max(1);
    let mut ids = Vec::with_capacity(texts.len() * width);
    let mut mask = Vec::with_capacity(texts.len() * width);
    for enc in &encodings {
        let (row_ids, row_mask) = pad_row(enc.get_ids(), enc.get_attention_mask(), width, pad_id);
        ids.extend(row_ids);
        mask.extend(row_mask);
    }
    let input_ids = Tensor::from_vec(ids, (texts.len(), width), device)?;
    let attention_mask = Tensor::from_vec(mask, (texts.len(), width), device)?;
    Ok((input_ids, attention_mask))
}

#[cfg(test)]
mod tests {
    use super::pad_row;

    #[test]
    fn short_rows_are_padded_with_zero_mask() {
        let (ids, mask) = pad_row(&[101, 7, 102], &[1, 1, 1], 5, 0);
        assert_eq!(ids, vec![101, 7, 102, 0, 0]);
        assert_eq!(mask, vec![1, 1, 1, 0, 0]);
    }

    #[test]
    fn long_rows_are_truncated() {
        let (ids, mask) = pad_row(&[1, 2, 3, 4], &[1, 1, 1, 1], 2, 0);
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(mask, vec![1, 1]);
    }
}
