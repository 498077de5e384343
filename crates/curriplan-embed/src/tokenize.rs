use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Token ids and attention mask for a batch, each `[B, T]` with `T` the
/// longest encoding after truncation to `max_len`. Shorter rows are padded
/// with `pad_id` and a zero mask.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    pad_id: u32,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, mask));
    }

    let seq_len = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut all_ids = Vec::with_capacity(rows.len() * seq_len);
    let mut all_mask = Vec::with_capacity(rows.len() * seq_len);
    for (ids, mask) in rows {
        let pad = seq_len - ids.len();
        all_ids.extend(ids.into_iter().chain(std::iter::repeat(pad_id).take(pad)));
        all_mask.extend(mask.into_iter().chain(std::iter::repeat(0).take(pad)));
    }

    let batch = texts.len();
    let input_ids = Tensor::from_vec(all_ids, (batch, seq_len), device)?;
    let attention_mask = Tensor::from_vec(all_mask, (batch, seq_len), device)?;
    Ok((input_ids, attention_mask))
}
