/// Exponential moving average over the whole series, one value per input.
///
/// Standard recursive form: seeded with the first value, then
/// `ema[i] = k * value[i] + (1 - k) * ema[i-1]` with `k = 2 / (span + 1)`.
/// Causal — `ema[i]` depends only on values `0..=i` and needs no look-back
/// buffer beyond the previous output.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };

    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = first;
    out.push(ema);

    for &value in &values[1..] {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}
