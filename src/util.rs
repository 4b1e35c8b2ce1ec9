pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        positive if positive > 0 => Some(data.iter().sum::<f64>() / positive as f64),
        _ => None,
    }
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;

            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// Fraction as a whole-number percentage, rounded half away from zero.
///
/// Ties go up (`0.125` is 13%), not to the even neighbour as Python's `round`
/// would, and values are not truncated either. Keep it that way: feedback
/// messages are checked against this rounding.
pub fn percent(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}
