/// Newest half of the retained history, oldest to newest, scaled down for
/// display. Short histories render what they have; one retained sample still
/// yields an empty window because half of one floors to zero.
pub fn render_window(samples: &[f64], divisor: f64) -> Vec<f64> {
    let take = samples.len() / 2;
    samples[samples.len() - take..]
        .iter()
        .map(|value| value / divisor)
        .collect()
}
