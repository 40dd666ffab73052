use crate::error::AnalysisError;

/// Reduce `samples` to roughly `bucket_count` peak values.
///
/// The bucket width is `samples.len() / bucket_count`; a width of zero is a
/// caller error reported as [`AnalysisError::BucketSizing`]. Empty input
/// yields an empty sequence for any bucket count.
///
/// Two quirks are kept for parity with existing reports and are probably
/// latent defects:
/// - scanning starts at index 1, so sample 0 never contributes;
/// - the running peak is compared by magnitude but stored signed, so a
///   bucket may hold a negative value.
///
/// One value is emitted per index `i >= 1` with `i % width == 0`, so the
/// output holds `(len - 1) / width` values rather than exactly `bucket_count`.
pub fn downsample(samples: &[f32], bucket_count: usize) -> Result<Vec<f32>, AnalysisError> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let width = samples.len().checked_div(bucket_count).unwrap_or(0);
    if width == 0 {
        return Err(AnalysisError::BucketSizing {
            bucket_count,
            samples: samples.len(),
        });
    }

    let mut peaks = Vec::with_capacity(samples.len() / width);
    let mut running = 0.0f32;
    for (i, &sample) in samples.iter().enumerate().skip(1) {
        if sample.abs() > running {
            running = sample;
        }
        if i % width == 0 {
            peaks.push(running);
            running = 0.0;
        }
    }

    Ok(peaks)
}

/// Peak preview for rendering `width` bars.
///
/// Clamps the bucket count to the number of samples so it never trips the
/// bucket sizing guard. Returns an empty preview for empty input or zero width.
pub fn preview(samples: &[f32], width: usize) -> Vec<f32> {
    if samples.is_empty() || width == 0 {
        return Vec::new();
    }
    let buckets = width.min(samples.len());
    downsample(samples, buckets).unwrap_or_default()
}
