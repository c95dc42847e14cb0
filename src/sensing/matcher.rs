use image::GrayImage;

use super::pattern::ReferencePattern;

/// Maximum zero-mean normalized cross-correlation of `sample` against
/// `pattern` over all valid alignments, in roughly [-1, 1]. Returns 0.0 when
/// the sample is smaller than the pattern in either dimension, and skips
/// windows with no variance, so a non-matchable input always scores below
/// any realistic threshold. Pure function; thresholding is the caller's job.
pub fn match_score(sample: &GrayImage, pattern: &ReferencePattern) -> f32 {
    let pw = pattern.width() as usize;
    let ph = pattern.height() as usize;
    let sw = sample.width() as usize;
    let sh = sample.height() as usize;

    if sw < pw || sh < ph {
        return 0.0;
    }

    let norm_sq = pattern.norm_sq();
    if norm_sq <= f64::EPSILON {
        return 0.0;
    }

    let template = pattern.zero_mean();
    let pixels = sample.as_raw();
    let n = (pw * ph) as f64;

    let mut best = f64::NEG_INFINITY;
    for window_y in 0..=(sh - ph) {
        for window_x in 0..=(sw - pw) {
            let mut dot = 0.0_f64;
            let mut sum = 0.0_f64;
            let mut sum_sq = 0.0_f64;

            for row in 0..ph {
                let sample_base = (window_y + row) * sw + window_x;
                let template_base = row * pw;
                for col in 0..pw {
                    let value = pixels[sample_base + col] as f64;
                    dot += value * template[template_base + col];
                    sum += value;
                    sum_sq += value * value;
                }
            }

            // The template is zero-mean, so `dot` is already the full cross
            // term; only the window's own variance is left to normalize out.
            let window_var = sum_sq - sum * sum / n;
            if window_var <= f64::EPSILON {
                continue;
            }

            let score = dot / (window_var * norm_sq).sqrt();
            if score > best {
                best = score;
            }
        }
    }

    if best.is_finite() {
        best as f32
    } else {
        0.0
    }
}
