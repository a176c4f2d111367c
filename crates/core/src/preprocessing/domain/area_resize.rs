//! Area-averaging resampler for interleaved 8-bit images.
//!
//! Every destination pixel covers the footprint `[d * src/dst, (d + 1) * src/dst)`
//! on each axis, and takes the coverage-weighted mean of the source samples
//! under it. The same rule handles shrinking and growing axes, as OpenCV's
//! `INTER_AREA` does. The filter is separable: rows are resampled into an `f32`
//! scratch buffer, then columns into bytes, so rounding happens once.
//!
//! Only a window of the destination is produced, and only the source rows that
//! window touches are resampled horizontally.

/// Region of the destination image to produce, in destination pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    /// The whole `width x height` destination.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// One source sample contributing to a destination sample.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Tap {
    index: usize,
    weight: f32,
}

/// Resize an interleaved `src_w x src_h x channels` byte buffer to
/// `dst_w x dst_h` and return the `window` of the result.
///
/// All dimensions must be non-zero, `src.len()` must equal
/// `src_w * src_h * channels` and `window` must lie inside the destination.
/// The returned buffer is `window.width * window.height * channels` bytes.
pub fn resize_area(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
    window: Window,
) -> Vec<u8> {
    debug_assert_eq!(src.len(), src_w * src_h * channels);
    debug_assert!(window.x + window.width <= dst_w && window.y + window.height <= dst_h);

    if src_w == dst_w && src_h == dst_h {
        return copy_window(src, src_w, channels, window);
    }

    let x_taps = axis_taps(src_w, dst_w, window.x, window.width);
    let y_taps = axis_taps(src_h, dst_h, window.y, window.height);

    let first_row = y_taps.iter().flatten().map(|t| t.index).min().unwrap_or(0);
    let end_row = y_taps.iter().flatten().map(|t| t.index + 1).max().unwrap_or(0);

    // Horizontal pass over the source rows the window reads.
    let row_len = window.width * channels;
    let mut rows = vec![0f32; (end_row - first_row) * row_len];
    for (out_row, y) in rows.chunks_exact_mut(row_len).zip(first_row..end_row) {
        let src_row = &src[y * src_w * channels..(y + 1) * src_w * channels];
        for (out, taps) in out_row.chunks_exact_mut(channels).zip(&x_taps) {
            for tap in taps {
                let px = &src_row[tap.index * channels..(tap.index + 1) * channels];
                for (o, &s) in out.iter_mut().zip(px) {
                    *o += s as f32 * tap.weight;
                }
            }
        }
    }

    // Vertical pass.
    let mut dst = vec![0u8; window.height * row_len];
    let mut acc = vec![0f32; row_len];
    for (out_row, taps) in dst.chunks_exact_mut(row_len).zip(&y_taps) {
        acc.iter_mut().for_each(|a| *a = 0.0);
        for tap in taps {
            let r = tap.index - first_row;
            let row = &rows[r * row_len..(r + 1) * row_len];
            for (a, &v) in acc.iter_mut().zip(row) {
                *a += v * tap.weight;
            }
        }
        for (d, &a) in out_row.iter_mut().zip(&acc) {
            *d = saturate_u8(a);
        }
    }

    dst
}

fn copy_window(src: &[u8], src_w: usize, channels: usize, window: Window) -> Vec<u8> {
    let stride = src_w * channels;
    let mut dst = Vec::with_capacity(window.width * window.height * channels);
    for y in window.y..window.y + window.height {
        let start = y * stride + window.x * channels;
        dst.extend_from_slice(&src[start..start + window.width * channels]);
    }
    dst
}

/// Taps for destination samples `first..first + count` of an axis.
fn axis_taps(src_len: usize, dst_len: usize, first: usize, count: usize) -> Vec<Vec<Tap>> {
    (first..first + count)
        .map(|d| area_taps(d, src_len, dst_len))
        .collect()
}

/// Coverage of `[d * src/dst, (d + 1) * src/dst)` over each source sample.
fn area_taps(d: usize, src_len: usize, dst_len: usize) -> Vec<Tap> {
    let (src, dst) = (src_len as f64, dst_len as f64);
    let start = d as f64 * src / dst;
    let end = ((d + 1) as f64 * src / dst).min(src);
    let span = end - start;

    let first = start.floor() as usize;
    let last = (end.ceil() as usize).min(src_len);
    (first..last)
        .filter_map(|i| {
            let covered = end.min(i as f64 + 1.0) - start.max(i as f64);
            (covered > 1e-9).then(|| Tap {
                index: i,
                weight: (covered / span) as f32,
            })
        })
        .collect()
}

#[inline]
fn saturate_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn resize_full(src: &[u8], sw: usize, sh: usize, ch: usize, dw: usize, dh: usize) -> Vec<u8> {
        resize_area(src, sw, sh, ch, dw, dh, Window::full(dw, dh))
    }

    #[test]
    fn test_identity_returns_copy() {
        let src: Vec<u8> = (0..12).collect();
        assert_eq!(resize_full(&src, 2, 2, 3, 2, 2), src);
    }

    #[test]
    fn test_identity_window_copies_region() {
        // 3x3 single channel, take the bottom-right 2x2
        let src: Vec<u8> = (0..9).collect();
        let window = Window {
            x: 1,
            y: 1,
            width: 2,
            height: 2,
        };
        assert_eq!(resize_area(&src, 3, 3, 1, 3, 3, window), vec![4, 5, 7, 8]);
    }

    #[rstest]
    #[case::downscale(40, 30, 10, 5)]
    #[case::upscale(5, 4, 17, 13)]
    #[case::mixed(40, 4, 10, 9)]
    fn test_uniform_image_stays_uniform(
        #[case] sw: usize,
        #[case] sh: usize,
        #[case] dw: usize,
        #[case] dh: usize,
    ) {
        let src: Vec<u8> = std::iter::repeat([10u8, 128, 250])
            .take(sw * sh)
            .flatten()
            .collect();
        let dst = resize_full(&src, sw, sh, 3, dw, dh);
        assert_eq!(dst.len(), dw * dh * 3);
        for px in dst.chunks_exact(3) {
            assert_eq!(px, &[10, 128, 250]);
        }
    }

    #[test]
    fn test_integer_downscale_averages_blocks() {
        // 4x2 -> 2x1: each output is the mean of a 2x2 block
        let src = vec![0, 100, 200, 40, 20, 80, 0, 80];
        let dst = resize_full(&src, 4, 2, 1, 2, 1);
        assert_eq!(dst, vec![50, 80]);
    }

    #[test]
    fn test_fractional_downscale_weights_partial_coverage() {
        // 3 -> 2: footprints [0, 1.5) and [1.5, 3)
        let src = vec![0, 90, 180];
        let dst = resize_full(&src, 3, 1, 1, 2, 1);
        assert_eq!(dst, vec![30, 150]);
    }

    #[test]
    fn test_integer_upscale_replicates_samples() {
        // 2 -> 4: footprints [0, .5), [.5, 1), [1, 1.5), [1.5, 2)
        let dst = resize_full(&[0, 200], 2, 1, 1, 4, 1);
        assert_eq!(dst, vec![0, 0, 200, 200]);
    }

    #[test]
    fn test_fractional_upscale_blends_straddling_footprints() {
        // 2 -> 3: middle footprint [2/3, 4/3) is half on each sample
        let dst = resize_full(&[0, 200], 2, 1, 1, 3, 1);
        assert_eq!(dst, vec![0, 100, 200]);
    }

    #[test]
    fn test_step_edge_stays_sharp_from_500_to_518() {
        // 259 * 500 / 518 == 250 exactly, so no footprint straddles the edge
        let src: Vec<u8> = (0..500).map(|x| if x < 250 { 0 } else { 255 }).collect();
        let dst = resize_full(&src, 500, 1, 1, 518, 1);
        assert!(dst[..259].iter().all(|&v| v == 0));
        assert!(dst[259..].iter().all(|&v| v == 255));
    }

    #[test]
    fn test_channels_do_not_bleed() {
        let src: Vec<u8> = std::iter::repeat([255u8, 0, 0]).take(64).flatten().collect();
        let dst = resize_full(&src, 8, 8, 3, 3, 3);
        for px in dst.chunks_exact(3) {
            assert_eq!(px, &[255, 0, 0]);
        }
    }

    #[rstest]
    #[case::grow(13, 7, 20, 11)]
    #[case::shrink(31, 17, 12, 9)]
    #[case::mixed(9, 40, 14, 20)]
    fn test_window_matches_cropped_full_resize(
        #[case] sw: usize,
        #[case] sh: usize,
        #[case] dw: usize,
        #[case] dh: usize,
    ) {
        let src: Vec<u8> = (0..sw * sh * 3).map(|i| (i * 37 % 251) as u8).collect();
        let full = resize_full(&src, sw, sh, 3, dw, dh);
        let window = Window {
            x: 3,
            y: 2,
            width: 8,
            height: 6,
        };
        let cropped: Vec<u8> = (window.y..window.y + window.height)
            .flat_map(|y| {
                let start = (y * dw + window.x) * 3;
                full[start..start + window.width * 3].to_vec()
            })
            .collect();
        assert_eq!(resize_area(&src, sw, sh, 3, dw, dh, window), cropped);
    }

    #[test]
    fn test_window_of_huge_destination_stays_small() {
        // 1x50000 column stretched to 518 wide: the full result would be ~40 GB
        let src: Vec<u8> = (0..50_000 * 3).map(|i| (i % 256) as u8).collect();
        let (dw, dh) = (518, 25_900_000);
        let window = Window {
            x: 0,
            y: (dh - 518) / 2,
            width: 518,
            height: 518,
        };
        let dst = resize_area(&src, 1, 50_000, 3, dw, dh, window);
        assert_eq!(dst.len(), 518 * 518 * 3);
    }

    #[test]
    fn test_area_taps_sum_to_one() {
        for (src, dst) in [(10, 3), (1000, 518), (7, 7), (9, 4), (2, 5), (500, 518)] {
            for taps in axis_taps(src, dst, 0, dst) {
                let total: f32 = taps.iter().map(|t| t.weight).sum();
                assert_relative_eq!(total, 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_saturate_u8() {
        assert_eq!(saturate_u8(-3.0), 0);
        assert_eq!(saturate_u8(127.5), 128);
        assert_eq!(saturate_u8(300.0), 255);
    }
}
