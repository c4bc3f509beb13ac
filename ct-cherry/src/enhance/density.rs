//! 组织密度增强.
//!
//! 单一全局窗口无法同时以足够的局部对比展示空气/软组织/骨之间的过渡.
//! 本模块用固定可测试的常量近似边缘感知增强: 先做多尺度高斯混合保住
//! 整体层次, 再做分块限幅自适应直方图均衡 (CLAHE) 放大组织间差异,
//! 分块 CDF 之间做双线性过渡以避免块状伪影, 最后按固定权重混合.
//!
//! 输入与输出均为 `[0, 255]` 的归一化平面, 形状不变.

use ndarray::Array2;

use super::blur::gaussian_blur;
use crate::cancel::CancelToken;
use crate::consts::density as cd;
use crate::error::RenderError;

/// 对归一化平面做组织密度增强.
///
/// 取消令牌在高斯副本之间与 CLAHE 的分块/行粒度上检查;
/// 触发时立即返回 [`RenderError::Cancelled`], 不产生部分结果.
pub fn enhance_density(
    plane: &Array2<f32>,
    cancel: &CancelToken,
) -> Result<Array2<f32>, RenderError> {
    if plane.is_empty() {
        return Ok(plane.clone());
    }

    cancel.check()?;
    let blur2 = gaussian_blur(plane, 2.0);
    cancel.check()?;
    let blur4 = gaussian_blur(plane, 4.0);
    cancel.check()?;

    // 多尺度混合: 0.5 * 原图 + 0.3 * sigma2 + 0.2 * sigma4.
    let mut multiscale = plane * cd::W_ORIGINAL;
    multiscale.zip_mut_with(&blur2, |m, &b| *m += cd::W_SIGMA2 * b);
    multiscale.zip_mut_with(&blur4, |m, &b| *m += cd::W_SIGMA4 * b);

    let local = clahe_equalize(plane, cancel)?;

    // 最终混合: 0.6 * 多尺度 + 0.4 * 局部对比.
    let mut out = multiscale;
    out.zip_mut_with(&local, |m, &l| {
        *m = (*m * cd::W_MULTISCALE + l * cd::W_CLAHE).clamp(0.0, 255.0);
    });
    Ok(out)
}

/// 分块限幅自适应直方图均衡.
///
/// 固定 [`cd::CLAHE_TILES`]² 分块与 [`cd::CLAHE_BINS`] bin;
/// 每块直方图在 [`cd::CLAHE_CLIP_LIMIT`] * 块像素数处限幅,
/// 超出部分均匀回填. 每个像素的映射值由周围四个分块的 CDF
/// 双线性插值得到, 以平滑块间过渡.
fn clahe_equalize(plane: &Array2<f32>, cancel: &CancelToken) -> Result<Array2<f32>, RenderError> {
    let (rows, cols) = plane.dim();
    let tiles = cd::CLAHE_TILES;
    let bins = cd::CLAHE_BINS;
    if rows < 2 || cols < 2 {
        return Ok(plane.clone());
    }

    let tile_h = (rows + tiles - 1) / tiles;
    let tile_w = (cols + tiles - 1) / tiles;
    let tiles_y = (rows + tile_h - 1) / tile_h;
    let tiles_x = (cols + tile_w - 1) / tile_w;

    let bin_of = |v: f32| -> usize {
        let b = (v.clamp(0.0, 255.0) / 255.0 * (bins as f32 - 1.0)).round() as usize;
        b.min(bins - 1)
    };

    // 每块: 直方图 -> 限幅 -> 均匀回填 -> 归一化 CDF.
    let mut cdfs: Vec<Vec<f32>> = Vec::with_capacity(tiles_y * tiles_x);
    for ty in 0..tiles_y {
        cancel.check()?;
        let r0 = ty * tile_h;
        let r1 = ((ty + 1) * tile_h).min(rows);
        for tx in 0..tiles_x {
            let c0 = tx * tile_w;
            let c1 = ((tx + 1) * tile_w).min(cols);

            let mut hist = vec![0.0f32; bins];
            for r in r0..r1 {
                for c in c0..c1 {
                    hist[bin_of(plane[(r, c)])] += 1.0;
                }
            }

            let tile_pixels = ((r1 - r0) * (c1 - c0)) as f32;
            let clip = (cd::CLAHE_CLIP_LIMIT * tile_pixels).max(1.0);
            let mut excess = 0.0f32;
            for h in hist.iter_mut() {
                if *h > clip {
                    excess += *h - clip;
                    *h = clip;
                }
            }
            let add_per_bin = excess / bins as f32;
            for h in hist.iter_mut() {
                *h += add_per_bin;
            }

            let total: f32 = hist.iter().sum::<f32>().max(1.0);
            let mut cdf = vec![0.0f32; bins];
            let mut acc = 0.0f32;
            for (i, &h) in hist.iter().enumerate() {
                acc += h;
                cdf[i] = (acc / total).clamp(0.0, 1.0);
            }
            cdfs.push(cdf);
        }
    }

    // 双线性插值采样周围四个分块的 CDF.
    let sample_cdf = |r: usize, c: usize, v: f32| -> f32 {
        let rf = r as f32 / tile_h as f32 - 0.5;
        let cf = c as f32 / tile_w as f32 - 0.5;
        let ty = rf.floor() as isize;
        let tx = cf.floor() as isize;
        let dy = (rf - ty as f32).clamp(0.0, 1.0);
        let dx = (cf - tx as f32).clamp(0.0, 1.0);

        let ty0 = ty.clamp(0, tiles_y as isize - 1) as usize;
        let tx0 = tx.clamp(0, tiles_x as isize - 1) as usize;
        let ty1 = (ty + 1).clamp(0, tiles_y as isize - 1) as usize;
        let tx1 = (tx + 1).clamp(0, tiles_x as isize - 1) as usize;

        let bin = bin_of(v);
        let cdf00 = cdfs[ty0 * tiles_x + tx0][bin];
        let cdf01 = cdfs[ty0 * tiles_x + tx1][bin];
        let cdf10 = cdfs[ty1 * tiles_x + tx0][bin];
        let cdf11 = cdfs[ty1 * tiles_x + tx1][bin];

        let top = cdf00 * (1.0 - dx) + cdf01 * dx;
        let bottom = cdf10 * (1.0 - dx) + cdf11 * dx;
        top * (1.0 - dy) + bottom * dy
    };

    let mut out = Array2::<f32>::zeros((rows, cols));
    for r in 0..rows {
        cancel.check()?;
        for c in 0..cols {
            out[(r, c)] = sample_cdf(r, c, plane[(r, c)]) * 255.0;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    /// 含明暗两个区域和弱纹理的合成平面.
    fn bimodal_plane() -> Array2<f32> {
        Array2::from_shape_fn((64, 64), |(h, w)| {
            let base = if w < 32 { 40.0 } else { 200.0 };
            base + ((h * 7 + w * 3) % 13) as f32
        })
    }

    #[test]
    fn test_density_output_bounded_and_same_shape() {
        let plane = bimodal_plane();
        let out = enhance_density(&plane, &CancelToken::none()).unwrap();
        assert_eq!(out.dim(), plane.dim());
        assert!(out.iter().all(|v| (0.0..=255.0).contains(v)));
    }

    #[test]
    fn test_density_deterministic() {
        let plane = bimodal_plane();
        let a = enhance_density(&plane, &CancelToken::none()).unwrap();
        let b = enhance_density(&plane, &CancelToken::none()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_density_amplifies_local_contrast() {
        // 暗区内部的弱纹理在增强后应有更大的动态范围.
        let plane = bimodal_plane();
        let out = enhance_density(&plane, &CancelToken::none()).unwrap();

        let local_range = |p: &Array2<f32>| -> f32 {
            let mut lo = f32::INFINITY;
            let mut hi = f32::NEG_INFINITY;
            for h in 8..24 {
                for w in 4..28 {
                    lo = lo.min(p[(h, w)]);
                    hi = hi.max(p[(h, w)]);
                }
            }
            hi - lo
        };
        assert!(local_range(&out) > local_range(&plane));
    }

    #[test]
    fn test_density_cancelled() {
        let flag = Arc::new(AtomicBool::new(true));
        let token = CancelToken::with_flag(flag);
        let plane = bimodal_plane();
        assert_eq!(
            enhance_density(&plane, &token),
            Err(RenderError::Cancelled)
        );
    }

    #[test]
    fn test_clahe_constant_plane_stays_bounded() {
        // 常数平面没有可均衡的结构, 只要求输出合法有界.
        let plane = Array2::from_elem((32, 32), 128.0f32);
        let out = enhance_density(&plane, &CancelToken::none()).unwrap();
        assert!(out.iter().all(|v| (0.0..=255.0).contains(v)));
    }
}
