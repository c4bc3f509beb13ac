//! 分辨率增强.
//!
//! Catmull-Rom 双三次重采样 + unsharp masking. 资源校验在任何分配
//! 之前完成: 放大倍数超过上限或预计输出超过像素预算的请求立即
//! 以 [`ResourceLimit`] 失败, 不尝试降级的部分处理.

use ndarray::Array2;

use super::blur::gaussian_blur;
use crate::cancel::CancelToken;
use crate::consts::{limits, resolution as cr};
use crate::error::{RenderError, ResourceLimit};

/// Catmull-Rom 样条在 `|t| <= 2` 内的权重.
fn catmull_rom(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

/// 双三次重采样到 `(out_h, out_w)`. 边界采用钳制采样.
fn resample_bicubic(
    src: &Array2<f32>,
    (out_h, out_w): (usize, usize),
    cancel: &CancelToken,
) -> Result<Array2<f32>, RenderError> {
    let (src_h, src_w) = src.dim();
    let scale_h = src_h as f32 / out_h as f32;
    let scale_w = src_w as f32 / out_w as f32;

    let clamp_h = |i: isize| i.clamp(0, src_h as isize - 1) as usize;
    let clamp_w = |i: isize| i.clamp(0, src_w as isize - 1) as usize;

    let mut out = Array2::<f32>::zeros((out_h, out_w));
    for oh in 0..out_h {
        cancel.check()?;
        // 像素中心对齐的源坐标.
        let sh = (oh as f32 + 0.5) * scale_h - 0.5;
        let base_h = sh.floor() as isize;
        let fh = sh - base_h as f32;

        for ow in 0..out_w {
            let sw = (ow as f32 + 0.5) * scale_w - 0.5;
            let base_w = sw.floor() as isize;
            let fw = sw - base_w as f32;

            let mut acc = 0.0f32;
            let mut weight_sum = 0.0f32;
            for dh in -1..=2isize {
                let wh = catmull_rom(dh as f32 - fh);
                if wh == 0.0 {
                    continue;
                }
                let row = clamp_h(base_h + dh);
                for dw in -1..=2isize {
                    let ww = catmull_rom(dw as f32 - fw);
                    if ww == 0.0 {
                        continue;
                    }
                    let weight = wh * ww;
                    acc += weight * src[(row, clamp_w(base_w + dw))];
                    weight_sum += weight;
                }
            }
            // Catmull-Rom 权重和恒为 1, 但钳制边界附近仍做归一化兜底.
            out[(oh, ow)] = (acc / weight_sum).clamp(0.0, 255.0);
        }
    }
    Ok(out)
}

/// 对归一化平面做分辨率增强.
///
/// 放大倍数的有效域是 `[1.0, 4.0]`: 超出上限以 [`ResourceLimit`]
/// 失败; 低于 `1.0` (含非有限) 的倍数与窗口参数的钳制语义一致,
/// 视为恒等变换 (不做 unsharp). 其余情况双三次重采样到
/// `round(dim * factor)`, 再做 unsharp masking:
/// `out = v + 0.5 * (v - gaussian(v, sigma = 1))`, 钳制到 `[0, 255]`.
pub fn enhance_resolution(
    plane: &Array2<f32>,
    factor: f32,
    cancel: &CancelToken,
) -> Result<Array2<f32>, RenderError> {
    if factor > cr::MAX_FACTOR {
        return Err(ResourceLimit::FactorTooLarge {
            factor,
            max: cr::MAX_FACTOR,
        }
        .into());
    }
    if factor.is_nan() || factor <= 1.0 {
        return Ok(plane.clone());
    }

    let (h, w) = plane.dim();
    let out_h = (h as f32 * factor).round() as usize;
    let out_w = (w as f32 * factor).round() as usize;
    let pixels = out_h * out_w;
    if pixels > limits::MAX_OUTPUT_PIXELS {
        return Err(ResourceLimit::TooManyPixels {
            pixels,
            budget: limits::MAX_OUTPUT_PIXELS,
        }
        .into());
    }
    if out_h == 0 || out_w == 0 {
        return Ok(Array2::zeros((out_h, out_w)));
    }

    let resampled = resample_bicubic(plane, (out_h, out_w), cancel)?;
    cancel.check()?;

    let blurred = gaussian_blur(&resampled, cr::UNSHARP_SIGMA);
    let mut out = resampled;
    out.zip_mut_with(&blurred, |v, &b| {
        *v = (*v + cr::UNSHARP_AMOUNT * (*v - b)).clamp(0.0, 255.0);
    });
    Ok(out)
}
