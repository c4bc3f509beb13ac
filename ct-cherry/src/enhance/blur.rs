//! 可分离高斯平滑.
//!
//! 增强链中所有平滑都经过这里, 以保证不同阶段使用完全一致的核,
//! 从而保证逐字节可复现的输出. 边界采用钳制 (clamp) 采样.

use ndarray::Array2;

/// 构建归一化的一维高斯核. 半径取 `ceil(3 * sigma)`.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    debug_assert!(sigma > 0.0);
    let radius = (3.0 * sigma).ceil() as usize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    for i in 0..=2 * radius {
        let d = i as f32 - radius as f32;
        kernel.push((-d * d / denom).exp());
    }
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// 沿单一轴做一维卷积. `horizontal` 为真时沿宽方向.
fn convolve_axis(src: &Array2<f32>, kernel: &[f32], horizontal: bool) -> Array2<f32> {
    let (height, width) = src.dim();
    let radius = kernel.len() / 2;
    let mut out = Array2::<f32>::zeros((height, width));

    for h in 0..height {
        for w in 0..width {
            let mut acc = 0.0f32;
            for (k, &coef) in kernel.iter().enumerate() {
                let offset = k as isize - radius as isize;
                let (sh, sw) = if horizontal {
                    let sw = (w as isize + offset).clamp(0, width as isize - 1);
                    (h, sw as usize)
                } else {
                    let sh = (h as isize + offset).clamp(0, height as isize - 1);
                    (sh as usize, w)
                };
                acc += coef * src[(sh, sw)];
            }
            out[(h, w)] = acc;
        }
    }
    out
}

/// 对二维平面做高斯平滑. 水平和垂直两趟一维卷积等价于二维高斯核.
pub fn gaussian_blur(src: &Array2<f32>, sigma: f32) -> Array2<f32> {
    if src.is_empty() {
        return src.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let tmp = convolve_axis(src, &kernel, true);
    convolve_axis(&tmp, &kernel, false)
}
