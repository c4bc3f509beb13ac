//! 收尾质量处理.
//!
//! 显示链的无条件最后一步: 锐化 → 对比度 → 亮度, 每步结果先钳制到
//! `[0, 255]` 再进入下一步. 无论上游开关如何组合, 该步骤都会执行,
//! 以保证输出质量的一致性.

use ndarray::Array2;

use super::blur::gaussian_blur;
use crate::consts::quality as cq;

/// 对归一化平面做收尾质量处理.
pub fn final_quality_pass(plane: &Array2<f32>) -> Array2<f32> {
    if plane.is_empty() {
        return plane.clone();
    }

    // 锐化: v + (SHARPEN - 1) * (v - blur(v, sigma = 1)).
    let blurred = gaussian_blur(plane, 1.0);
    let mut out = plane.clone();
    out.zip_mut_with(&blurred, |v, &b| {
        *v = (*v + (cq::SHARPEN - 1.0) * (*v - b)).clamp(0.0, 255.0);
    });

    // 对比度: 以 127.5 为中点拉伸.
    out.mapv_inplace(|v| ((v - 127.5) * cq::CONTRAST + 127.5).clamp(0.0, 255.0));

    // 亮度.
    out.mapv_inplace(|v| (v * cq::BRIGHTNESS).clamp(0.0, 255.0));
    out
}
