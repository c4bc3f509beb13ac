//! 显示链编排.
//!
//! 数据流: 校准切片 → 窗宽窗位 → (可选) 密度增强 → (可选) 分辨率
//! 增强 → 收尾质量处理 → 8-bit 帧. 窗宽窗位与收尾处理是强制步骤,
//! 它们的失败使整个请求失败; 密度增强失败时回退到仅窗宽窗位的结果
//! 并记录 warning (取消除外, 取消总是中止整个请求).
//!
//! 每次调用都是输入的纯函数, 不保留任何跨调用状态; 多帧体数据逐帧
//! 处理, `rayon` feature 下可按帧并行.

use log::warn;

use crate::cancel::CancelToken;
use crate::data::{CtVolume, CtWindow};
use crate::error::RenderError;

mod blur;
pub mod density;
mod frame;
pub mod quality;
pub mod resolution;

pub use blur::gaussian_blur;
pub use density::enhance_density;
pub use frame::{GrayFrame, ImgWriteRaw};
pub use quality::final_quality_pass;
pub use resolution::enhance_resolution;

/// 渲染体数据的第 `z_index` 个水平切片.
///
/// 当 `z_index` 越界时 panic (与体数据的切片访问语义一致).
pub fn render_slice(
    vol: &CtVolume,
    z_index: usize,
    window: &CtWindow,
    cancel: &CancelToken,
) -> Result<GrayFrame, RenderError> {
    cancel.check()?;

    let hu = vol.calibrated_slice(z_index);
    let mut plane = window.apply(&hu.as_immut(), vol.calibration().photometric());

    if window.density_enhancement() {
        match enhance_density(&plane, cancel) {
            Ok(enhanced) => plane = enhanced,
            Err(RenderError::Cancelled) => return Err(RenderError::Cancelled),
            Err(e) => {
                // 降级策略: 密度增强可以失败, 基础窗宽窗位结果仍然可用.
                warn!("密度增强失败, 回退到仅窗宽窗位的结果: {e}");
            }
        }
    }

    if window.resolution_factor() > 1.0 {
        plane = enhance_resolution(&plane, window.resolution_factor(), cancel)?;
    }

    let plane = final_quality_pass(&plane);
    cancel.check()?;
    Ok(GrayFrame::from_plane(&plane))
}

/// 按升序渲染体数据的全部水平切片.
///
/// 任一切片失败 (包括取消) 时整体返回 `Err`, 不产生部分结果.
pub fn render_all(
    vol: &CtVolume,
    window: &CtWindow,
    cancel: &CancelToken,
) -> Result<Vec<GrayFrame>, RenderError> {
    (0..vol.len_z())
        .map(|z| render_slice(vol, z, window, cancel))
        .collect()
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};

        /// 借助 `rayon`, 并行渲染体数据的全部水平切片. 输出顺序与
        /// [`render_all`] 一致, 逐字节相同.
        pub fn par_render_all(
            vol: &CtVolume,
            window: &CtWindow,
            cancel: &CancelToken,
        ) -> Result<Vec<GrayFrame>, RenderError> {
            (0..vol.len_z())
                .into_par_iter()
                .map(|z| render_slice(vol, z, window, cancel))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Calibration, Photometric};
    use ndarray::{Array2, Array3};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    /// 覆盖 -1000..3000 HU 的合成体数据 (slope 1, intercept -1024).
    fn synthetic_volume(z: usize, h: usize, w: usize) -> CtVolume {
        let data = Array3::from_shape_fn((z, h, w), |(zi, hi, wi)| {
            24 + ((zi * 1301 + hi * 31 + wi * 7) % 4001) as i32
        });
        let calib = Calibration::new(1.0, -1024.0, Photometric::Direct, 16).unwrap();
        CtVolume::from_raw(data, calib).unwrap()
    }

    #[test]
    fn test_render_slice_basic() {
        let vol = synthetic_volume(2, 64, 64);
        let win = CtWindow::new(40.0, 400.0).unwrap();
        let frame = render_slice(&vol, 0, &win, &CancelToken::none()).unwrap();
        assert_eq!(frame.shape(), (64, 64));
    }

    #[test]
    fn test_render_deterministic_with_all_flags() {
        let vol = synthetic_volume(1, 48, 48);
        let win = CtWindow::new(40.0, 400.0)
            .unwrap()
            .with_density_enhancement(true)
            .with_resolution_factor(2.0)
            .with_contrast_boost(1.2);
        let a = render_slice(&vol, 0, &win, &CancelToken::none()).unwrap();
        let b = render_slice(&vol, 0, &win, &CancelToken::none()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.shape(), (96, 96));
    }

    #[test]
    fn test_render_all_processes_every_slice() {
        let vol = synthetic_volume(3, 16, 16);
        let win = CtWindow::new(40.0, 400.0).unwrap();
        let frames = render_all(&vol, &win, &CancelToken::none()).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.shape() == (16, 16)));
    }

    #[test]
    fn test_quality_pass_always_applied() {
        // 中灰输入经过收尾处理后不再是中灰 (亮度增益 > 1).
        let frame = Array2::from_elem((16, 16), 1152i32); // -> 128 HU 附近
        let calib = Calibration::new(1.0, -1024.0, Photometric::Direct, 16).unwrap();
        let vol = CtVolume::from_frame(frame, calib).unwrap();
        let win = CtWindow::new(128.0, 256.0).unwrap();
        let out = render_slice(&vol, 0, &win, &CancelToken::none()).unwrap();
        // 窗位中点映射到 127.5, 收尾亮度应将其抬高.
        assert!(out.data()[(8, 8)] > 128);
    }

    #[test]
    fn test_render_cancelled_yields_no_frame() {
        let vol = synthetic_volume(1, 32, 32);
        let win = CtWindow::new(40.0, 400.0).unwrap();
        let token = CancelToken::with_flag(Arc::new(AtomicBool::new(true)));
        assert_eq!(
            render_slice(&vol, 0, &win, &token),
            Err(RenderError::Cancelled)
        );
    }

    #[test]
    fn test_excessive_factor_is_fatal() {
        let vol = synthetic_volume(1, 16, 16);
        let win = CtWindow::new(40.0, 400.0)
            .unwrap()
            .with_resolution_factor(8.0);
        assert!(matches!(
            render_slice(&vol, 0, &win, &CancelToken::none()),
            Err(RenderError::ResourceLimit(_))
        ));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_render_matches_sequential() {
        let vol = synthetic_volume(4, 24, 24);
        let win = CtWindow::new(-600.0, 1500.0)
            .unwrap()
            .with_density_enhancement(true);
        let seq = render_all(&vol, &win, &CancelToken::none()).unwrap();
        let par = par_render_all(&vol, &win, &CancelToken::none()).unwrap();
        assert_eq!(seq, par);
    }
}
