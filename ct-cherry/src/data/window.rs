//! CT 窗口, 包含窗位 (window level), 窗宽 (window width) 与显示链参数.
//!
//! 窗口把有界的 HU 区间线性映射到完整的 8-bit 显示范围. 对比度增益在
//! 截断 **之前** 作用于校准值; 反色与光度解释以异或方式合成; 组织密度
//! 预处理按窗位落入的固定参考分段选择 gamma.

use ndarray::Array2;

use super::{HuSlice, Photometric};
use crate::consts::window as cw;
use crate::error::RenderError;

/// CT 窗口与显示链参数.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例
/// (`with_*` 方法按值消费并返回新实例).
#[derive(Copy, Clone, Debug)]
pub struct CtWindow {
    level: f32,
    width: f32,
    invert: bool,
    contrast_boost: f32,
    density_enhancement: bool,
    resolution_factor: f32,
}

impl CtWindow {
    /// 构建 CT 窗.
    ///
    /// `level` 必须在合理范围内, `width` 必须大于
    /// [`cw::MIN_WIDTH`], 否则返回 [`RenderError::InvalidWindow`].
    /// 其余参数取默认值: 不反色, 对比度增益 1.0, 不做密度增强,
    /// 分辨率倍数 1.0.
    pub fn new(level: f32, width: f32) -> Result<CtWindow, RenderError> {
        if (-1e5..=1e5).contains(&level) && cw::MIN_WIDTH < width && width <= 1e5 {
            Ok(Self {
                level,
                width,
                invert: false,
                contrast_boost: 1.0,
                density_enhancement: false,
                resolution_factor: 1.0,
            })
        } else {
            Err(RenderError::InvalidWindow { level, width })
        }
    }

    /// 设置是否反色.
    #[inline]
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// 设置对比度增益. 超出 \[[`cw::MIN_CONTRAST_BOOST`],
    /// [`cw::MAX_CONTRAST_BOOST`]\] 的取值会被钳制到边界.
    #[inline]
    pub fn with_contrast_boost(mut self, boost: f32) -> Self {
        self.contrast_boost = boost.clamp(cw::MIN_CONTRAST_BOOST, cw::MAX_CONTRAST_BOOST);
        self
    }

    /// 设置是否做组织密度增强.
    #[inline]
    pub fn with_density_enhancement(mut self, enabled: bool) -> Self {
        self.density_enhancement = enabled;
        self
    }

    /// 设置分辨率放大倍数. 小于 `1.0` 的取值被钳制到 `1.0`;
    /// 上限校验由分辨率增强阶段负责, 以便给出类型化的资源错误.
    #[inline]
    pub fn with_resolution_factor(mut self, factor: f32) -> Self {
        self.resolution_factor = if factor < 1.0 { 1.0 } else { factor };
        self
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 是否反色.
    #[inline]
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// 对比度增益.
    #[inline]
    pub fn contrast_boost(&self) -> f32 {
        self.contrast_boost
    }

    /// 是否做组织密度增强.
    #[inline]
    pub fn density_enhancement(&self) -> bool {
        self.density_enhancement
    }

    /// 分辨率放大倍数.
    #[inline]
    pub fn resolution_factor(&self) -> f32 {
        self.resolution_factor
    }

    /// 本窗口的组织自适应 gamma.
    ///
    /// 按窗位落入的固定参考分段选择: 极负窗位 (肺/空气类窗) 压暗
    /// 高光, 近零窗位 (软组织窗) 与高正窗位 (骨窗) 提升中间调对比.
    /// 不属于任何分段的窗位 gamma 为 `1.0`.
    pub fn adaptive_gamma(&self) -> f32 {
        if self.level < cw::LOW_LEVEL_MAX {
            cw::GAMMA_LOW
        } else if self.level < cw::MID_LEVEL_MAX {
            cw::GAMMA_MID
        } else if self.level >= cw::HIGH_LEVEL_MIN {
            cw::GAMMA_HIGH
        } else {
            1.0
        }
    }

    /// 单像素显示链. 调用方保证 `hu` 有限.
    fn eval_finite(&self, hu: f32, photometric: Photometric) -> f32 {
        debug_assert!(hu.is_finite());

        // 对比度增益在截断之前作用于校准值.
        let boosted = hu * self.contrast_boost;

        let lb = self.lower_bound();
        let mut out = if boosted <= lb {
            0.0
        } else if boosted >= self.upper_bound() {
            255.0
        } else {
            (boosted - lb) / self.width * 255.0
        };

        if self.invert ^ photometric.is_inverted() {
            out = 255.0 - out;
        }

        if self.density_enhancement {
            let gamma = self.adaptive_gamma();
            if gamma != 1.0 {
                out = 255.0 * (out / 255.0).powf(gamma);
            }
        }
        out
    }

    /// 求在当前窗口设置下, `hu` 值对应的灰度分布点 (0.0 <= value <= 255.0).
    ///
    /// 如果 `hu` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_f32(&self, hu: f32, photometric: Photometric) -> Option<f32> {
        if !hu.is_finite() {
            return None;
        }
        Some(self.eval_finite(hu, photometric))
    }

    /// 求在当前窗口设置下, `hu` 值对应的灰度整数值 (0 <= value <= 255).
    ///
    /// 如果 `hu` 无意义 (如 inf, NaN), 则返回 `None`.
    #[inline]
    pub fn eval(&self, hu: f32, photometric: Photometric) -> Option<u8> {
        self.eval_f32(hu, photometric).map(|v| v.round() as u8)
    }

    /// 将整个校准 HU 切片映射到 `[0, 255]` 的归一化平面.
    ///
    /// 校准切片由 `i32` 采样计算而来, 保证有限, 因此该方法不会失败.
    pub fn apply(&self, hu: &HuSlice, photometric: Photometric) -> Array2<f32> {
        hu.data().mapv(|v| self.eval_finite(v, photometric))
    }
}
