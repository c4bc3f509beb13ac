//! 运行时错误.
//!
//! 所有错误都是类型化的并沿调用链显式返回. 管线在数据缺失或损坏时
//! 只上报错误, 绝不伪造像素数据. 唯一的例外是缺失的校准元数据:
//! 真实世界的输入经常不带 rescale 标签, 此时回退到
//! `slope = 1, intercept = 0` 并记录 warning, 而不是使请求失败.

use crate::Idx2d;
use thiserror::Error;

/// 资源预算违规的具体形态.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ResourceLimit {
    /// 分辨率放大倍数超出上限.
    #[error("分辨率放大倍数 {factor} 超出上限 {max}")]
    FactorTooLarge {
        /// 请求的放大倍数.
        factor: f32,
        /// 允许的最大倍数.
        max: f32,
    },

    /// 输入或预计输出的像素规模超出预算.
    #[error("像素规模 {pixels} 超出预算 {budget}")]
    TooManyPixels {
        /// 请求涉及的像素个数.
        pixels: usize,
        /// 允许的像素预算.
        budget: usize,
    },
}

/// 显示链 (窗宽窗位 + 增强) 的运行时错误.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RenderError {
    /// 窗宽过小或窗位出界, 无法建立有意义的线性映射.
    #[error("非法窗口: 窗位 {level}, 窗宽 {width}")]
    InvalidWindow {
        /// 请求的窗位.
        level: f32,
        /// 请求的窗宽.
        width: f32,
    },

    /// 资源预算违规. 请求被立即拒绝, 不尝试降级的部分处理.
    #[error("资源预算违规: {0}")]
    ResourceLimit(#[from] ResourceLimit),

    /// 请求被协作式取消. 取消不产生部分结果.
    #[error("请求已被取消")]
    Cancelled,
}

/// ROI 统计的运行时错误.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RoiError {
    /// 掩模内没有任何像素. 统计量在空区域上没有定义,
    /// 以错误代替 NaN/Infinity 字段上报.
    #[error("ROI 掩模为空")]
    EmptyRegion,

    /// 掩模形状与目标帧不一致.
    #[error("掩模形状 {mask:?} 与帧形状 {frame:?} 不一致")]
    MaskShapeMismatch {
        /// 掩模的 (高, 宽).
        mask: Idx2d,
        /// 帧的 (高, 宽).
        frame: Idx2d,
    },
}
