#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供医学影像查看器的像素级显示处理管线: 从校准 CT 像素 (HU)
//! 到 8-bit 显示灰度图的确定性变换, 以及 ROI 区域的描述统计与组织分类.
//!
//! 该 crate 目前仅提供 `safe` 接口. 所有变换都是输入的纯函数:
//! 相同输入与参数永远产生逐字节相同的输出, 上层可据此安全地做结果缓存.
//!
//! # 注意
//!
//! 1. 影像容器格式 (DICOM 等) 的解析不在本 crate 职责范围内. 上游解析器
//!   负责交付裸采样缓冲与校准元数据; 本 crate 假定输入缓冲总是有效的,
//!   任何缺失/损坏数据都以显式错误上报, 绝不伪造像素数据.
//! 2. 在内部不变量被破坏的非期望情况下, 程序会直接 panic, 而不会导致
//!   内存错误. As what Rust promises.
//!
//! # 功能地图
//!
//! ### 校准与裸采样缓冲 ✅
//!
//! `rescale slope/intercept` 校准, 缺失时回退默认值并记录 warning.
//!
//! 实现位于 `ct-cherry/src/data`.
//!
//! ### CT window 视图 ✅
//!
//! 窗宽窗位线性映射, 对比度增益, 反色, 以及按窗位自适应选择 gamma
//! 的组织密度预处理.
//!
//! 实现位于 `ct-cherry/src/data/window.rs`.
//!
//! ### 组织密度增强 ✅
//!
//! 多尺度高斯混合 + 分块限幅自适应直方图均衡 (CLAHE). 单一全局窗口
//! 无法同时展示空气/软组织/骨的过渡, 该混合方案以固定可测试的常量
//! 近似边缘感知增强.
//!
//! 实现位于 `ct-cherry/src/enhance/density.rs`.
//!
//! ### 分辨率增强 ✅
//!
//! Catmull-Rom 双三次重采样 + unsharp masking. 超出倍数上限或输出
//! 像素预算时快速失败, 不做任何分配.
//!
//! 实现位于 `ct-cherry/src/enhance/resolution.rs`.
//!
//! ### 收尾质量处理 ✅
//!
//! 无条件的锐化 → 对比度 → 亮度收尾调整, 保证输出质量一致.
//!
//! 实现位于 `ct-cherry/src/enhance/quality.rs`.
//!
//! ### ROI 统计与组织分类 ✅
//!
//! 对椭圆/多边形掩模内的校准 HU 采样计算均值/中位数/分位数/CV/置信
//! 区间, 并按静态有序 HU 区间表分类组织. 区间表在首次使用时校验
//! 完备性与无重叠.
//!
//! 实现位于 `ct-cherry/src/roi`.
//!
//! ### 协作式取消 ✅
//!
//! 大缓冲上的密度/分辨率增强接受取消令牌与 deadline, 被放弃的请求
//! 不会占住 worker. 取消只产生错误, 不产生部分结果.
//!
//! 实现位于 `ct-cherry/src/cancel.rs`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 裸采样缓冲与校准元数据的基础数据结构.
mod data;

pub use data::{Calibration, CtVolume, CtWindow, HuSlice, OwnedHuSlice, Photometric};

/// 显示链: 密度增强, 分辨率增强, 收尾质量处理与 8-bit 帧输出.
pub mod enhance;

pub use enhance::{render_all, render_slice, GrayFrame, ImgWriteRaw};

#[cfg(feature = "rayon")]
pub use enhance::par_render_all;

/// ROI 掩模, 描述统计与组织分类.
pub mod roi;

pub use roi::{RoiMask, RoiStatistics, TissueLabel};

pub mod cancel;
pub mod consts;
pub mod error;
pub mod prelude;

pub use cancel::CancelToken;
pub use error::{RenderError, ResourceLimit, RoiError};
