//! 通用常量.
//!
//! 增强链的混合权重与 gamma 分段属于经验值, 没有文档化的临床推导.
//! 它们被当作可测试的配置对待: 只要满足 crate 级别的性质测试
//! (输出有界, 确定性, 单调性), 就允许调整.

/// CT HU 参考值.
pub mod hu {
    /// 空气的标准 HU 值.
    pub const AIR: f32 = -1000.0;

    /// 水的标准 HU 值.
    pub const WATER: f32 = 0.0;

    /// 致密骨的典型 HU 值下界.
    pub const CORTICAL_BONE: f32 = 400.0;
}

/// 窗宽窗位相关常量.
pub mod window {
    /// 窗宽下限. 低于该值的窗宽无法产生有意义的线性映射.
    pub const MIN_WIDTH: f32 = 1e-3;

    /// 对比度增益下限.
    pub const MIN_CONTRAST_BOOST: f32 = 0.5;

    /// 对比度增益上限.
    pub const MAX_CONTRAST_BOOST: f32 = 2.0;

    /// 窗位低于该值视为 "极负窗位" (肺/空气类窗), gamma 取 [`GAMMA_LOW`].
    pub const LOW_LEVEL_MAX: f32 = -200.0;

    /// 窗位落在 [`LOW_LEVEL_MAX`], [`MID_LEVEL_MAX`]) 区间视为
    /// "近零窗位" (软组织类窗), gamma 取 [`GAMMA_MID`].
    pub const MID_LEVEL_MAX: f32 = 200.0;

    /// 窗位不低于该值视为 "高正窗位" (骨窗), gamma 取 [`GAMMA_HIGH`].
    pub const HIGH_LEVEL_MIN: f32 = 400.0;

    /// 极负窗位 gamma.
    pub const GAMMA_LOW: f32 = 0.8;

    /// 近零窗位 gamma.
    pub const GAMMA_MID: f32 = 1.1;

    /// 高正窗位 gamma.
    pub const GAMMA_HIGH: f32 = 1.2;
}

/// 密度增强 (多尺度混合 + CLAHE) 相关常量.
pub mod density {
    /// 多尺度混合中原图的权重.
    pub const W_ORIGINAL: f32 = 0.5;

    /// 多尺度混合中 sigma = 2 高斯平滑副本的权重.
    pub const W_SIGMA2: f32 = 0.3;

    /// 多尺度混合中 sigma = 4 高斯平滑副本的权重.
    pub const W_SIGMA4: f32 = 0.2;

    /// CLAHE 每个方向上的分块个数.
    pub const CLAHE_TILES: usize = 8;

    /// CLAHE 直方图 bin 个数.
    pub const CLAHE_BINS: usize = 256;

    /// CLAHE 限幅: 单 bin 允许的最大计数占分块像素总数的比例.
    pub const CLAHE_CLIP_LIMIT: f32 = 0.03;

    /// 最终混合中多尺度结果的权重.
    pub const W_MULTISCALE: f32 = 0.6;

    /// 最终混合中 CLAHE 结果的权重.
    pub const W_CLAHE: f32 = 0.4;
}

/// 分辨率增强相关常量.
pub mod resolution {
    /// 允许的最大放大倍数. 超出立即失败, 不做任何分配.
    pub const MAX_FACTOR: f32 = 4.0;

    /// unsharp masking 的高频分量权重.
    pub const UNSHARP_AMOUNT: f32 = 0.5;

    /// unsharp masking 的高斯 sigma.
    pub const UNSHARP_SIGMA: f32 = 1.0;
}

/// 收尾质量处理相关常量.
pub mod quality {
    /// 收尾锐化强度. `1.0` 代表不锐化.
    pub const SHARPEN: f32 = 1.2;

    /// 收尾对比度增益, 以 127.5 为中点.
    pub const CONTRAST: f32 = 1.1;

    /// 收尾亮度增益.
    pub const BRIGHTNESS: f32 = 1.05;
}

/// 资源预算.
pub mod limits {
    /// 单帧输入像素预算. 超出的缓冲直接拒绝, 不尝试降级处理.
    pub const MAX_INPUT_PIXELS: usize = 64_000_000;

    /// 单帧输出像素预算 (分辨率增强后).
    pub const MAX_OUTPUT_PIXELS: usize = 64_000_000;
}
